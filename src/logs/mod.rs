// src/logs/mod.rs

//! Remote run log stream: line reading, decoding, enrichment and dispatch.

pub mod enrich;
pub mod interrupt;
pub mod processor;
pub mod reader;
pub mod record;

pub use enrich::{Plan, ProviderSchemas, State, PROVIDER_FORMAT_VERSION};
pub use interrupt::render_interrupt;
pub use processor::{DecodingTarget, LogStreamProcessor, RawTarget, RenderTarget};
pub use reader::{LineReader, READ_BUFFER_SIZE};
pub use record::{
    DecodeError, JsonLog, LogRecord, LogType, StateValues, TestFailedResource, TestFatalInterrupt,
    TestPlan, TestState,
};
