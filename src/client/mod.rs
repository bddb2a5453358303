// src/client/mod.rs

//! Remote test-run service interface.
//!
//! The orchestrator never talks HTTP itself: it drives a [`TestRunClient`]
//! that the caller constructs (already discovered and authenticated).
//!
//! - [`models`] holds the request/response types exchanged with the service.
//! - [`backend`] defines the `TestRunClient` trait and its error type.

pub mod backend;
pub mod models;

pub use backend::{ClientError, ClientFuture, LogStream, TestRunClient};
pub use models::{
    ConfigurationVersion, RegistryModule, RegistryModuleId, RunVariable, TestRun,
    TestRunCreateOptions,
};
