// src/config/mod.rs

//! Test suite manifest loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a manifest from disk (`loader.rs`).
//! - Validate basic invariants like unique run names (`validate.rs`).
//! - Build the read-only run options table used for log rendering
//!   (`lookup.rs`).

pub mod loader;
pub mod lookup;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use lookup::{RunConfigLookup, RunOptions, MODULE_UNDER_TEST};
pub use model::{RawSuiteConfig, RunConfig, SettingsSection, SuiteConfig, TestFileConfig};
