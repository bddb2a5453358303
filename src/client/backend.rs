// src/client/backend.rs

//! Pluggable remote service abstraction.
//!
//! Production callers wrap their HTTP client in a `TestRunClient`; tests
//! provide a scripted fake that records every call it receives.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use thiserror::Error;
use tokio::io::AsyncRead;

use super::models::{
    ConfigurationVersion, RegistryModule, RegistryModuleId, TestRun, TestRunCreateOptions,
};

/// Boxed future returned by every client operation.
pub type ClientFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send + 'a>>;

/// Byte stream of a run's structured logs.
pub type LogStream = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("resource not found")]
    NotFound,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("service returned {status}: {message}")]
    Service { status: u16, message: String },
}

/// Operations the orchestrator needs from the remote service.
///
/// `cancel_test_run` and `force_cancel_test_run` may be called at most once
/// each per wait; the monitor enforces that, not the service.
pub trait TestRunClient: Send + Sync {
    fn read_registry_module<'a>(
        &'a self,
        id: &'a RegistryModuleId,
    ) -> ClientFuture<'a, RegistryModule>;

    fn create_configuration_version<'a>(
        &'a self,
        id: &'a RegistryModuleId,
    ) -> ClientFuture<'a, ConfigurationVersion>;

    /// Package `directory` and upload it to `upload_url`.
    fn upload_configuration_version<'a>(
        &'a self,
        upload_url: &'a str,
        directory: &'a Path,
    ) -> ClientFuture<'a, ()>;

    fn create_test_run<'a>(
        &'a self,
        options: TestRunCreateOptions,
    ) -> ClientFuture<'a, TestRun>;

    fn read_test_run<'a>(&'a self, id: &'a str) -> ClientFuture<'a, TestRun>;

    /// Ask the run to wind down gracefully.
    fn cancel_test_run<'a>(&'a self, id: &'a str) -> ClientFuture<'a, ()>;

    /// Ask the run to stop immediately, skipping cleanup.
    fn force_cancel_test_run<'a>(&'a self, id: &'a str) -> ClientFuture<'a, ()>;

    fn read_logs<'a>(&'a self, id: &'a str) -> ClientFuture<'a, LogStream>;
}
