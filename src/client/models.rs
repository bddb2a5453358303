// src/client/models.rs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::RunStatus;

/// Identifies a module within an organization's private registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryModuleId {
    pub organization: String,
    pub namespace: String,
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistryModule {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub namespace: String,
}

/// An uploaded (or about to be uploaded) snapshot of the test configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigurationVersion {
    pub id: String,
    /// Pre-signed location the configuration archive is uploaded to.
    pub upload_url: String,
}

/// One variable passed to the remote run, as `key = <expression>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunVariable {
    pub key: String,
    pub value: String,
}

/// Snapshot of a remote test run.
///
/// The id never changes; `status` is refreshed on each poll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestRun {
    pub id: String,
    pub status: RunStatus,
}

#[derive(Debug, Clone)]
pub struct TestRunCreateOptions {
    /// Restrict execution to these test files.
    pub filter: Vec<String>,
    pub test_directory: PathBuf,
    pub verbose: bool,
    pub variables: Vec<RunVariable>,
    pub configuration_version: ConfigurationVersion,
    pub registry_module: RegistryModule,
}
