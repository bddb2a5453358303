// src/engine/submission.rs

//! Upload the test configuration and create the remote run.
//!
//! Every remote call races the stop signal, and the signals are checked
//! again between steps: if the user interrupted before anything was
//! running remotely there is nothing to cancel or report, so submission
//! ends quietly with [`Submitted::Interrupted`].

use std::future::Future;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::client::{
    ClientError, ConfigurationVersion, RegistryModule, RegistryModuleId, RunVariable, TestRun,
    TestRunClient, TestRunCreateOptions,
};
use crate::diagnostics::Diagnostic;
use crate::engine::signals::InterruptSignals;
use crate::source::{ModuleSource, SOURCE_ATTRIBUTE};

/// Everything needed to create a run, already validated by the caller.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    /// Directory holding the configuration that is uploaded.
    pub config_directory: PathBuf,
    /// Directory, relative to the configuration, holding the test files.
    pub test_directory: PathBuf,
    pub filter: Vec<String>,
    pub verbose: bool,
    pub variables: Vec<RunVariable>,
}

/// Result of a submission that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Run(TestRun),
    /// Stop or cancel fired before the run was created.
    Interrupted,
}

pub struct Submission<'a> {
    client: &'a dyn TestRunClient,
    signals: &'a InterruptSignals,
}

impl<'a> Submission<'a> {
    pub fn new(client: &'a dyn TestRunClient, signals: &'a InterruptSignals) -> Self {
        Self { client, signals }
    }

    /// Look up the module under test in its private registry.
    pub async fn read_module(
        &self,
        addr: &ModuleSource,
    ) -> Result<Option<RegistryModule>, Diagnostic> {
        let id = addr.registry_module_id();
        let Some(result) = self.unless_stopped(self.client.read_registry_module(&id)).await else {
            return Ok(None);
        };

        result.map(Some).map_err(|err| {
            let detail = match err {
                ClientError::NotFound => format!(
                    "module \"{addr}\" was not found.\n\nPlease ensure that the organization and hostname are correct and that your API token for {} is valid.",
                    addr.host
                ),
                other => other.to_string(),
            };
            Diagnostic::attribute(
                format!("Failed to read module \"{addr}\""),
                format!("Encountered an unexpected error while reading the module: {detail}"),
                SOURCE_ATTRIBUTE,
            )
        })
    }

    /// Create a configuration version for the module and upload `directory`.
    pub async fn upload_artifact(
        &self,
        module: &RegistryModuleId,
        request: &SubmissionRequest,
    ) -> Result<Option<ConfigurationVersion>, Diagnostic> {
        let Some(created) = self
            .unless_stopped(self.client.create_configuration_version(module))
            .await
        else {
            return Ok(None);
        };
        let version = created.map_err(|err| {
            Diagnostic::general_error("Failed to create configuration version", err)
        })?;
        debug!(configuration_version = %version.id, "created configuration version");

        if self.interrupted() {
            return Ok(None);
        }

        let Some(uploaded) = self
            .unless_stopped(
                self.client
                    .upload_configuration_version(&version.upload_url, &request.config_directory),
            )
            .await
        else {
            return Ok(None);
        };
        uploaded.map_err(|err| {
            Diagnostic::general_error("Failed to upload configuration version", err)
        })?;
        info!(
            configuration_version = %version.id,
            directory = %request.config_directory.display(),
            "uploaded configuration"
        );

        if self.interrupted() {
            return Ok(None);
        }

        Ok(Some(version))
    }

    /// Request creation of the remote run.
    pub async fn create_run(
        &self,
        version: ConfigurationVersion,
        module: RegistryModule,
        request: &SubmissionRequest,
    ) -> Result<Option<TestRun>, Diagnostic> {
        let options = TestRunCreateOptions {
            filter: request.filter.clone(),
            test_directory: request.test_directory.clone(),
            verbose: request.verbose,
            variables: request.variables.clone(),
            configuration_version: version,
            registry_module: module,
        };

        let Some(created) = self.unless_stopped(self.client.create_test_run(options)).await else {
            return Ok(None);
        };
        let run = created
            .map_err(|err| Diagnostic::general_error("Failed to create test run", err))?;
        info!(run_id = %run.id, status = %run.status, "created test run");
        Ok(Some(run))
    }

    /// Upload the configuration and create the run for `module`.
    pub async fn submit(
        &self,
        module: RegistryModule,
        module_id: &RegistryModuleId,
        request: &SubmissionRequest,
    ) -> Result<Submitted, Diagnostic> {
        let Some(version) = self.upload_artifact(module_id, request).await? else {
            return Ok(Submitted::Interrupted);
        };

        match self.create_run(version, module, request).await? {
            Some(run) => Ok(Submitted::Run(run)),
            None => Ok(Submitted::Interrupted),
        }
    }

    fn interrupted(&self) -> bool {
        let interrupted = self.signals.is_stopped() || self.signals.is_cancelled();
        if interrupted {
            info!("interrupt received during submission; not continuing");
        }
        interrupted
    }

    /// Run `call` unless the stop signal fires first.
    async fn unless_stopped<T>(
        &self,
        call: impl Future<Output = Result<T, ClientError>>,
    ) -> Option<Result<T, ClientError>> {
        tokio::select! {
            biased;
            _ = self.signals.stopped() => {
                info!("interrupt received during submission; abandoning remote call");
                None
            }
            result = call => Some(result),
        }
    }
}
