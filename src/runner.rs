// src/runner.rs

//! End-to-end flow of one remote test suite execution.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::client::{RunVariable, TestRunClient};
use crate::config::SuiteConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::engine::{
    InterruptSignals, MonitorOptions, RunMonitor, Submission, SubmissionRequest, Submitted,
};
use crate::logs::LogStreamProcessor;
use crate::source::{ModuleSource, SOURCE_ATTRIBUTE};
use crate::view::TestView;

/// What to run and where, taken from the suite manifest.
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    /// Private registry module the tests execute against.
    pub source: String,
    pub config_directory: PathBuf,
    pub test_directory: PathBuf,
    pub filter: Vec<String>,
    pub verbose: bool,
    pub variables: Vec<RunVariable>,
}

impl RunSettings {
    pub fn from_config(cfg: &SuiteConfig) -> Result<Self, Diagnostic> {
        let source = cfg.settings.source.clone().ok_or_else(|| {
            Diagnostic::attribute(
                "Missing module source",
                "Remote test runs need the private registry module to execute against; set [settings].source in the manifest.",
                SOURCE_ATTRIBUTE,
            )
        })?;

        Ok(Self {
            source,
            config_directory: cfg.settings.config_directory.clone(),
            test_directory: PathBuf::from(&cfg.settings.test_directory),
            filter: cfg.settings.filter.clone(),
            verbose: cfg.settings.verbose,
            variables: cfg
                .variables
                .iter()
                .map(|(key, value)| RunVariable {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        })
    }

    fn request(&self) -> SubmissionRequest {
        SubmissionRequest {
            config_directory: self.config_directory.clone(),
            test_directory: self.test_directory.clone(),
            filter: self.filter.clone(),
            verbose: self.verbose,
            variables: self.variables.clone(),
        }
    }
}

/// Submits a test suite, waits for it and renders its logs.
pub struct TestSuiteRunner {
    settings: RunSettings,
    client: Arc<dyn TestRunClient>,
    view: Arc<dyn TestView>,
    logs: LogStreamProcessor,
    signals: InterruptSignals,
    monitor_options: MonitorOptions,
}

impl fmt::Debug for TestSuiteRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuiteRunner")
            .field("settings", &self.settings)
            .field("monitor_options", &self.monitor_options)
            .finish_non_exhaustive()
    }
}

impl TestSuiteRunner {
    pub fn new(
        settings: RunSettings,
        client: Arc<dyn TestRunClient>,
        view: Arc<dyn TestView>,
        logs: LogStreamProcessor,
        signals: InterruptSignals,
    ) -> Self {
        Self {
            settings,
            client,
            view,
            logs,
            signals,
            monitor_options: MonitorOptions::default(),
        }
    }

    pub fn with_monitor_options(mut self, options: MonitorOptions) -> Self {
        self.monitor_options = options;
        self
    }

    /// Signals this runner reacts to; fire them to interrupt a test.
    pub fn signals(&self) -> &InterruptSignals {
        &self.signals
    }

    /// Run the whole suite remotely.
    ///
    /// Diagnostics are returned in the order they were produced; a fatal
    /// one is always last.
    pub async fn test(&mut self) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if let Err(fatal) = self.execute(&mut diags).await {
            debug!(summary = %fatal.summary, "test run ended early");
            diags.push(fatal);
        }
        diags
    }

    /// [`test`](Self::test) with Ctrl-C wired to the signals: the first
    /// press stops the run gracefully, the second cancels it.
    pub async fn test_interactive(&mut self) -> Diagnostics {
        let listener = self.signals.spawn_ctrl_c_listener();
        let diags = self.test().await;
        listener.abort();
        diags
    }

    async fn execute(&mut self, diags: &mut Diagnostics) -> Result<(), Diagnostic> {
        let addr = ModuleSource::parse_private(&self.settings.source)?;
        let request = self.settings.request();

        let submission = Submission::new(self.client.as_ref(), &self.signals);
        let Some(module) = submission.read_module(&addr).await? else {
            return Ok(());
        };

        let run = match submission
            .submit(module, &addr.registry_module_id(), &request)
            .await?
        {
            Submitted::Run(run) => run,
            Submitted::Interrupted => {
                info!("test run was not created");
                return Ok(());
            }
        };

        let monitor = RunMonitor::with_options(
            Arc::clone(&self.client),
            Arc::clone(&self.view),
            self.monitor_options,
        );
        let run = monitor.wait(run, &self.signals, diags).await?;

        self.logs.render(self.client.as_ref(), &run.id, diags).await
    }
}
