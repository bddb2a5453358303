#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use cloudtest::config::{RawSuiteConfig, RunConfig, SettingsSection, SuiteConfig, TestFileConfig};
use cloudtest::types::TestMode;

/// Builder for `SuiteConfig` to simplify test setup.
pub struct SuiteConfigBuilder {
    config: RawSuiteConfig,
}

impl SuiteConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawSuiteConfig {
                settings: SettingsSection::default(),
                variables: BTreeMap::new(),
                file: BTreeMap::new(),
            },
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.config.settings.source = Some(source.to_string());
        self
    }

    pub fn with_config_directory(mut self, dir: &str) -> Self {
        self.config.settings.config_directory = PathBuf::from(dir);
        self
    }

    pub fn with_test_directory(mut self, dir: &str) -> Self {
        self.config.settings.test_directory = dir.to_string();
        self
    }

    pub fn with_filter(mut self, file: &str) -> Self {
        self.config.settings.filter.push(file.to_string());
        self
    }

    pub fn verbose(mut self) -> Self {
        self.config.settings.verbose = true;
        self
    }

    pub fn with_variable(mut self, name: &str, expr: &str) -> Self {
        self.config
            .variables
            .insert(name.to_string(), expr.to_string());
        self
    }

    pub fn with_run(mut self, file: &str, run: RunConfig) -> Self {
        self.config
            .file
            .entry(file.to_string())
            .or_insert_with(TestFileConfig::default)
            .run
            .push(run);
        self
    }

    pub fn raw(self) -> RawSuiteConfig {
        self.config
    }

    pub fn build(self) -> SuiteConfig {
        SuiteConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for SuiteConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RunConfig`.
pub struct RunConfigBuilder {
    run: RunConfig,
}

impl RunConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            run: RunConfig {
                name: name.to_string(),
                mode: TestMode::Normal,
                module: None,
            },
        }
    }

    pub fn refresh_only(mut self) -> Self {
        self.run.mode = TestMode::RefreshOnly;
        self
    }

    pub fn module(mut self, source: &str) -> Self {
        self.run.module = Some(source.to_string());
        self
    }

    pub fn build(self) -> RunConfig {
        self.run
    }
}
