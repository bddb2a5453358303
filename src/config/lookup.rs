// src/config/lookup.rs

//! Read-only `(test file, run name) -> options` table.
//!
//! Log records only name the file and run they came from; the mode and
//! module context needed to render them is recovered from here.

use std::collections::BTreeMap;

use crate::config::model::SuiteConfig;
use crate::types::{PlanMode, TestMode};

/// Label used when a run has no alternate module.
pub const MODULE_UNDER_TEST: &str = "the module under test";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: TestMode,
    pub module: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunConfigLookup {
    files: BTreeMap<String, BTreeMap<String, RunOptions>>,
}

impl RunConfigLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &SuiteConfig) -> Self {
        let mut lookup = Self::new();
        for (file, file_cfg) in &cfg.file {
            for run in &file_cfg.run {
                lookup.insert(
                    file,
                    &run.name,
                    RunOptions {
                        mode: run.mode,
                        module: run.module.clone(),
                    },
                );
            }
        }
        lookup
    }

    pub fn insert(&mut self, file: &str, run: &str, options: RunOptions) {
        self.files
            .entry(file.to_string())
            .or_default()
            .insert(run.to_string(), options);
    }

    pub fn get(&self, file: &str, run: &str) -> Option<&RunOptions> {
        self.files.get(file)?.get(run)
    }

    /// Plan mode for a run; anything unknown renders as a normal plan.
    pub fn plan_mode(&self, file: &str, run: &str) -> PlanMode {
        self.get(file, run)
            .map(|options| PlanMode::from(options.mode))
            .unwrap_or(PlanMode::Normal)
    }

    /// Display name of the module a run executes, quoted when it is an
    /// alternate module.
    pub fn module_label(&self, file: &str, run: &str) -> String {
        self.get(file, run)
            .and_then(|options| options.module.as_deref())
            .map(|module| format!("{module:?}"))
            .unwrap_or_else(|| MODULE_UNDER_TEST.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup() -> RunConfigLookup {
        let mut lookup = RunConfigLookup::new();
        lookup.insert(
            "main.tftest.hcl",
            "refresh",
            RunOptions {
                mode: TestMode::RefreshOnly,
                module: None,
            },
        );
        lookup.insert(
            "main.tftest.hcl",
            "setup",
            RunOptions {
                mode: TestMode::Normal,
                module: Some("./testing/setup".to_string()),
            },
        );
        lookup
    }

    #[test]
    fn plan_mode_defaults_to_normal() {
        let lookup = lookup();
        assert_eq!(lookup.plan_mode("main.tftest.hcl", "refresh"), PlanMode::RefreshOnly);
        assert_eq!(lookup.plan_mode("main.tftest.hcl", "setup"), PlanMode::Normal);
        assert_eq!(lookup.plan_mode("main.tftest.hcl", "missing"), PlanMode::Normal);
        assert_eq!(lookup.plan_mode("other.tftest.hcl", "refresh"), PlanMode::Normal);
    }

    #[test]
    fn module_label_quotes_alternate_modules() {
        let lookup = lookup();
        assert_eq!(
            lookup.module_label("main.tftest.hcl", "setup"),
            "\"./testing/setup\""
        );
        assert_eq!(lookup.module_label("main.tftest.hcl", "refresh"), MODULE_UNDER_TEST);
        assert_eq!(lookup.module_label("nope.tftest.hcl", "setup"), MODULE_UNDER_TEST);
    }
}
