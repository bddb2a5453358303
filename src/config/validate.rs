// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{RawSuiteConfig, SuiteConfig};
use crate::errors::{CloudTestError, Result};

impl TryFrom<RawSuiteConfig> for SuiteConfig {
    type Error = CloudTestError;

    fn try_from(raw: RawSuiteConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(SuiteConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawSuiteConfig) -> Result<()> {
    validate_settings(cfg)?;
    validate_variables(cfg)?;
    validate_runs(cfg)?;
    Ok(())
}

fn validate_settings(cfg: &RawSuiteConfig) -> Result<()> {
    if cfg.settings.test_directory.trim().is_empty() {
        return Err(CloudTestError::Config(
            "[settings].test_directory must not be empty".to_string(),
        ));
    }

    if let Some(source) = &cfg.settings.source {
        if source.trim().is_empty() {
            return Err(CloudTestError::Config(
                "[settings].source must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_variables(cfg: &RawSuiteConfig) -> Result<()> {
    for name in cfg.variables.keys() {
        if name.trim().is_empty() {
            return Err(CloudTestError::Config(
                "[variables] contains a variable with an empty name".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_runs(cfg: &RawSuiteConfig) -> Result<()> {
    for (file, file_cfg) in cfg.file.iter() {
        if file.trim().is_empty() {
            return Err(CloudTestError::Config(
                "[file] keys must be non-empty test file paths".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for run in file_cfg.run.iter() {
            if run.name.trim().is_empty() {
                return Err(CloudTestError::Config(format!(
                    "test file '{}' has a run block without a name",
                    file
                )));
            }
            if !seen.insert(run.name.as_str()) {
                return Err(CloudTestError::Config(format!(
                    "test file '{}' has duplicate run block '{}'",
                    file, run.name
                )));
            }
            if let Some(module) = &run.module {
                if module.trim().is_empty() {
                    return Err(CloudTestError::Config(format!(
                        "run block '{}' in '{}' has an empty module source",
                        run.name, file
                    )));
                }
            }
        }
    }
    Ok(())
}
