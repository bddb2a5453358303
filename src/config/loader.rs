// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawSuiteConfig, SuiteConfig};
use crate::errors::Result;

/// Load a manifest from a given path and return the raw `RawSuiteConfig`.
///
/// This only performs TOML deserialization; it does **not** perform
/// semantic validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSuiteConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawSuiteConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a manifest from path and run basic validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks run names, the test directory and the module source.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SuiteConfig> {
    let raw_config = load_from_path(&path)?;
    let config = SuiteConfig::try_from(raw_config)?;
    Ok(config)
}

