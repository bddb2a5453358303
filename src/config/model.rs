// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::TestMode;

/// Test suite manifest as read from a TOML file.
///
/// ```toml
/// [settings]
/// source = "app.terraform.io/acme/vpc/aws"
/// test_directory = "tests"
///
/// [variables]
/// region = '"eu-west-1"'
///
/// [[file."tests/main.tftest.hcl".run]]
/// name = "setup"
/// mode = "refresh-only"
/// module = "./testing/setup"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSuiteConfig {
    #[serde(default)]
    pub settings: SettingsSection,

    /// Variables passed to the remote run, as `name = <expression>`.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// Test files keyed by path, each with its `run` blocks.
    #[serde(default)]
    pub file: BTreeMap<String, TestFileConfig>,
}

/// Validated manifest.
///
/// Construct it through `SuiteConfig::try_from(RawSuiteConfig)` (see
/// `validate.rs`) or [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub settings: SettingsSection,
    pub variables: BTreeMap<String, String>,
    pub file: BTreeMap<String, TestFileConfig>,
}

impl SuiteConfig {
    pub(crate) fn new_unchecked(raw: RawSuiteConfig) -> Self {
        Self {
            settings: raw.settings,
            variables: raw.variables,
            file: raw.file,
        }
    }
}

/// `[settings]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsSection {
    /// Private registry module the tests run against.
    #[serde(default)]
    pub source: Option<String>,

    /// Directory uploaded as the configuration version.
    #[serde(default = "default_config_directory")]
    pub config_directory: PathBuf,

    /// Directory of the test files, relative to `config_directory`.
    #[serde(default = "default_test_directory")]
    pub test_directory: String,

    /// Print plans and state for every run block.
    #[serde(default)]
    pub verbose: bool,

    /// Only execute these test files.
    #[serde(default)]
    pub filter: Vec<String>,
}

fn default_config_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_test_directory() -> String {
    "tests".to_string()
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            source: None,
            config_directory: default_config_directory(),
            test_directory: default_test_directory(),
            verbose: false,
            filter: Vec::new(),
        }
    }
}

/// `[file."<path>"]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TestFileConfig {
    #[serde(default)]
    pub run: Vec<RunConfig>,
}

/// One `[[file."<path>".run]]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub name: String,

    #[serde(default)]
    pub mode: TestMode,

    /// Source of an alternate module this run executes instead of the
    /// module under test.
    #[serde(default)]
    pub module: Option<String>,
}
