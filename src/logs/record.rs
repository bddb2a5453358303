// src/logs/record.rs

//! Wire format of the remote run's structured log stream.
//!
//! Each line is one JSON object. Most fields are common to every record;
//! `type` selects which type-specific payload (if any) is present.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Version,
    Log,
    Diagnostic,
    TestAbstract,
    TestFile,
    TestRun,
    TestPlan,
    TestState,
    TestCleanup,
    TestInterrupt,
    TestSummary,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One decoded line of the log stream.
///
/// The type-specific payloads this client enriches are split out into typed
/// fields; anything else is kept in `extra` for the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonLog {
    #[serde(rename = "@level", default)]
    pub level: String,
    #[serde(rename = "@message", default)]
    pub message: String,
    #[serde(rename = "@module", default, skip_serializing_if = "String::is_empty")]
    pub module: String,
    #[serde(rename = "@timestamp", default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,
    #[serde(rename = "type", default)]
    pub kind: LogType,
    #[serde(rename = "@testfile", default, skip_serializing_if = "String::is_empty")]
    pub test_file: String,
    #[serde(rename = "@testrun", default, skip_serializing_if = "String::is_empty")]
    pub test_run: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_plan: Option<TestPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_state: Option<TestState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_interrupt: Option<TestFatalInterrupt>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Plan produced by a `run` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    #[serde(default)]
    pub format_version: String,
    #[serde(default)]
    pub output_changes: Map<String, Value>,
    #[serde(default)]
    pub resource_changes: Vec<Value>,
    #[serde(default)]
    pub resource_drift: Vec<Value>,
    #[serde(default)]
    pub relevant_attributes: Vec<Value>,
}

/// State left behind by an applied `run` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestState {
    #[serde(default)]
    pub format_version: String,
    #[serde(default)]
    pub values: Option<StateValues>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateValues {
    #[serde(default)]
    pub outputs: Map<String, Value>,
    #[serde(default)]
    pub root_module: Value,
}

/// Resources left behind when a run was interrupted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFatalInterrupt {
    /// Created under the current run.
    #[serde(default)]
    pub state: Vec<TestFailedResource>,
    /// Created under other runs, keyed by run name.
    #[serde(default)]
    pub states: BTreeMap<String, Vec<TestFailedResource>>,
    /// Mid-creation when the interrupt hit; may not have been destroyed.
    #[serde(default)]
    pub planned: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailedResource {
    pub instance: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deposed_key: String,
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid log line: {0}")]
    Json(#[from] serde_json::Error),

    #[error("log line of type \"{kind}\" has no \"{kind}\" payload")]
    MissingPayload { kind: &'static str },
}

/// A log line, classified by the payload this client needs to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    /// Rendered as-is.
    Generic(JsonLog),
    Plan { log: JsonLog, plan: TestPlan },
    State { log: JsonLog, state: TestState },
    Interrupt {
        log: JsonLog,
        interrupt: TestFatalInterrupt,
    },
}

impl LogRecord {
    pub fn decode(line: &[u8]) -> Result<Self, DecodeError> {
        let mut log: JsonLog = serde_json::from_slice(line)?;

        let record = match log.kind {
            LogType::TestPlan => {
                let plan = log
                    .test_plan
                    .take()
                    .ok_or(DecodeError::MissingPayload { kind: "test_plan" })?;
                LogRecord::Plan { log, plan }
            }
            LogType::TestState => {
                let state = log
                    .test_state
                    .take()
                    .ok_or(DecodeError::MissingPayload { kind: "test_state" })?;
                LogRecord::State { log, state }
            }
            LogType::TestInterrupt => {
                let interrupt = log
                    .test_interrupt
                    .take()
                    .ok_or(DecodeError::MissingPayload { kind: "test_interrupt" })?;
                LogRecord::Interrupt { log, interrupt }
            }
            _ => LogRecord::Generic(log),
        };
        Ok(record)
    }

    pub fn log(&self) -> &JsonLog {
        match self {
            LogRecord::Generic(log)
            | LogRecord::Plan { log, .. }
            | LogRecord::State { log, .. }
            | LogRecord::Interrupt { log, .. } => log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_generic_record_and_keeps_extra_fields() {
        let line = br#"{"@level":"info","@message":"main.tftest.hcl... pass","type":"test_file","@testfile":"main.tftest.hcl","test_file":{"path":"main.tftest.hcl","status":"pass"}}"#;
        let record = LogRecord::decode(line).unwrap();
        let LogRecord::Generic(log) = record else {
            panic!("expected generic record");
        };
        assert_eq!(log.kind, LogType::TestFile);
        assert_eq!(log.test_file, "main.tftest.hcl");
        assert!(log.extra.contains_key("test_file"));
    }

    #[test]
    fn unknown_types_are_generic() {
        let record = LogRecord::decode(br#"{"@message":"hi","type":"brand_new"}"#).unwrap();
        assert_eq!(record.log().kind, LogType::Unknown);
        assert!(matches!(record, LogRecord::Generic(_)));
    }

    #[test]
    fn decodes_plan_payload() {
        let line = br#"{"@message":"plan","type":"test_plan","@testfile":"a.tftest.hcl","@testrun":"setup","test_plan":{"format_version":"1.2","resource_changes":[{"address":"aws_s3_bucket.b","change":{"actions":["create"]}}]}}"#;
        let LogRecord::Plan { log, plan } = LogRecord::decode(line).unwrap() else {
            panic!("expected plan record");
        };
        assert_eq!(log.test_run, "setup");
        assert!(log.test_plan.is_none());
        assert_eq!(plan.format_version, "1.2");
        assert_eq!(plan.resource_changes.len(), 1);
    }

    #[test]
    fn decodes_interrupt_payload() {
        let line = br#"{"@message":"Terraform was interrupted","type":"test_interrupt","test_interrupt":{"state":[{"instance":"aws_instance.a","deposed_key":"abcd"}],"states":{"setup":[{"instance":"aws_vpc.main"}]},"planned":["aws_instance.b"]}}"#;
        let LogRecord::Interrupt { interrupt, .. } = LogRecord::decode(line).unwrap() else {
            panic!("expected interrupt record");
        };
        assert_eq!(interrupt.state[0].deposed_key, "abcd");
        assert_eq!(interrupt.states["setup"][0].instance, "aws_vpc.main");
        assert_eq!(interrupt.planned, vec!["aws_instance.b".to_string()]);
    }

    #[test]
    fn tagged_record_without_payload_fails() {
        let err = LogRecord::decode(br#"{"@message":"x","type":"test_state"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingPayload { kind: "test_state" }));
    }

    #[test]
    fn malformed_json_fails() {
        assert!(matches!(
            LogRecord::decode(b"not json at all"),
            Err(DecodeError::Json(_))
        ));
    }
}
