// src/render/human.rs

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::logs::{JsonLog, LogType, Plan, State};
use crate::render::{RenderError, Renderer};
use crate::terminal::{word_wrap, Streams};
use crate::types::PlanMode;

/// Plain-text renderer for terminals.
///
/// Plans are summarised by the actions of their resource changes, state by
/// its resources and outputs. Diagnostics go to stderr when they are
/// errors, everything else to stdout.
#[derive(Debug, Clone)]
pub struct HumanRenderer {
    streams: Streams,
}

impl HumanRenderer {
    pub fn new(streams: Streams) -> Self {
        Self { streams }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChangeCounts {
    pub add: usize,
    pub change: usize,
    pub destroy: usize,
}

impl ChangeCounts {
    pub fn is_empty(&self) -> bool {
        self.add == 0 && self.change == 0 && self.destroy == 0
    }
}

/// Count the planned actions of `resource_changes`.
///
/// A replacement counts as one add and one destroy.
pub fn count_changes(resource_changes: &[Value]) -> ChangeCounts {
    let mut counts = ChangeCounts::default();
    for change in resource_changes {
        for action in actions(change) {
            match action {
                "create" => counts.add += 1,
                "update" => counts.change += 1,
                "delete" => counts.destroy += 1,
                _ => {}
            }
        }
    }
    counts
}

fn actions(change: &Value) -> impl Iterator<Item = &str> {
    change
        .pointer("/change/actions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

fn address(value: &Value) -> &str {
    value
        .get("address")
        .and_then(Value::as_str)
        .unwrap_or("(unknown)")
}

fn describe(change: &Value) -> Option<&'static str> {
    let actions: Vec<&str> = actions(change).collect();
    match actions.as_slice() {
        ["create"] => Some("will be created"),
        ["update"] => Some("will be updated in-place"),
        ["delete"] => Some("will be destroyed"),
        ["delete", "create"] | ["create", "delete"] => Some("must be replaced"),
        ["read"] => Some("will be read during apply"),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct DiagnosticPayload {
    #[serde(default)]
    severity: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    detail: String,
}

impl Renderer for HumanRenderer {
    fn render_plan(&mut self, plan: Plan, mode: PlanMode) {
        debug!(
            ?mode,
            resource_changes = plan.resource_changes.len(),
            resource_drift = plan.resource_drift.len(),
            "rendering plan"
        );

        if mode == PlanMode::RefreshOnly {
            if plan.resource_drift.is_empty() {
                self.streams.println(
                    "No changes. Your infrastructure still matches the configuration.",
                );
                return;
            }
            self.streams
                .println("Note: Objects have changed outside of Terraform\n");
            for drift in &plan.resource_drift {
                self.streams.println(&format!("  # {} has changed", address(drift)));
            }
            return;
        }

        let counts = count_changes(&plan.resource_changes);
        if counts.is_empty() && plan.output_changes.is_empty() {
            self.streams
                .println("No changes. Your infrastructure matches the configuration.");
            return;
        }

        for change in &plan.resource_changes {
            if let Some(what) = describe(change) {
                self.streams
                    .println(&format!("  # {} {what}", address(change)));
            }
        }
        self.streams.println(&format!(
            "\nPlan: {} to add, {} to change, {} to destroy.",
            counts.add, counts.change, counts.destroy
        ));
        if !plan.output_changes.is_empty() {
            self.streams.println("\nChanges to Outputs:");
            for name in plan.output_changes.keys() {
                self.streams.println(&format!("  ~ {name}"));
            }
        }
    }

    fn render_state(&mut self, state: State) {
        let resources: Vec<&Value> = state
            .root_module
            .get("resources")
            .and_then(Value::as_array)
            .map(|r| r.iter().collect())
            .unwrap_or_default();

        if resources.is_empty() && state.root_module_outputs.is_empty() {
            self.streams
                .println("The state file is empty. No resources are represented.");
            return;
        }

        for resource in resources {
            self.streams.println(&format!("# {}:", address(resource)));
        }
        if !state.root_module_outputs.is_empty() {
            self.streams.println("\nOutputs:\n");
            for (name, output) in &state.root_module_outputs {
                let value = match output.get("sensitive") {
                    Some(Value::Bool(true)) => "(sensitive value)".to_string(),
                    _ => output
                        .get("value")
                        .map(Value::to_string)
                        .unwrap_or_default(),
                };
                self.streams.println(&format!("{name} = {value}"));
            }
        }
    }

    fn render_log(&mut self, log: &JsonLog) -> Result<(), RenderError> {
        match log.kind {
            LogType::Version => Ok(()),
            LogType::Diagnostic => {
                let payload = log
                    .diagnostic
                    .clone()
                    .ok_or(RenderError::MissingDiagnostic)?;
                let diag: DiagnosticPayload = serde_json::from_value(payload)?;

                let label = if diag.severity == "warning" { "Warning" } else { "Error" };
                let mut text = format!("\n{label}: {}\n", diag.summary);
                if !diag.detail.is_empty() {
                    text.push('\n');
                    text.push_str(&diag.detail);
                    text.push('\n');
                }
                let text = word_wrap(&text, self.streams.columns());
                if label == "Error" {
                    self.streams.eprint(&text);
                } else {
                    self.streams.print(&text);
                }
                Ok(())
            }
            _ => {
                self.streams
                    .println(&word_wrap(&log.message, self.streams.columns()));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::logs::ProviderSchemas;
    use crate::terminal::testing::capture;

    fn plan(changes: Value, drift: Value) -> Plan {
        let test_plan = serde_json::from_value(json!({
            "format_version": "1.2",
            "resource_changes": changes,
            "resource_drift": drift,
        }))
        .unwrap();
        Plan::enrich(test_plan, &Arc::new(ProviderSchemas::empty()))
    }

    #[test]
    fn counts_replacements_as_add_and_destroy() {
        let counts = count_changes(&[
            json!({"address": "a.one", "change": {"actions": ["create"]}}),
            json!({"address": "a.two", "change": {"actions": ["delete", "create"]}}),
            json!({"address": "a.three", "change": {"actions": ["update"]}}),
            json!({"address": "a.four", "change": {"actions": ["no-op"]}}),
        ]);
        assert_eq!(
            counts,
            ChangeCounts {
                add: 2,
                change: 1,
                destroy: 1
            }
        );
    }

    #[test]
    fn normal_plan_prints_summary() {
        let (streams, out, _err) = capture(0);
        let mut renderer = HumanRenderer::new(streams);
        renderer.render_plan(
            plan(
                json!([{"address": "aws_vpc.main", "change": {"actions": ["create"]}}]),
                json!([]),
            ),
            PlanMode::Normal,
        );
        let text = out.text();
        assert!(text.contains("  # aws_vpc.main will be created"));
        assert!(text.contains("Plan: 1 to add, 0 to change, 0 to destroy."));
    }

    #[test]
    fn refresh_only_plan_reports_drift_only() {
        let (streams, out, _err) = capture(0);
        let mut renderer = HumanRenderer::new(streams);
        renderer.render_plan(
            plan(
                json!([{"address": "aws_vpc.main", "change": {"actions": ["create"]}}]),
                json!([{"address": "aws_vpc.main", "change": {"actions": ["update"]}}]),
            ),
            PlanMode::RefreshOnly,
        );
        let text = out.text();
        assert!(text.contains("Objects have changed outside of Terraform"));
        assert!(!text.contains("Plan:"));
    }

    #[test]
    fn empty_state_message() {
        let (streams, out, _err) = capture(0);
        let mut renderer = HumanRenderer::new(streams);
        let state = State::enrich(Default::default(), &Arc::new(ProviderSchemas::empty()));
        renderer.render_state(state);
        assert_eq!(
            out.text(),
            "The state file is empty. No resources are represented.\n"
        );
    }

    #[test]
    fn diagnostic_without_payload_is_an_error() {
        let (streams, _out, _err) = capture(0);
        let mut renderer = HumanRenderer::new(streams);
        let log = JsonLog {
            kind: LogType::Diagnostic,
            message: "Error: boom".into(),
            ..JsonLog::default()
        };
        assert!(matches!(
            renderer.render_log(&log),
            Err(RenderError::MissingDiagnostic)
        ));
    }

    #[test]
    fn error_diagnostics_go_to_stderr() {
        let (streams, out, err) = capture(0);
        let mut renderer = HumanRenderer::new(streams);
        let log = JsonLog {
            kind: LogType::Diagnostic,
            diagnostic: Some(json!({
                "severity": "error",
                "summary": "Test assertion failed",
                "detail": "expected 2, got 3"
            })),
            ..JsonLog::default()
        };
        renderer.render_log(&log).unwrap();
        assert!(out.text().is_empty());
        assert_eq!(
            err.text(),
            "\nError: Test assertion failed\n\nexpected 2, got 3\n"
        );
    }
}
