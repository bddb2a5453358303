// src/render/mod.rs

//! Turning enriched log records into human-readable output.

pub mod human;

use thiserror::Error;

use crate::logs::{JsonLog, Plan, State};
use crate::types::PlanMode;

pub use human::HumanRenderer;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("diagnostic log has no \"diagnostic\" payload")]
    MissingDiagnostic,

    #[error("invalid diagnostic payload: {0}")]
    InvalidDiagnostic(#[from] serde_json::Error),
}

/// Renders decoded log records.
///
/// Plan and state records arrive already merged with the provider schemas;
/// everything else is passed through as the decoded [`JsonLog`].
pub trait Renderer: Send {
    fn render_plan(&mut self, plan: Plan, mode: PlanMode);

    fn render_state(&mut self, state: State);

    fn render_log(&mut self, log: &JsonLog) -> Result<(), RenderError>;
}
