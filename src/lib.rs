// src/lib.rs

pub mod cli;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod logs;
pub mod render;
pub mod runner;
pub mod source;
pub mod terminal;
pub mod types;
pub mod view;

use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, RenderLogsArgs};
use crate::config::{load_and_validate, RunConfigLookup};
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::logs::{LogStreamProcessor, ProviderSchemas};
use crate::render::HumanRenderer;
use crate::source::ModuleSource;
use crate::terminal::{word_wrap, Streams};

/// High-level entry point used by `main.rs`.
///
/// Returns the diagnostics produced by the command after printing them;
/// setup failures (unreadable files, invalid manifest) are errors.
pub async fn run(args: CliArgs) -> Result<Diagnostics> {
    let streams = Streams::stdio();

    let diags = match args.command {
        Command::RenderLogs(render) => render_logs(render, streams.clone()).await?,
        Command::CheckSource { source } => check_source(&source, &streams),
    };

    print_diagnostics(&streams, &diags);
    Ok(diags)
}

/// Render a previously downloaded log stream.
async fn render_logs(args: RenderLogsArgs, streams: Streams) -> Result<Diagnostics> {
    let streams = match args.columns {
        Some(columns) => streams.with_columns(columns),
        None => streams,
    };

    let mut processor = if args.raw {
        LogStreamProcessor::raw(streams)
    } else {
        let lookup = match &args.config {
            Some(path) => {
                let cfg = load_and_validate(path)
                    .with_context(|| format!("loading manifest {}", path.display()))?;
                RunConfigLookup::from_config(&cfg)
            }
            None => RunConfigLookup::new(),
        };
        let schemas = match &args.schemas {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("opening provider schemas {}", path.display()))?;
                ProviderSchemas::from_reader(file)
                    .with_context(|| format!("reading provider schemas {}", path.display()))?
            }
            None => ProviderSchemas::empty(),
        };
        debug!(providers = schemas.len(), "loaded provider schemas");

        LogStreamProcessor::with_renderer(
            HumanRenderer::new(streams.clone()),
            streams,
            Arc::new(lookup),
            Arc::new(schemas),
        )
    };

    let file = tokio::fs::File::open(&args.file)
        .await
        .with_context(|| format!("opening log file {}", args.file.display()))?;
    info!(file = %args.file.display(), raw = args.raw, "rendering logs");

    let mut diags = Diagnostics::new();
    if let Err(fatal) = processor.render_stream(file, &mut diags).await {
        diags.push(fatal);
    }
    Ok(diags)
}

/// Validate a module source the way a remote test run would.
fn check_source(source: &str, streams: &Streams) -> Diagnostics {
    let mut diags = Diagnostics::new();
    match ModuleSource::parse_private(source) {
        Ok(addr) => {
            streams.println(&format!("{addr}: ok"));
            streams.println(&format!("  registry host: {}", addr.host));
            let id = addr.registry_module_id();
            streams.println(&format!(
                "  module: {}/{}/{} (organization {})",
                id.namespace, id.name, id.provider, id.organization
            ));
            if let Some(subdir) = &addr.subdir {
                streams.println(&format!("  subdirectory: {subdir}"));
            }
        }
        Err(diag) => diags.push(diag),
    }
    diags
}

/// Print diagnostics to stderr, wrapped to the terminal width.
pub fn print_diagnostics(streams: &Streams, diags: &Diagnostics) {
    for diag in diags {
        let text = format_diagnostic(diag);
        streams.eprintln(&word_wrap(&text, streams.columns()));
    }
}

fn format_diagnostic(diag: &Diagnostic) -> String {
    let label = match diag.severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
    };
    let mut text = format!("\n{label}: {}\n", diag.summary);
    if let Some(attr) = &diag.attribute {
        text.push_str(&format!("\n  on attribute \"{attr}\"\n"));
    }
    if !diag.detail.is_empty() {
        text.push('\n');
        text.push_str(&diag.detail);
        text.push('\n');
    }
    text
}
