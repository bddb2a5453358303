// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `cloudtest`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cloudtest",
    version,
    about = "Run module tests remotely and render their results.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CLOUDTEST_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a downloaded test run log (one JSON record per line).
    RenderLogs(RenderLogsArgs),

    /// Check that a module source can be tested remotely.
    CheckSource {
        /// Registry module address, e.g. `app.terraform.io/acme/vpc/aws`.
        source: String,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct RenderLogsArgs {
    /// Log file to render.
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// Suite manifest (TOML) providing run modes and modules.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Provider schemas as printed by `terraform providers schema -json`.
    #[arg(long, value_name = "PATH")]
    pub schemas: Option<PathBuf>,

    /// Print the records as raw JSON instead of rendering them.
    #[arg(long)]
    pub raw: bool,

    /// Wrap output at this width; defaults to `COLUMNS`.
    #[arg(long, value_name = "N")]
    pub columns: Option<usize>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_logs_with_global_log_level() {
        let args = CliArgs::try_parse_from([
            "cloudtest",
            "render-logs",
            "--file",
            "run.jsonl",
            "--raw",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        let Command::RenderLogs(render) = args.command else {
            panic!("expected render-logs");
        };
        assert_eq!(render.file, PathBuf::from("run.jsonl"));
        assert!(render.raw);
        assert!(render.config.is_none());
    }

    #[test]
    fn check_source_requires_a_source() {
        assert!(CliArgs::try_parse_from(["cloudtest", "check-source"]).is_err());
    }
}
