// src/main.rs

use cloudtest::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("cloudtest error: {err:?}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the command finished without error diagnostics.
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let diags = run(args).await?;
    Ok(!diags.has_errors())
}
