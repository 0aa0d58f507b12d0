mod cli;
mod config;
mod error;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use sdb_core::{BatchRunner, Engine};
use sdb_engine::{PlaceholderEngine, ServiceEngine};
use crate::cli::{Args, EngineKind};
use crate::config::EngineSettings;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.run_config();

    let engine: Box<dyn Engine> = match args.engine {
        EngineKind::Service => {
            let settings = EngineSettings::load(args.engine_url.as_deref())?;
            Box::new(
                ServiceEngine::new(settings.service)
                    .context("Failed to set up inference service engine")?,
            )
        }
        EngineKind::Placeholder => Box::new(PlaceholderEngine::new()),
    };

    // Output paths go to stdout, one per run, before the run starts
    let mut runner = BatchRunner::new(engine)
        .on_run_start(|_, path| println!("{}", path.display()));
    let report = runner.run(&config)?;

    for run in &report.runs {
        info!("{} run {} -> {}", run.status.icon(), run.index, run.output.display());
    }
    info!("Finished {} of {} run(s)", report.completed(), report.runs.len());

    Ok(())
}
