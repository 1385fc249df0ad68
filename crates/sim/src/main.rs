//! Headless arena simulation entry point.
mod config;
mod script;
mod tally;

use std::path::Path;

use anyhow::Result;
use arena_runtime::{Runtime, RuntimeConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::SimConfig;
use script::Script;
use tally::Tally;

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let sim = SimConfig::from_env();
    let _guard = setup_logging(sim.log_dir.as_deref())?;

    let tally = Tally::new();
    let mut script = Script::new(&sim);
    let mut runtime = Runtime::builder()
        .config(RuntimeConfig::from_env())
        .arena(script.arena())
        .sink(tally.clone())
        .build()?;

    script.populate(&mut runtime)?;
    let summary = script.run(&mut runtime, &tally)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Setup logging to stderr, and to a file when `log_dir` is set
fn setup_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::never(dir, "arena-sim.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(dir) = log_dir {
        tracing::info!("Log file: {}/arena-sim.log", dir.display());
    }
    Ok(guard)
}
