mod app;
mod cache;
mod commands;
mod config;
mod event;
mod query;
mod report;
mod ui;
mod zenhub;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "z9s")]
#[command(about = "A terminal UI for ZenHub sprint reports, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/z9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Project id to report on
  #[arg(short, long)]
  project: Option<String>,
}

/// Log to a file; stdout belongs to the terminal UI.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()?.join("z9s").join("logs");
  let appender = tracing_appender::rolling::daily(log_dir, "z9s.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  // Keep the guard alive for the lifetime of the process
  let _log_guard = init_tracing();

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override project if specified on command line
  let config = if let Some(project) = args.project {
    config::Config {
      default_project: Some(project),
      ..config
    }
  } else {
    config
  };

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
