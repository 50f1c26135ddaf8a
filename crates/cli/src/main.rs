//! latte - renders templated LaTeX documents through a concurrent
//! template/render/archive pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use latte_core::Config;

mod commands;
mod composition;
mod ingress;
mod logging;

#[derive(Parser)]
#[command(name = "latte")]
#[command(about = "Renders templated LaTeX documents through a concurrent pipeline")]
struct Cli {
  /// Path to the configuration file.
  #[arg(long, global = true, default_value = "latte.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the long-lived service: watches a directory for dropped job files.
  Serve {
    /// Directory to watch for dropped job-description JSON files.
    #[arg(long, default_value = "./incoming")]
    watch_dir: PathBuf,
  },
  /// Render a single job description and print its result.
  Render {
    /// Path to a job description JSON file.
    job: PathBuf,
  },
  /// Inspect or initialize configuration.
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },
}

#[derive(Subcommand)]
enum ConfigCommand {
  /// Print the currently effective configuration.
  Show,
  /// Write a configuration file with default values.
  Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  logging::init_logging();

  let config = Config::load_from_file(&cli.config)?;

  match cli.command {
    Commands::Serve { watch_dir } => commands::serve::run(config, watch_dir).await,
    Commands::Render { job } => commands::render::run(config, job).await,
    Commands::Config { command } => match command {
      ConfigCommand::Show => commands::config::show(&config),
      ConfigCommand::Init => commands::config::init(&cli.config, &config),
    },
  }
}
