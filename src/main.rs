use anyhow::Result;
use clap::{Parser, Subcommand};

use cicerone::app::App;
use cicerone::config::Config;
use cicerone::logging;

#[derive(Parser)]
#[command(name = "cicerone")]
#[command(about = "Guided-tour overlay engine for terminal interfaces", long_about = None)]
struct Cli {
    /// Path to an explicit config file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo dashboard with a tour over it (default)
    Demo,
    /// Print the resolved configuration and exit
    CheckConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => {
            let logging_handle = logging::init_logging(&config, true, cli.debug)?;
            if let Some(path) = &logging_handle.log_file_path {
                tracing::info!(path = %path.display(), "logging to file");
            }

            let mut app = App::new(config)?;
            app.run()
        }
        Commands::CheckConfig => {
            let _logging_handle = logging::init_logging(&config, false, cli.debug)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
