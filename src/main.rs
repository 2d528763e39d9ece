use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rateboard::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for rateboard::AppCommand {
    fn from(cmd: Commands) -> rateboard::AppCommand {
        match cmd {
            Commands::Rates => rateboard::AppCommand::Rates,
            Commands::History { limit } => rateboard::AppCommand::History { limit },
            Commands::Convert { amount, from, to } => {
                rateboard::AppCommand::Convert { amount, from, to }
            }
            Commands::Status => rateboard::AppCommand::Status,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display best buy/sell rates
    Rates,
    /// Display recent price history
    History {
        /// Number of most recent values to list
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Convert an amount between currencies at the best rates
    Convert {
        amount: f64,
        from: String,
        to: String,
    },
    /// Show when each rate source was last updated
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => rateboard::cli::setup::setup(),
        Some(cmd) => rateboard::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
