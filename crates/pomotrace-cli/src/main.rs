use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod probe;

#[derive(Parser)]
#[command(name = "pomotrace", version, about = "Pomotrace focus timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a live engine: 1 Hz timer loop plus foreground sampling
    Run(commands::run::RunArgs),
    /// Show the persisted tracking checkpoint and resume eligibility
    Status,
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Usage analytics for a recorded session
    Usage(commands::usage::UsageArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Foreground probe diagnostics
    Probe {
        #[command(subcommand)]
        action: commands::probe::ProbeAction,
    },
}

fn main() {
    // Logs go to stderr; stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Status => commands::status::run(),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Usage(args) => commands::usage::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Probe { action } => commands::probe::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
