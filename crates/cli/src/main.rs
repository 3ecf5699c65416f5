mod commands;
mod harness;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{ProfileCommand, RunCommand};

/// Chatviz CLI - substitution-pass testing and dataset inspection tool
#[derive(Debug, Parser)]
#[command(
    name = "chatviz",
    version,
    about = "Run chart-spec substitution scenarios and inspect datasets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Execute substitution scenarios
    Run(RunCommand),
    /// Print the profile of a CSV dataset
    Profile(ProfileCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Run(cmd) => cmd.execute()?,
        Commands::Profile(cmd) => cmd.execute()?,
    };

    std::process::exit(exit_code);
}
