//! Command-line interface wiring for risk-triage.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod check;
pub mod normalize;
pub mod predict;
pub mod serve;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Ensemble suicide-risk and emotion screening", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Serve(args) => serve::run(args, settings).await,
            Commands::Predict(args) => predict::run(args, settings).await,
            Commands::Normalize(args) => normalize::run(args, settings).await,
            Commands::Check => check::run(settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load every artifact, then serve the JSON API.
    Serve(serve::Args),
    /// Score one text and print the result as JSON.
    Predict(predict::Args),
    /// Print the normalized form of a text.
    Normalize(normalize::Args),
    /// Load and validate every artifact without serving.
    Check,
}
