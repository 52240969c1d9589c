//! CLI entry-point for one-shot scoring.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{config::Settings, inference::InferencePipeline};

/// Args for the `predict` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Free text to score.
    #[arg(long)]
    pub text: String,
}

#[instrument(skip_all)]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let pipeline = InferencePipeline::load(&settings).context("loading inference artifacts")?;
    let result = pipeline.run(&args.text)?;
    info!(prediction = %result.risk_label, emotion = %result.emotion_label, "scored text");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
