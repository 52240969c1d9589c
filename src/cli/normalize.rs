//! CLI entry-point for inspecting text normalization.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{config::Settings, nlp::TextNormalizer};

/// Args for the `normalize` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Text to normalize.
    #[arg(long)]
    pub text: String,
}

#[instrument(skip_all)]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let normalizer = TextNormalizer::from_settings(&settings)?;
    println!("{}", normalizer.normalize(&args.text));
    Ok(())
}
