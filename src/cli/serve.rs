//! CLI entry-point for serving the HTTP API.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    api::{self, AppState},
    config::Settings,
    data::PredictionStore,
    inference::InferencePipeline,
};

/// Run the Axum server.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Port to bind (default 8000).
    #[arg(long, default_value_t = 8000)]
    pub port: u16,
    /// Host address, defaults to localhost.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    // Nothing binds until every artifact has loaded.
    let pipeline = InferencePipeline::load(&settings).context("loading inference artifacts")?;
    let store = PredictionStore::from_settings(&settings)?;
    api::serve(AppState::new(pipeline, store), args.host, args.port).await
}
