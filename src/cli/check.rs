//! CLI entry-point for validating model artifacts.

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::{config::Settings, inference::InferencePipeline, models::Task};

#[instrument(skip(settings))]
pub async fn run(settings: Settings) -> Result<()> {
    let pipeline = InferencePipeline::load(&settings).context("loading inference artifacts")?;
    let context = pipeline.context();
    for task in [Task::Risk, Task::Emotion] {
        let members: Vec<&str> = context
            .ensemble()
            .members(task)
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        info!(%task, dimension = context.vectorizer(task).dimension(), ?members, "ensemble ok");
        println!(
            "{task}: {} features, {} models ({})",
            context.vectorizer(task).dimension(),
            members.len(),
            members.join(", ")
        );
    }
    Ok(())
}
