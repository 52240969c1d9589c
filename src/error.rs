//! Typed failures surfaced by the inference pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Task;

/// Single structured failure for any pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required artifact is missing, unreadable, or structurally invalid.
    #[error("failed to initialise {artifact}: {reason}")]
    Initialization { artifact: PathBuf, reason: String },

    /// Normalized text could not be encoded against a vocabulary.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// A member's output does not have the shape its task requires.
    #[error("{task} model `{model}` produced an unexpected output: {reason}")]
    EnsembleShapeMismatch {
        task: Task,
        model: String,
        reason: String,
    },
}

impl PipelineError {
    pub fn init(artifact: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Initialization {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }

    pub fn shape(task: Task, model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnsembleShapeMismatch {
            task,
            model: model.into(),
            reason: reason.into(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
