//! Ensemble text screening for suicide-risk and emotion signals.
//!
//! Pre-fitted TF-IDF vocabularies and classifier ensembles are loaded once
//! into an immutable [`inference::InferenceContext`]; each request runs
//! normalize → encode → score → aggregate without touching shared state.

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod inference;
pub mod logging;
pub mod models;
pub mod nlp;

pub use error::{PipelineError, PipelineResult};
pub use inference::{AggregatedResult, InferencePipeline};
