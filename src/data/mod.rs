//! Persistence collaborator for scored submissions.

pub mod store;

pub use store::{PredictionRecord, PredictionStore, Submission};
