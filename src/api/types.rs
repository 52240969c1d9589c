//! Shared DTOs for JSON requests and responses.

use serde::{Deserialize, Serialize};

use crate::data::PredictionRecord;

pub use crate::data::Submission as PredictRequest;

#[derive(Debug, Clone, Serialize)]
pub struct UsersDto {
    pub users: Vec<PredictionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub risk_models: usize,
    pub emotion_models: usize,
    pub risk_threshold: Option<f64>,
}

fn default_interval() -> i64 {
    60
}

/// Look-back window for dashboard rollups, in minutes.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    #[serde(default = "default_interval")]
    pub time_interval: i64,
}
