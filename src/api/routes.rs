//! HTTP route handlers for Axum.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::{
    api::types::{HealthDto, PredictRequest, UsersDto, WindowQuery},
    data::store::{self, EmotionCount, SectorRisk},
    inference::{AggregatedResult, AggregationPolicy},
    models::Task,
};

use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn internal(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> ApiResult<AggregatedResult> {
    let result = state.pipeline.run(&request.text).map_err(|err| {
        warn!(%err, "prediction failed");
        internal(err)
    })?;
    let record = state.store.insert(&request, &result).map_err(internal)?;
    info!(id = record.id, prediction = %result.risk_label, emotion = %result.emotion_label, "stored prediction");
    Ok(Json(result))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<UsersDto> {
    let users = state.store.all().map_err(internal)?;
    Ok(Json(UsersDto { users }))
}

pub async fn emotions_over_time(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Vec<EmotionCount>> {
    let since = window_start(&query)?;
    let records = state.store.all().map_err(internal)?;
    Ok(Json(store::emotion_counts(&records, since)))
}

pub async fn sentiment_by_sector(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Vec<SectorRisk>> {
    let since = window_start(&query)?;
    let records = state.store.all().map_err(internal)?;
    Ok(Json(store::sector_risk(&records, since)))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthDto> {
    let context = state.pipeline.context();
    let risk_threshold = match context.risk_policy() {
        AggregationPolicy::MeanThreshold { threshold } => Some(threshold),
        AggregationPolicy::PluralityVote { .. } => None,
    };
    Json(HealthDto {
        status: "ok",
        risk_models: context.ensemble().len(Task::Risk),
        emotion_models: context.ensemble().len(Task::Emotion),
        risk_threshold,
    })
}

fn window_start(query: &WindowQuery) -> Result<DateTime<Utc>, (StatusCode, String)> {
    if query.time_interval <= 0 {
        warn!(time_interval = query.time_interval, "rejected rollup window");
        return Err((
            StatusCode::BAD_REQUEST,
            "time_interval must be a positive number of minutes".into(),
        ));
    }
    Duration::try_minutes(query.time_interval)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "time_interval is out of range".to_string(),
            )
        })
}
