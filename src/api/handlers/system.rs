use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{api_error, ApiResult};
use crate::api::state::AppState;
use crate::domain::{Alert, AlertSeverity, GovernorReport};
use crate::persistence::{keys, read_json};
use crate::services::{check_health, HealthResponse, HealthStatus};

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let health = check_health(&state.cycle, state.store.as_ref(), state.started_at, Utc::now()).await;
    let code = match health.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (code, Json(health))
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> ApiResult<Json<GovernorReport>> {
    state
        .governor()
        .generate_report(Utc::now())
        .await
        .map(Json)
        .map_err(api_error)
}

#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Only alerts at or above this severity
    pub min_severity: Option<AlertSeverity>,
}

/// GET /api/alerts
pub async fn get_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> Json<Vec<Alert>> {
    let status = state.governor().get_risk_status(Utc::now()).await;
    let alerts = status
        .alerts
        .into_iter()
        .filter(|a| query.min_severity.map_or(true, |min| a.severity() >= min))
        .collect();
    Json(alerts)
}

#[derive(Debug, Serialize)]
pub struct PendingReview {
    pub key: String,
    pub artifact: serde_json::Value,
}

/// GET /api/reviews/pending
pub async fn get_pending_reviews(State(state): State<AppState>) -> ApiResult<Json<Vec<PendingReview>>> {
    let store = state.store.as_ref();
    let keys = store.list(keys::REVIEW_PREFIX).await.map_err(api_error)?;

    let mut reviews = Vec::with_capacity(keys.len());
    for key in keys {
        match read_json::<serde_json::Value>(store, &key).await {
            Ok(Some(artifact)) => reviews.push(PendingReview { key, artifact }),
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable review artifact {}: {}", key, e),
        }
    }
    Ok(Json(reviews))
}
