use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;

use super::{api_error, ApiResult};
use crate::api::state::AppState;
use crate::domain::OperationalReport;
use crate::services::CycleOutcome;

const GENERATE_LIMIT_KEY: &str = "reports/generate";

/// GET /api/reports/latest
pub async fn get_latest_report(State(state): State<AppState>) -> ApiResult<Json<OperationalReport>> {
    match state.cycle.reports().latest().await.map_err(api_error)? {
        Some(report) => Ok(Json(report)),
        None => Err((StatusCode::NOT_FOUND, "no report generated yet".to_string())),
    }
}

/// POST /api/reports/generate
///
/// Runs one report cycle now. The outcome is returned even when the cycle
/// degraded.
pub async fn generate_report(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<CycleOutcome>> {
    state.auth.ensure_authorized(&headers)?;

    let now = Utc::now();
    if let Err(wait) = state.generate_limiter.check(GENERATE_LIMIT_KEY, now) {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            format!("report generation cooling down, retry in {}s", wait.num_seconds().max(1)),
        ));
    }

    Ok(Json(state.cycle.run_tick(now).await))
}
