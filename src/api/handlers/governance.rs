use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{api_error, ApiResult};
use crate::agents::PendingPause;
use crate::api::state::AppState;
use crate::domain::{CrossChainMessage, EmergencyState, EmergencyStatus, PauseDecision};
use crate::services::PreparedPause;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub verified: bool,
    pub messages_verified: u64,
}

/// POST /api/crosschain/verify
pub async fn verify_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(message): Json<CrossChainMessage>,
) -> ApiResult<Json<VerifyResponse>> {
    state.auth.ensure_authorized(&headers)?;

    let governor = state.governor();
    let verified = governor
        .verify_message(&message, Utc::now())
        .await
        .map_err(api_error)?;
    let messages_verified = governor.verified_message_count().await.map_err(api_error)?;
    Ok(Json(VerifyResponse {
        verified,
        messages_verified,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PrepareRequest {
    /// Contract to pause
    pub target: String,
    pub reason: String,
}

/// POST /api/emergency/prepare
///
/// Stores the proposal and pages every channel; the response carries the
/// per-destination delivery results.
pub async fn prepare_pause(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PrepareRequest>,
) -> ApiResult<(StatusCode, Json<PreparedPause>)> {
    state.auth.ensure_authorized(&headers)?;
    if req.target.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "target is required".to_string()));
    }

    let prepared = state
        .cycle
        .prepare_emergency_pause(req.target.trim(), &req.reason, Utc::now())
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(prepared)))
}

/// GET /api/emergency/proposals
pub async fn list_pending_pauses(State(state): State<AppState>) -> ApiResult<Json<Vec<PendingPause>>> {
    state
        .governor()
        .pending_pauses()
        .await
        .map(Json)
        .map_err(api_error)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyStatusResponse {
    pub status: EmergencyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<EmergencyState>,
}

/// GET /api/emergency/status
pub async fn get_emergency_status(
    State(state): State<AppState>,
) -> ApiResult<Json<EmergencyStatusResponse>> {
    let current = state.governor().emergency_state().await.map_err(api_error)?;
    Ok(Json(EmergencyStatusResponse {
        status: current.as_ref().map(|s| s.status).unwrap_or_default(),
        state: current,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: EmergencyStatus,
    pub operator: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// PUT /api/emergency/status
pub async fn set_emergency_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<Json<EmergencyState>> {
    state.auth.ensure_authorized(&headers)?;
    state
        .governor()
        .set_emergency_status(req.status, &req.operator, req.reason, Utc::now())
        .await
        .map(Json)
        .map_err(api_error)
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub decision: PauseDecision,
    pub authority: String,
}

/// POST /api/emergency/proposals/:key/resolve
pub async fn resolve_pause(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ResolveRequest>,
) -> ApiResult<Json<PendingPause>> {
    state.auth.ensure_authorized(&headers)?;
    state
        .governor()
        .resolve_pause(&key, req.decision, &req.authority, Utc::now())
        .await
        .map(Json)
        .map_err(api_error)
}
