//! Admin token guard for mutating endpoints
//!
//! The token is sent as `x-ecosentry-admin-token` or `Authorization: Bearer`.
//! Only its SHA-256 fingerprint is kept in memory.

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use sha2::{Digest, Sha256};

pub const ADMIN_TOKEN_HEADER: &str = "x-ecosentry-admin-token";

pub fn admin_token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    hex::encode(hasher.finalize())
}

fn extract_bearer_token(raw: &str) -> Option<&str> {
    raw.strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .map(str::trim)
}

#[derive(Debug, Clone)]
pub struct AdminAuth {
    fingerprint: Option<String>,
    required: bool,
}

impl AdminAuth {
    pub fn new(token: Option<String>, required: bool) -> Self {
        let fingerprint = token
            .filter(|t| !t.trim().is_empty())
            .map(|t| admin_token_fingerprint(&t));
        Self {
            fingerprint,
            required,
        }
    }

    /// No token, not required: every request passes.
    pub fn open() -> Self {
        Self::new(None, false)
    }

    pub fn ensure_authorized(&self, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
        let Some(expected) = self.fingerprint.as_deref() else {
            if !self.required {
                return Ok(());
            }
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                "admin auth is required but api.admin_token is not configured".to_string(),
            ));
        };

        let token = headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .or_else(|| {
                headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(extract_bearer_token)
            });

        if token.is_some_and(|t| admin_token_fingerprint(t) == expected) {
            return Ok(());
        }

        Err((
            StatusCode::UNAUTHORIZED,
            "admin auth failed (missing/invalid token)".to_string(),
        ))
    }
}
