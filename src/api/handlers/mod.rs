mod governance;
mod reports;
mod system;

pub use governance::*;
pub use reports::*;
pub use system::*;

use axum::http::StatusCode;
use tracing::error;

use crate::error::SentryError;

pub type ApiResult<T> = std::result::Result<T, (StatusCode, String)>;

pub(crate) fn api_error(err: SentryError) -> (StatusCode, String) {
    let status = match &err {
        SentryError::NotFound(_) => StatusCode::NOT_FOUND,
        SentryError::Validation(_) => StatusCode::BAD_REQUEST,
        SentryError::AlreadyExists(_) | SentryError::InvalidStateTransition { .. } => {
            StatusCode::CONFLICT
        }
        SentryError::SourceUnavailable { .. } | SentryError::Timeout(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("API request failed: {}", err);
    }
    (status, err.to_string())
}
