//! Structured errors for the proxy dispatcher.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use hoard_core::Error;

/// Errors a proxied request can end with.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No `url` query parameter was supplied.
    #[error("MISSING_TARGET")]
    MissingTarget,

    /// The `url` query parameter could not be used as a target.
    #[error("INVALID_TARGET: {0}")]
    InvalidTarget(String),

    /// The cache or the origin failed.
    #[error(transparent)]
    Fetch(#[from] Error),

    /// The fetch task ended without producing a result.
    #[error("TASK_FAILED: {0}")]
    Task(String),
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        match &self {
            DispatchError::MissingTarget => {
                tracing::debug!("request without target url");
                return (StatusCode::NOT_FOUND, [(header::CONNECTION, "close")]).into_response();
            }
            DispatchError::InvalidTarget(msg) => {
                tracing::debug!(reason = %msg, "rejected target url");
                return (StatusCode::BAD_REQUEST, self.to_string()).into_response();
            }
            DispatchError::Fetch(Error::Origin(msg)) => {
                tracing::warn!(error = %msg, "origin fetch failed");
            }
            DispatchError::Fetch(e) => tracing::error!(error = %e, "cache failure"),
            DispatchError::Task(msg) => tracing::error!(error = %msg, "fetch task failed"),
        }

        let status = match &self {
            DispatchError::Fetch(Error::Origin(_)) => StatusCode::BAD_GATEWAY,
            DispatchError::Fetch(Error::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_target_is_empty_404() {
        let response = DispatchError::MissingTarget.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get(header::CONNECTION).unwrap(), "close");
    }

    #[test]
    fn test_status_mapping() {
        let origin = DispatchError::from(Error::Origin("refused".into())).into_response();
        assert_eq!(origin.status(), StatusCode::BAD_GATEWAY);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let storage = DispatchError::from(Error::Storage(io)).into_response();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let invalid = DispatchError::InvalidTarget("empty URL".into()).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
