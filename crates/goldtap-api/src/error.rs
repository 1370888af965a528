//! Error types for the Goldtap API server.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can
//! be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//!
//! Status mapping:
//!
//! | Variant | Status |
//! |---------|--------|
//! | `NotFound` | 404 |
//! | `Validation` | 400 |
//! | `InsufficientResource` | 400 |
//! | `StateConflict` | 409 |
//! | `RateLimited` | 429 |
//! | `Storage` | 503 |
//! | `Serialization` | 500 |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use goldtap_economy::EconomyError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request payload or path was invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// The player's balance or energy does not cover the action.
    #[error("insufficient resource: {0}")]
    InsufficientResource(String),

    /// The action is illegal in the row's current state.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// The caller exceeded a rate limit.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The data layer is unavailable or failed.
    #[error("storage error: {0}")]
    Storage(#[from] goldtap_db::DbError),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<EconomyError> for ApiError {
    fn from(err: EconomyError) -> Self {
        match err {
            EconomyError::InsufficientEnergy { .. } | EconomyError::InsufficientFunds { .. } => {
                Self::InsufficientResource(err.to_string())
            }
            EconomyError::MaxLevelReached { .. } | EconomyError::BoostAlreadyActive { .. } => {
                Self::StateConflict(err.to_string())
            }
        }
    }
}

impl ApiError {
    /// The HTTP status code this error maps to.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InsufficientResource(_) => StatusCode::BAD_REQUEST,
            Self::StateConflict(_) => StatusCode::CONFLICT,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "API request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goldtap_types::UpgradeTrack;

    #[test]
    fn economy_errors_map_to_their_statuses() {
        let cases = [
            (
                ApiError::from(EconomyError::InsufficientEnergy {
                    needed: 1,
                    available: 0,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(EconomyError::InsufficientFunds {
                    price: 500,
                    balance: 0,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(EconomyError::MaxLevelReached {
                    track: UpgradeTrack::Multitap,
                    level: 5,
                }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(EconomyError::BoostAlreadyActive {
                    remaining_seconds: 90,
                }),
                StatusCode::CONFLICT,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected);
        }
    }

    #[test]
    fn handler_errors_map_to_their_statuses() {
        assert_eq!(
            ApiError::NotFound(String::from("user 1")).status_code(),
            StatusCode::NOT_FOUND,
        );
        assert_eq!(
            ApiError::Validation(String::from("bad track")).status_code(),
            StatusCode::BAD_REQUEST,
        );
        assert_eq!(
            ApiError::RateLimited(String::from("tap limit")).status_code(),
            StatusCode::TOO_MANY_REQUESTS,
        );
    }
}
