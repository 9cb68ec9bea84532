use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// ApiError
///
/// The hard-failure taxonomy for every operation. Soft business outcomes
/// (duplicate headline, quota exhaustion, "no new tags") are NOT represented
/// here: those are 200 responses carrying a `Notice` body that the caller
/// must inspect.
#[derive(Debug, PartialEq)]
pub enum ApiError {
    /// Missing, malformed, expired or otherwise unusable credential. The
    /// response never reveals which of these it was.
    Unauthenticated,
    /// Valid credential, insufficient role or ownership.
    Forbidden,
    /// Referenced article/publisher/user/payment is absent.
    NotFound,
    /// Document store or payment processor unavailable. Not retried; fatal
    /// for the request.
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // One uniform body for every authentication failure.
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized Access"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            ApiError::Upstream(ref detail) => {
                // Detail is logged, never returned to the client.
                tracing::error!("upstream failure: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => ApiError::Upstream(other.to_string()),
        }
    }
}
