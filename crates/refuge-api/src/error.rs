use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Every business-rule failure the API surfaces. Handlers return this and
/// the boundary translates it to a status code plus a `{success, message}`
/// body; no failure path panics or crashes the process.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input the caller can correct.
    #[error("{0}")]
    Validation(String),

    /// Login failure. One message for unknown username and wrong password
    /// alike; the response must not reveal which part was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password rotation with a non-matching current password.
    #[error("Old password is incorrect")]
    InvalidOldPassword,

    /// Missing, malformed, expired, or mis-signed bearer token; or the
    /// token's director no longer exists.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Operation on a record that does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Store or other unexpected failure. The chain is logged; the client
    /// sees a generic message.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::InvalidOldPassword => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(err) => {
                error!("internal error: {err:#}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "success": false,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidOldPassword.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("no token").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("Report").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_the_resource() {
        assert_eq!(ApiError::NotFound("Report").to_string(), "Report not found");
    }
}
