use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::AppState;
use crate::auth;
use crate::error::ApiError;

/// The verified principal, attached to the request for protected handlers.
#[derive(Debug, Clone)]
pub struct CurrentDirector {
    pub id: Uuid,
    pub username: String,
}

/// Extract and validate the bearer token, then check the director still
/// exists. On any failure the inner handler is never invoked.
pub async fn require_director(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized("No token, authorization denied"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized("No token, authorization denied"))?;

    let claims = auth::verify_token(token, &state.jwt_secret)?;

    // Defensive: the id inside a valid token may no longer resolve.
    let director = state
        .db
        .get_director_by_id(&claims.sub.to_string())
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::Unauthorized("Director not found"))?;

    req.extensions_mut().insert(CurrentDirector {
        id: claims.sub,
        username: director.username,
    });
    Ok(next.run(req).await)
}
