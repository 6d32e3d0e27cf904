use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::info;
use uuid::Uuid;

use refuge_types::api::{ChangePasswordRequest, ChangePasswordResponse, Claims, LoginRequest, LoginResponse};
use refuge_types::models::Director;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentDirector;

/// Bearer tokens expire this long after issuance.
pub const TOKEN_TTL_HOURS: i64 = 24;

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Please provide username and password".to_string(),
        ));
    }

    // Unknown username and wrong password must be indistinguishable.
    let director = state
        .db
        .get_director_by_username(&req.username)
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&req.password, &director.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let director_id: Uuid = director
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow!("corrupt director id '{}': {}", director.id, e)))?;

    let token = create_token(&state.jwt_secret, director_id).map_err(ApiError::Internal)?;

    info!("Director {} logged in", director.username);

    Ok(Json(LoginResponse {
        token,
        director: Director {
            id: director_id,
            username: director.username,
        },
    }))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentDirector>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::Validation(
            "Please provide old and new passwords".to_string(),
        ));
    }

    // Reload the row; the middleware only proved the director exists.
    let director = state
        .db
        .get_director_by_id(&current.id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::Unauthorized("Director not found"))?;

    if !verify_password(&req.old_password, &director.password)? {
        return Err(ApiError::InvalidOldPassword);
    }

    let new_hash = hash_password(&req.new_password).map_err(ApiError::Internal)?;
    state
        .db
        .update_director_password(&director.id, &new_hash)
        .map_err(ApiError::Internal)?;

    info!("Director {} changed their password", director.username);

    Ok((
        StatusCode::OK,
        Json(ChangePasswordResponse {
            message: "Password changed successfully".to_string(),
        }),
    ))
}

/// Hash-on-set: every path that assigns a password goes through here, so a
/// plaintext can never reach the store.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// A malformed stored hash is an internal fault, not a wrong password.
fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(anyhow!("corrupt password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn create_token(secret: &str, director_id: Uuid) -> anyhow::Result<String> {
    let claims = Claims {
        sub: director_id,
        exp: (chrono::Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    // Expiry is exact: no clock-skew leeway.
    let mut validation = Validation::default();
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| ApiError::Unauthorized("Not authorized, token failed"))?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("yosii123").unwrap();
        assert_ne!(hash, "yosii123");
        assert!(verify_password("yosii123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn corrupt_stored_hash_is_an_internal_error() {
        assert!(verify_password("whatever", "not-a-phc-string").is_err());
    }

    #[test]
    fn token_round_trip() {
        let id = Uuid::new_v4();
        let token = create_token("secret", id).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, id);
    }

    #[test]
    fn token_signed_with_wrong_key_is_rejected() {
        let token = create_token("secret", Uuid::new_v4()).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp: (chrono::Utc::now() - chrono::Duration::seconds(5)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not.a.jwt", "secret").is_err());
        assert!(verify_token("", "secret").is_err());
    }
}
