use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use anyhow::anyhow;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use carelink_db::Database;
use carelink_gateway::{AuditLedger, SmsGateway};
use carelink_types::api::{Claims, LoginRequest, RegisterRequest, TokenResponse};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub sms: Arc<dyn SmsGateway>,
    pub audit: Option<Arc<AuditLedger>>,
}

const MIN_NAME_CHARS: usize = 2;
const MIN_PASSWORD_CHARS: usize = 6;

/// Hard cap on password input fed to the hash. Longer inputs are truncated
/// on a char boundary before hashing, applied identically on registration
/// and login so verification stays deterministic.
const MAX_PASSWORD_BYTES: usize = 72;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input before touching storage
    if req.name.trim().chars().count() < MIN_NAME_CHARS {
        return Err(ApiError::Validation(format!(
            "name must be at least {} characters",
            MIN_NAME_CHARS
        )));
    }
    if !looks_like_email(&req.email) {
        return Err(ApiError::Validation("invalid email address".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }

    // Exact-match duplicate check
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::DuplicateEmail);
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(truncate_password(&req.password).as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();
    // The pre-check above and this insert are separate commits, so a racing
    // registration can still hit the UNIQUE constraint here
    state
        .db
        .create_user(&user_id.to_string(), req.name.trim(), &req.email, &password_hash)
        .map_err(|e| {
            if carelink_db::is_unique_violation(&e) {
                ApiError::DuplicateEmail
            } else {
                ApiError::Internal(e)
            }
        })?;

    let token = create_token(&state.jwt_secret, user_id, &req.email)?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token: token,
            token_type: "bearer".to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // One error for unknown email and wrong password, so the endpoint
    // cannot be used to enumerate accounts
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| ApiError::Internal(anyhow!("stored password hash is corrupt: {}", e)))?;

    Argon2::default()
        .verify_password(truncate_password(&req.password).as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow!("corrupt user id '{}': {}", user.id, e)))?;

    let token = create_token(&state.jwt_secret, user_id, &user.email)?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

pub fn create_token(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn truncate_password(password: &str) -> &str {
    if password.len() <= MAX_PASSWORD_BYTES {
        return password;
    }
    let mut end = MAX_PASSWORD_BYTES;
    while !password.is_char_boundary(end) {
        end -= 1;
    }
    &password[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn token_round_trips_to_same_identity() {
        let user_id = Uuid::new_v4();
        let token = create_token("test-secret", user_id, "worker@clinic.org").unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(data.claims.sub, user_id);
        assert_eq!(data.claims.email, "worker@clinic.org");
    }

    #[test]
    fn token_fails_with_wrong_secret() {
        let token = create_token("test-secret", Uuid::new_v4(), "worker@clinic.org").unwrap();
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other-secret"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn password_truncation_is_deterministic() {
        let long = "a".repeat(100);
        assert_eq!(truncate_password(&long), truncate_password(&long));
        assert_eq!(truncate_password(&long).len(), MAX_PASSWORD_BYTES);

        let short = "hunter2";
        assert_eq!(truncate_password(short), short);

        // Never splits a multibyte char
        let multibyte = "p".repeat(71) + "é";
        let cut = truncate_password(&multibyte);
        assert!(cut.len() <= MAX_PASSWORD_BYTES);
        assert!(multibyte.starts_with(cut));
    }

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("worker@clinic.org"));
        assert!(!looks_like_email("worker"));
        assert!(!looks_like_email("@clinic.org"));
        assert!(!looks_like_email("worker@nodot"));
    }
}
