use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use n7_db::models::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, state::AuthConfig};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    /// Tokens minted without a role are treated as TOURIST
    #[serde(default)]
    pub role: Option<Role>,
    pub iat: i64,
    pub exp: i64,
    /// Makes two tokens issued in the same second distinct
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, ApiError> {
        self.sub
            .parse()
            .map_err(|_| ApiError::Auth("Invalid user ID in token".to_string()))
    }

    pub fn role(&self) -> Role {
        self.role.unwrap_or(Role::Tourist)
    }
}

/// Access and refresh tokens handed to the client after sign-in
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn encode_token(
    user_id: i64,
    email: &str,
    role: Role,
    ttl: Duration,
    secret: &str,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: Some(role),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Short-lived bearer token
pub fn generate_access_token(
    user_id: i64,
    email: &str,
    role: Role,
    config: &AuthConfig,
) -> Result<String, ApiError> {
    encode_token(
        user_id,
        email,
        role,
        Duration::minutes(config.access_token_expiry_minutes),
        &config.access_token_secret,
    )
}

/// Long-lived token, signed with its own secret and only accepted by `/auth/refresh`
pub fn generate_refresh_token(
    user_id: i64,
    email: &str,
    role: Role,
    config: &AuthConfig,
) -> Result<String, ApiError> {
    encode_token(
        user_id,
        email,
        role,
        Duration::days(config.refresh_token_expiry_days),
        &config.refresh_token_secret,
    )
}

pub fn verify_access_token(token: &str, config: &AuthConfig) -> Result<Claims, ApiError> {
    decode_token(token, &config.access_token_secret)
        .map_err(|_| ApiError::Auth("Invalid or expired token".to_string()))
}

pub fn verify_refresh_token(token: &str, config: &AuthConfig) -> Result<Claims, ApiError> {
    decode_token(token, &config.refresh_token_secret)
        .map_err(|_| ApiError::Auth("Invalid or expired refresh token".to_string()))
}
