//! Refresh token storage and rotation.
//!
//! Refresh tokens are JWTs signed with the refresh secret. Only their
//! SHA-256 digest is stored, one row per issued token; a token is usable
//! exactly once and is swapped for a new pair on every refresh.

use chrono::{Duration, Utc};
use n7_db::{models::Role, repositories::{token as token_repo, user as user_repo}};
use sha2::{Digest, Sha256};
use sqlx::{PgConnection, PgPool};

use super::jwt::{self, TokenPair};
use crate::{error::ApiError, state::AuthConfig};

/// Hex-encoded SHA-256 digest stored in place of the token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Mint an access/refresh pair and persist the refresh token's hash
pub async fn issue_token_pair(
    conn: &mut PgConnection,
    user_id: i64,
    email: &str,
    role: Role,
    config: &AuthConfig,
) -> Result<TokenPair, ApiError> {
    let access_token = jwt::generate_access_token(user_id, email, role, config)?;
    let refresh_token = jwt::generate_refresh_token(user_id, email, role, config)?;

    let expires_at = Utc::now() + Duration::days(config.refresh_token_expiry_days);
    token_repo::store_refresh_token(&mut *conn, user_id, &hash_token(&refresh_token), expires_at)
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Verify a presented refresh token, consume it and issue a new pair
///
/// Runs in one transaction with the token row locked, so a token can only
/// be rotated once. The new access token carries the user's current role.
pub async fn verify_and_rotate_refresh_token(
    pool: &PgPool,
    token: &str,
    config: &AuthConfig,
) -> Result<TokenPair, ApiError> {
    let claims = jwt::verify_refresh_token(token, config)?;
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;

    let record = token_repo::find_refresh_token_by_hash(&mut *tx, &hash_token(token))
        .await?
        .ok_or_else(|| ApiError::Forbidden("Access Denied".to_string()))?;

    if record.user_id != user_id {
        return Err(ApiError::Forbidden("Access Denied".to_string()));
    }

    token_repo::delete_refresh_token(&mut *tx, record.id).await?;

    if record.expires_at < Utc::now() {
        tx.commit().await?;
        return Err(ApiError::Auth("Refresh token expired".to_string()));
    }

    let user = user_repo::find_profile_by_id(&mut *tx, user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Access Denied".to_string()))?;

    let pair = issue_token_pair(&mut *tx, user.id, &user.email, user.role, config).await?;

    tx.commit().await?;

    Ok(pair)
}

/// Revoke every refresh token of a user (logout from all devices)
pub async fn revoke_all_user_tokens(pool: &PgPool, user_id: i64) -> Result<u64, ApiError> {
    Ok(token_repo::delete_all_user_refresh_tokens(pool, user_id).await?)
}
