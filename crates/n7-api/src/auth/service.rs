use n7_db::{
    models::{Role, UserCredentials, UserProfile},
    repositories::user as user_repo,
};
use sqlx::{PgConnection, PgPool};

use super::validation::{validate_email, validate_password, validate_username};
use crate::error::{ApiError, map_user_write_error};

/// Hash a password on the blocking pool; bcrypt is deliberately slow
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("password verification task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Validated sign-up input with the password already hashed
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    password_hash: String,
}

impl Registration {
    /// Validate the fields and hash the password, before any connection is taken
    pub async fn prepare(
        username: &str,
        email: &str,
        password: &str,
        bcrypt_cost: u32,
    ) -> Result<Self, ApiError> {
        let username = username.trim();
        let email = email.trim();

        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password.to_string(), bcrypt_cost).await?;

        Ok(Self {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        })
    }
}

/// Create a TOURIST account
///
/// Takes a connection so the caller can issue the first tokens in the same transaction.
pub async fn register_user(
    conn: &mut PgConnection,
    registration: &Registration,
) -> Result<UserProfile, ApiError> {
    user_repo::create_user(
        conn,
        &registration.username,
        &registration.email,
        &registration.password_hash,
        Role::Tourist,
    )
    .await
    .map_err(map_user_write_error)
}

/// Check an email/password pair
///
/// Unknown email is a 404 and a wrong password a 403, as the booking
/// frontend tells the two cases apart.
pub async fn authenticate(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<UserCredentials, ApiError> {
    let user = user_repo::find_credentials_by_email(pool, email.trim())
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("User not found, please verify your log-in email".to_string())
        })?;

    if !verify_password(password.to_string(), user.password_hash.clone()).await? {
        return Err(ApiError::Forbidden(
            "Wrong password, access denied".to_string(),
        ));
    }

    Ok(user)
}
