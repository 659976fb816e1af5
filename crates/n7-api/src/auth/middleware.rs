use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use n7_db::models::Role;

use super::{cookies::ACCESS_TOKEN_COOKIE, jwt::verify_access_token};
use crate::{error::ApiError, state::AuthConfig};

/// Authenticated caller
///
/// The access token is read from `Authorization: Bearer <jwt>`, falling back
/// to the `access-token` cookie. Signature and expiry are always verified.
///
/// # Example
/// ```
/// use n7_api::{ApiError, auth::AuthUser};
/// use n7_db::models::Role;
///
/// async fn seller_only(auth_user: AuthUser) -> Result<(), ApiError> {
///     auth_user.require_role(&[Role::Vendeur, Role::Admin])?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// 403 unless the caller holds one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            return Ok(());
        }

        let required = roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Err(ApiError::Forbidden(format!(
            "Access denied. Required roles: {required}. Your role: {}",
            self.role
        )))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 403 unless the caller is `owner_id` or an admin
    pub fn require_self_or_admin(&self, owner_id: i64, message: &str) -> Result<(), ApiError> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(message.to_string()))
        }
    }
}

fn access_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

fn authenticate(token: &str, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let claims = verify_access_token(token, config)?;

    if claims.email.is_empty() {
        return Err(ApiError::Auth("Invalid token payload".to_string()));
    }

    Ok(AuthUser {
        user_id: claims.user_id()?,
        role: claims.role(),
        email: claims.email,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);
        let token =
            access_token(parts).ok_or_else(|| ApiError::Auth("Not authenticated".to_string()))?;

        authenticate(&token, &config)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let config = AuthConfig::from_ref(state);
        access_token(parts)
            .map(|token| authenticate(&token, &config))
            .transpose()
    }
}

/// Caller that may be anonymous; a present but invalid token is still rejected
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        <AuthUser as OptionalFromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map(MaybeAuthUser)
    }
}
