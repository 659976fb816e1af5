use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::Environment;

/// Encrypted cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refresh-token";

/// Plain cookie some clients use to carry the access token instead of a bearer header
pub const ACCESS_TOKEN_COOKIE: &str = "access-token";

/// Secure everywhere but development, so local HTTP keeps working
pub fn create_refresh_token_cookie(
    token: String,
    environment: &Environment,
    expiry_days: i64,
) -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, token))
        .path("/")
        .max_age(time::Duration::days(expiry_days))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(!environment.is_development())
        .build()
}

/// Cookie matching the refresh cookie's name and path, for removal
pub fn refresh_token_removal_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, "")).path("/").build()
}
