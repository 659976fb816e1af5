use axum::{Router, extract::State, http::StatusCode, routing::post};
use axum_extra::extract::PrivateCookieJar;
use n7_db::models::UserProfile;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    cookies::{REFRESH_TOKEN_COOKIE, create_refresh_token_cookie, refresh_token_removal_cookie},
    jwt::TokenPair,
    middleware::AuthUser,
    refresh_token as rt, service,
};
use crate::{
    ApiState, error::ApiError, extract::Json, make_rate_limit_layer,
    metrics::record_auth_event, middleware::rate_limit,
};

pub fn routes() -> Router<ApiState> {
    // Credential endpoints get the strict limit
    let credential_routes = Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/refresh", post(refresh))
        .layer(make_rate_limit_layer!(
            rate_limit::AUTH_RATE_PER_SECOND,
            rate_limit::AUTH_BURST_SIZE
        ));

    let session_routes = Router::new()
        .route("/auth/logout", post(logout))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ));

    Router::new().merge(credential_routes).merge(session_routes)
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserProfile,
}

async fn signup(
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, PrivateCookieJar, Json<SignupResponse>), ApiError> {
    let registration = match service::Registration::prepare(
        &payload.username,
        &payload.email,
        &payload.password,
        state.bcrypt_cost,
    )
    .await
    {
        Ok(registration) => registration,
        Err(e) => {
            record_auth_event("signup", false);
            return Err(e);
        }
    };

    // The account only exists if its first refresh token was stored too
    let mut tx = state.pool.begin().await?;

    let user = match service::register_user(&mut *tx, &registration).await {
        Ok(user) => user,
        Err(e) => {
            record_auth_event("signup", false);
            return Err(e);
        }
    };

    let tokens =
        rt::issue_token_pair(&mut *tx, user.id, &user.email, user.role, &state.auth).await?;

    tx.commit().await?;

    record_auth_event("signup", true);
    tracing::info!(user_id = user.id, "User signed up");

    let jar = jar.add(create_refresh_token_cookie(
        tokens.refresh_token.clone(),
        &state.environment,
        state.auth.refresh_token_expiry_days,
    ));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(SignupResponse { tokens, user }),
    ))
}

async fn signin(
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
    Json(payload): Json<SigninRequest>,
) -> Result<(PrivateCookieJar, Json<TokenPair>), ApiError> {
    let user = match service::authenticate(&state.pool, &payload.email, &payload.password).await {
        Ok(user) => user,
        Err(e) => {
            record_auth_event("signin", false);
            return Err(e);
        }
    };

    let mut conn = state.pool.acquire().await?;
    let tokens = rt::issue_token_pair(&mut *conn, user.id, &user.email, user.role, &state.auth)
        .await?;

    record_auth_event("signin", true);
    tracing::info!(user_id = user.id, "User signed in");

    let jar = jar.add(create_refresh_token_cookie(
        tokens.refresh_token.clone(),
        &state.environment,
        state.auth.refresh_token_expiry_days,
    ));

    Ok((jar, Json(tokens)))
}

async fn logout(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<serde_json::Value>), ApiError> {
    let revoked = rt::revoke_all_user_tokens(&state.pool, auth_user.user_id).await?;

    record_auth_event("logout", true);
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");

    let jar = jar.remove(refresh_token_removal_cookie());

    Ok((
        jar,
        Json(json!({ "message": "Logged out successfully" })),
    ))
}

async fn refresh(
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<TokenPair>), ApiError> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| ApiError::Auth("No refresh token found".to_string()))?;

    let tokens = match rt::verify_and_rotate_refresh_token(&state.pool, &presented, &state.auth)
        .await
    {
        Ok(tokens) => tokens,
        Err(e) => {
            record_auth_event("refresh", false);
            return Err(e);
        }
    };

    record_auth_event("refresh", true);

    let jar = jar.add(create_refresh_token_cookie(
        tokens.refresh_token.clone(),
        &state.environment,
        state.auth.refresh_token_expiry_days,
    ));

    Ok((jar, Json(tokens)))
}
