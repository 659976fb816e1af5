use axum::{
    Router,
    extract::State,
    routing::{delete, get},
};
use n7_db::{
    models::{Role, UserProfile},
    repositories::user as user_repo,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    ApiState,
    extract::{Json, Path, Query},
    auth::{
        AuthUser,
        validation::{validate_email, validate_username},
    },
    error::{ApiError, map_user_write_error},
    make_rate_limit_layer,
    middleware::rate_limit,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/users", get(list_users).patch(update_profile))
        .route("/users/profile", get(get_profile))
        .route("/users/{id}", delete(delete_user))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Public user listing, optionally filtered by `?role=`
async fn list_users(
    State(state): State<ApiState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = user_repo::list_profiles(&state.pool, query.role).await?;
    Ok(Json(users))
}

async fn get_profile(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = user_repo::find_profile_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

async fn update_profile(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let username = payload.username.as_deref().map(str::trim);
    let email = payload.email.as_deref().map(str::trim);

    if let Some(username) = username {
        validate_username(username)?;
    }
    if let Some(email) = email {
        validate_email(email)?;
    }

    let user = user_repo::update_profile(&state.pool, auth_user.user_id, username, email)
        .await
        .map_err(map_user_write_error)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = user.id, "Profile updated");

    Ok(Json(user))
}

/// Delete an account; allowed for the account owner and admins
async fn delete_user(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth_user.require_self_or_admin(id, "You can only delete your own account")?;

    let deleted = user_repo::delete_user(&state.pool, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = id, deleted_by = auth_user.user_id, "User deleted");

    Ok(Json(json!({ "message": "User deleted successfully", "id": id })))
}
