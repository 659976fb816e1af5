use axum::{Router, extract::State, routing::get};
use n7_db::{models::HistoryWithTour, repositories::history as history_repo};

use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    extract::Json,
    make_rate_limit_layer,
    middleware::rate_limit,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/history", get(my_history))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

/// Tours the caller has opened, most recent first
async fn my_history(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<Vec<HistoryWithTour>>, ApiError> {
    let history = history_repo::list_for_user(&state.pool, auth_user.user_id).await?;
    Ok(Json(history))
}
