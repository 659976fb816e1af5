use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use n7_booking::rating::{average_rating, parse_rating};
use n7_db::{
    models::{Review, ReviewWithContext},
    repositories::{review as review_repo, tour as tour_repo},
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgConnection;

use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    extract::{Json, Path},
    make_rate_limit_layer,
    middleware::rate_limit,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/reviews", get(list_reviews).post(create_review))
        .route("/reviews/{id}", delete(delete_review))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub tour_id: i64,
    /// Any JSON number; narrowed to a whole 1..=5 rating by the handler
    pub rating: f64,
    pub review: Option<String>,
}

fn already_reviewed() -> ApiError {
    ApiError::BadRequest("You have already reviewed this tour.".to_string())
}

/// Store the mean of the tour's ratings (0 without reviews) on the tour row
async fn refresh_tour_rating(conn: &mut PgConnection, tour_id: i64) -> Result<f64, ApiError> {
    let ratings = review_repo::ratings_for_tour(&mut *conn, tour_id).await?;
    let average = average_rating(&ratings);
    tour_repo::set_rating(&mut *conn, tour_id, average).await?;
    Ok(average)
}

async fn create_review(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let rating = parse_rating(payload.rating)?;

    let mut tx = state.pool.begin().await?;

    // Serializes rating updates for the tour
    tour_repo::lock_for_update(&mut *tx, payload.tour_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tour not found".to_string()))?;

    if review_repo::find_by_user_and_tour(&mut *tx, auth_user.user_id, payload.tour_id)
        .await?
        .is_some()
    {
        return Err(already_reviewed());
    }

    let text = payload
        .review
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty());

    let review = review_repo::create_review(
        &mut *tx,
        auth_user.user_id,
        payload.tour_id,
        rating,
        text,
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("reviews_user_tour_key") => {
            already_reviewed()
        }
        _ => ApiError::Database(e),
    })?;

    let average = refresh_tour_rating(&mut *tx, payload.tour_id).await?;

    tx.commit().await?;

    tracing::info!(
        review_id = review.id,
        tour_id = payload.tour_id,
        rating = average,
        "Review created"
    );

    Ok((StatusCode::CREATED, Json(review)))
}

async fn list_reviews(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ReviewWithContext>>, ApiError> {
    let reviews = review_repo::list_all_with_context(&state.pool).await?;
    Ok(Json(reviews))
}

/// Authors may delete their own reviews, admins any review
async fn delete_review(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let review = review_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    auth_user.require_self_or_admin(review.user_id, "You can only delete your own reviews")?;

    let mut tx = state.pool.begin().await?;

    tour_repo::lock_for_update(&mut *tx, review.tour_id).await?;

    if review_repo::delete_review(&mut *tx, id).await? == 0 {
        return Err(ApiError::NotFound("Review not found".to_string()));
    }

    refresh_tour_rating(&mut *tx, review.tour_id).await?;

    tx.commit().await?;

    tracing::info!(review_id = id, tour_id = review.tour_id, "Review deleted");

    Ok(Json(json!({ "message": "Review deleted successfully" })))
}
