use std::collections::HashMap;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use n7_booking::tour::{PriceRange, append_images, remove_images};
use n7_db::{
    models::{ReviewWithContext, Role, Tour, TourImages, TourListing, TourSearch, TourWrite},
    repositories::{
        history as history_repo, payment as payment_repo, review as review_repo,
        tour as tour_repo,
    },
};

use super::model::{
    CreateTourRequest, SellerTour, TourFilters, TourImagesRequest, UpdateTourRequest,
    validate_image_urls,
};
use crate::{
    ApiState,
    auth::{AuthUser, MaybeAuthUser},
    error::ApiError,
    extract::{Json, Path, Query},
    make_rate_limit_layer,
    middleware::rate_limit,
};

const TOUR_MANAGERS: &[Role] = &[Role::Vendeur, Role::Admin];

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/tours", get(list_tours).post(create_tour))
        .route(
            "/tours/{id}",
            get(get_tour).patch(update_tour).delete(delete_tour),
        )
        .route("/tours/seller/{seller_id}", get(seller_tours))
        .route(
            "/tours/{id}/images",
            post(add_images).delete(remove_tour_images),
        )
        .route("/tours/{id}/reviews", get(tour_reviews))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

fn tour_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Tour with ID {id} not found"))
}

/// Sellers manage their own tours, admins manage all of them
fn ensure_can_manage(auth_user: &AuthUser, tour: &Tour) -> Result<(), ApiError> {
    auth_user.require_role(TOUR_MANAGERS)?;
    if auth_user.is_admin() || tour.seller_id == Some(auth_user.user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You can only manage your own tours".to_string(),
        ))
    }
}

async fn create_tour(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<CreateTourRequest>,
) -> Result<(StatusCode, Json<Tour>), ApiError> {
    auth_user.require_role(TOUR_MANAGERS)?;

    let tour = payload.into_write(Utc::now())?;
    let tour = tour_repo::create_tour(&state.pool, auth_user.user_id, &tour).await?;

    tracing::info!(tour_id = tour.id, seller_id = auth_user.user_id, "Tour created");

    Ok((StatusCode::CREATED, Json(tour)))
}

async fn update_tour(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTourRequest>,
) -> Result<Json<Tour>, ApiError> {
    auth_user.require_role(TOUR_MANAGERS)?;

    // The row stays locked until commit so a concurrent seat decrement is not overwritten
    let mut tx = state.pool.begin().await?;

    let existing = tour_repo::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| tour_not_found(id))?;
    ensure_can_manage(&auth_user, &existing)?;

    let merged = payload.apply(TourWrite::from(existing), Utc::now())?;
    let tour = tour_repo::update_tour(&mut *tx, id, &merged)
        .await?
        .ok_or_else(|| tour_not_found(id))?;

    tx.commit().await?;

    tracing::info!(tour_id = id, "Tour updated");

    Ok(Json(tour))
}

/// Admin only; refused while completed bookings reference the tour
async fn delete_tour(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Tour>, ApiError> {
    auth_user.require_role(&[Role::Admin])?;

    let mut tx = state.pool.begin().await?;

    if !tour_repo::exists(&mut *tx, id).await? {
        return Err(tour_not_found(id));
    }

    if tour_repo::count_completed_payments(&mut *tx, id).await? > 0 {
        return Err(ApiError::BadRequest(
            "Cannot delete tour with existing bookings. Please contact customers first."
                .to_string(),
        ));
    }

    let tour = tour_repo::delete_tour(&mut *tx, id)
        .await?
        .ok_or_else(|| tour_not_found(id))?;

    tx.commit().await?;

    tracing::info!(tour_id = id, "Tour deleted");

    Ok(Json(tour))
}

async fn seller_tours(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(seller_id): Path<i64>,
) -> Result<Json<Vec<SellerTour>>, ApiError> {
    auth_user.require_role(TOUR_MANAGERS)?;

    let tours = tour_repo::list_by_seller(&state.pool, seller_id).await?;
    let tour_ids = tours.iter().map(|t| t.id).collect::<Vec<_>>();

    let mut payments_by_tour: HashMap<i64, Vec<_>> = HashMap::new();
    for payment in payment_repo::list_for_tours(&state.pool, &tour_ids).await? {
        if let Some(tour_id) = payment.payment.tour_id {
            payments_by_tour.entry(tour_id).or_default().push(payment);
        }
    }

    let tours = tours
        .into_iter()
        .map(|tour| SellerTour {
            payments: payments_by_tour.remove(&tour.id).unwrap_or_default(),
            tour,
        })
        .collect();

    Ok(Json(tours))
}

/// Public listing of bookable tours
async fn list_tours(
    State(state): State<ApiState>,
    Query(filters): Query<TourFilters>,
) -> Result<Json<Vec<TourListing>>, ApiError> {
    let price_range = PriceRange::new(filters.min_price, filters.max_price)?;

    let search = TourSearch {
        departure_location: filters.departure_location.filter(|s| !s.trim().is_empty()),
        destination_location: filters.destination_location.filter(|s| !s.trim().is_empty()),
        category: filters.category.filter(|s| !s.trim().is_empty()),
        trip_type: filters.trip_type,
        with_seats_only: filters.availability.unwrap_or(false),
        departure_from: filters.departure_date,
        return_until: filters.return_date,
        min_price: price_range.min,
        max_price: price_range.max,
    };

    let tours = tour_repo::search(&state.pool, &search).await?;
    Ok(Json(tours))
}

/// Tour details; signed-in visitors get the view added to their history
async fn get_tour(
    MaybeAuthUser(auth_user): MaybeAuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Tour>, ApiError> {
    let tour = tour_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| tour_not_found(id))?;

    if let Some(user) = auth_user {
        if let Err(e) = history_repo::record_view(&state.pool, user.user_id, id).await {
            tracing::warn!(user_id = user.user_id, tour_id = id, "Failed to record tour view: {e}");
        }
    }

    Ok(Json(tour))
}

async fn add_images(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<TourImagesRequest>,
) -> Result<Json<TourImages>, ApiError> {
    auth_user.require_role(TOUR_MANAGERS)?;

    if payload.image_urls.is_empty() {
        return Err(ApiError::Validation(
            "At least one image is required".to_string(),
        ));
    }
    validate_image_urls(&payload.image_urls)?;

    let mut tx = state.pool.begin().await?;

    let tour = tour_repo::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| tour_not_found(id))?;
    ensure_can_manage(&auth_user, &tour)?;

    let images = append_images(&tour.images, &payload.image_urls);
    let updated = tour_repo::set_images(&mut *tx, id, &images)
        .await?
        .ok_or_else(|| tour_not_found(id))?;

    tx.commit().await?;

    Ok(Json(updated))
}

async fn remove_tour_images(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<TourImagesRequest>,
) -> Result<Json<TourImages>, ApiError> {
    auth_user.require_role(TOUR_MANAGERS)?;

    if payload.image_urls.is_empty() {
        return Err(ApiError::Validation(
            "At least one image URL is required".to_string(),
        ));
    }

    let mut tx = state.pool.begin().await?;

    let tour = tour_repo::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| tour_not_found(id))?;
    ensure_can_manage(&auth_user, &tour)?;

    let images = remove_images(&tour.images, &payload.image_urls);
    let updated = tour_repo::set_images(&mut *tx, id, &images)
        .await?
        .ok_or_else(|| tour_not_found(id))?;

    tx.commit().await?;

    Ok(Json(updated))
}

async fn tour_reviews(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ReviewWithContext>>, ApiError> {
    if !tour_repo::exists(&state.pool, id).await? {
        return Err(tour_not_found(id));
    }

    let reviews = review_repo::list_for_tour(&state.pool, id).await?;
    Ok(Json(reviews))
}
