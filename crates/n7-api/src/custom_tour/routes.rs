use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::Utc;
use n7_booking::schedule::{TripWindow, build_schedules, first_free_guide};
use n7_db::{
    models::{CustomTourWithGuide, CustomTourWrite, Role},
    repositories::custom_tour as custom_tour_repo,
};
use serde_json::json;
use sqlx::PgConnection;

use super::model::{CreateCustomTourRequest, UpdateCustomTourRequest};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    extract::{Json, Path},
    make_rate_limit_layer,
    middleware::rate_limit,
};

const CUSTOM_TOUR_CREATORS: &[Role] = &[Role::Tourist, Role::Vendeur, Role::Admin];

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route(
            "/custom-tours",
            get(list_custom_tours).post(create_custom_tour),
        )
        .route("/custom-tours/assigned", get(assigned_custom_tours))
        .route(
            "/custom-tours/{id}",
            get(get_custom_tour)
                .patch(update_custom_tour)
                .delete(delete_custom_tour),
        )
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

fn custom_tour_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Custom tour with ID {id} not found"))
}

/// First guide with no trip overlapping `window`
///
/// Every guide row stays locked until the transaction ends, so two trips
/// cannot grab the same guide for overlapping dates.
async fn find_free_guide(
    conn: &mut PgConnection,
    window: &TripWindow,
    excluding: Option<i64>,
) -> Result<Option<i64>, ApiError> {
    let guide_ids = custom_tour_repo::lock_guides(&mut *conn).await?;
    let commitments = custom_tour_repo::guide_commitments(&mut *conn, excluding).await?;

    let schedules = build_schedules(
        &guide_ids,
        commitments.into_iter().map(|c| {
            (
                c.guide_id,
                TripWindow {
                    start: c.departure_date,
                    end: c.return_date,
                },
            )
        }),
    );

    Ok(first_free_guide(&schedules, window))
}

fn trip_window(tour: &CustomTourWrite) -> Result<TripWindow, ApiError> {
    Ok(TripWindow::new(tour.departure_date, tour.return_date)?)
}

/// Book a custom trip; a guide is attached when one is free for the whole stay
async fn create_custom_tour(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<CreateCustomTourRequest>,
) -> Result<(StatusCode, Json<CustomTourWithGuide>), ApiError> {
    auth_user.require_role(CUSTOM_TOUR_CREATORS)?;

    let mut write = payload.into_write(Utc::now())?;

    let mut tx = state.pool.begin().await?;

    let guide_id = if write.with_guide {
        find_free_guide(&mut *tx, &trip_window(&write)?, None).await?
    } else {
        None
    };
    if write.with_guide && guide_id.is_none() {
        tracing::info!(user_id = auth_user.user_id, "No guide free for the requested dates");
    }
    write.with_guide = guide_id.is_some();

    let custom_tour =
        custom_tour_repo::create_custom_tour(&mut *tx, auth_user.user_id, &write).await?;
    if let Some(guide_id) = guide_id {
        custom_tour_repo::assign_guide(&mut *tx, guide_id, custom_tour.id).await?;
    }

    tx.commit().await?;

    tracing::info!(
        custom_tour_id = custom_tour.id,
        user_id = auth_user.user_id,
        guide_id,
        "Custom tour created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CustomTourWithGuide {
            custom_tour,
            guide_id,
        }),
    ))
}

/// Admins see every custom tour, everyone else their own
async fn list_custom_tours(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<Vec<CustomTourWithGuide>>, ApiError> {
    let tours = if auth_user.is_admin() {
        custom_tour_repo::list_all(&state.pool).await?
    } else {
        custom_tour_repo::list_for_user(&state.pool, auth_user.user_id).await?
    };
    Ok(Json(tours))
}

async fn assigned_custom_tours(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<Vec<CustomTourWithGuide>>, ApiError> {
    auth_user.require_role(&[Role::Guide])?;

    let tours = custom_tour_repo::list_for_guide(&state.pool, auth_user.user_id).await?;
    Ok(Json(tours))
}

/// Visible to its owner, its guide and admins
async fn get_custom_tour(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<CustomTourWithGuide>, ApiError> {
    let tour = custom_tour_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| custom_tour_not_found(id))?;

    if tour.guide_id != Some(auth_user.user_id) {
        auth_user.require_self_or_admin(
            tour.custom_tour.user_id,
            "You can only view your own custom tours",
        )?;
    }

    Ok(Json(tour))
}

/// Rescheduling or asking for a guide again re-runs the assignment
async fn update_custom_tour(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCustomTourRequest>,
) -> Result<Json<CustomTourWithGuide>, ApiError> {
    let mut tx = state.pool.begin().await?;

    let existing = custom_tour_repo::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| custom_tour_not_found(id))?;
    auth_user.require_self_or_admin(
        existing.user_id,
        "You can only manage your own custom tours",
    )?;

    let had_guide = existing.with_guide;
    let current = CustomTourWrite::from(existing);
    let mut merged = payload.apply(current.clone(), Utc::now())?;

    let rescheduled = merged.departure_date != current.departure_date
        || merged.return_date != current.return_date;

    let guide_id = if !merged.with_guide {
        custom_tour_repo::release_guide(&mut *tx, id).await?;
        None
    } else if rescheduled || !had_guide {
        custom_tour_repo::release_guide(&mut *tx, id).await?;
        let guide_id = find_free_guide(&mut *tx, &trip_window(&merged)?, Some(id)).await?;
        if let Some(guide_id) = guide_id {
            custom_tour_repo::assign_guide(&mut *tx, guide_id, id).await?;
        }
        guide_id
    } else {
        custom_tour_repo::find_by_id(&mut *tx, id)
            .await?
            .and_then(|tour| tour.guide_id)
    };
    merged.with_guide = guide_id.is_some();

    let custom_tour = custom_tour_repo::update_custom_tour(&mut *tx, id, &merged)
        .await?
        .ok_or_else(|| custom_tour_not_found(id))?;

    tx.commit().await?;

    tracing::info!(custom_tour_id = id, guide_id, "Custom tour updated");

    Ok(Json(CustomTourWithGuide {
        custom_tour,
        guide_id,
    }))
}

/// Refused once the trip has been paid for
async fn delete_custom_tour(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut tx = state.pool.begin().await?;

    let existing = custom_tour_repo::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| custom_tour_not_found(id))?;
    auth_user.require_self_or_admin(
        existing.user_id,
        "You can only manage your own custom tours",
    )?;

    if custom_tour_repo::count_completed_payments(&mut *tx, id).await? > 0 {
        return Err(ApiError::BadRequest(
            "Cannot delete a custom tour that has already been paid for".to_string(),
        ));
    }

    if !custom_tour_repo::delete_custom_tour(&mut *tx, id).await? {
        return Err(custom_tour_not_found(id));
    }

    tx.commit().await?;

    tracing::info!(custom_tour_id = id, "Custom tour deleted");

    Ok(Json(json!({ "message": "Custom tour deleted successfully" })))
}
