use sqlx::{Executor, Postgres};

use crate::models::{CustomTour, CustomTourWithGuide, CustomTourWrite, GuideCommitment};

const CUSTOM_TOUR_COLUMNS: &str = r#"
    id, user_id, guests, departure_date, return_date, departure_location,
    destination_location, country_id, city_id, hotel_id, room_id, transport_id,
    with_guide, duration, price, created_at, updated_at
"#;

// language=PostgreSQL
const WITH_GUIDE_SELECT: &str = r#"
    SELECT ct.*, gt.guide_id
    FROM custom_tours ct
    LEFT JOIN guide_tours gt ON gt.custom_tour_id = ct.id
"#;

pub async fn create_custom_tour<'e, E>(
    executor: E,
    user_id: i64,
    tour: &CustomTourWrite,
) -> Result<CustomTour, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            INSERT INTO custom_tours (
                user_id, guests, departure_date, return_date, departure_location,
                destination_location, country_id, city_id, hotel_id, room_id,
                transport_id, with_guide, duration, price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {CUSTOM_TOUR_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(user_id)
        .bind(tour.guests)
        .bind(tour.departure_date)
        .bind(tour.return_date)
        .bind(&tour.departure_location)
        .bind(&tour.destination_location)
        .bind(tour.country_id)
        .bind(tour.city_id)
        .bind(tour.hotel_id)
        .bind(tour.room_id)
        .bind(tour.transport_id)
        .bind(tour.with_guide)
        .bind(tour.duration)
        .bind(tour.price)
        .fetch_one(executor)
        .await
}

pub async fn update_custom_tour<'e, E>(
    executor: E,
    custom_tour_id: i64,
    tour: &CustomTourWrite,
) -> Result<Option<CustomTour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            UPDATE custom_tours
            SET guests = $2, departure_date = $3, return_date = $4,
                departure_location = $5, destination_location = $6, country_id = $7,
                city_id = $8, hotel_id = $9, room_id = $10, transport_id = $11,
                with_guide = $12, duration = $13, price = $14, updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOM_TOUR_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(custom_tour_id)
        .bind(tour.guests)
        .bind(tour.departure_date)
        .bind(tour.return_date)
        .bind(&tour.departure_location)
        .bind(&tour.destination_location)
        .bind(tour.country_id)
        .bind(tour.city_id)
        .bind(tour.hotel_id)
        .bind(tour.room_id)
        .bind(tour.transport_id)
        .bind(tour.with_guide)
        .bind(tour.duration)
        .bind(tour.price)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id<'e, E>(
    executor: E,
    custom_tour_id: i64,
) -> Result<Option<CustomTourWithGuide>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("{WITH_GUIDE_SELECT} WHERE ct.id = $1");
    sqlx::query_as(&sql)
        .bind(custom_tour_id)
        .fetch_optional(executor)
        .await
}

/// Fetch the custom tour and lock its row until the transaction ends
pub async fn find_by_id_for_update<'e, E>(
    executor: E,
    custom_tour_id: i64,
) -> Result<Option<CustomTour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {CUSTOM_TOUR_COLUMNS} FROM custom_tours WHERE id = $1 FOR UPDATE");
    sqlx::query_as(&sql)
        .bind(custom_tour_id)
        .fetch_optional(executor)
        .await
}

pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Vec<CustomTourWithGuide>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("{WITH_GUIDE_SELECT} WHERE ct.user_id = $1 ORDER BY ct.departure_date ASC");
    sqlx::query_as(&sql)
        .bind(user_id)
        .fetch_all(executor)
        .await
}

pub async fn list_all<'e, E>(executor: E) -> Result<Vec<CustomTourWithGuide>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("{WITH_GUIDE_SELECT} ORDER BY ct.departure_date ASC");
    sqlx::query_as(&sql).fetch_all(executor).await
}

/// Custom tours a guide is assigned to
pub async fn list_for_guide<'e, E>(
    executor: E,
    guide_id: i64,
) -> Result<Vec<CustomTourWithGuide>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("{WITH_GUIDE_SELECT} WHERE gt.guide_id = $1 ORDER BY ct.departure_date ASC");
    sqlx::query_as(&sql)
        .bind(guide_id)
        .fetch_all(executor)
        .await
}

pub async fn delete_custom_tour<'e, E>(executor: E, custom_tour_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM custom_tours WHERE id = $1")
        .bind(custom_tour_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_completed_payments<'e, E>(
    executor: E,
    custom_tour_id: i64,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM payments WHERE custom_tour_id = $1 AND status = 'COMPLETED'",
    )
    .bind(custom_tour_id)
    .fetch_one(executor)
    .await
}

/// Lock every GUIDE account so concurrent assignments are serialized
pub async fn lock_guides<'e, E>(executor: E) -> Result<Vec<i64>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar("SELECT id FROM users WHERE role = 'GUIDE' ORDER BY id FOR UPDATE")
        .fetch_all(executor)
        .await
}

/// Dates of every catalog or custom tour a guide is attached to
///
/// `excluding` leaves one custom tour out, so a tour being rescheduled does
/// not clash with itself.
pub async fn guide_commitments<'e, E>(
    executor: E,
    excluding: Option<i64>,
) -> Result<Vec<GuideCommitment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT gt.guide_id,
                   COALESCE(t.departure_date, ct.departure_date) AS departure_date,
                   COALESCE(t.return_date, ct.return_date) AS return_date
            FROM guide_tours gt
            LEFT JOIN tours t ON t.id = gt.tour_id
            LEFT JOIN custom_tours ct ON ct.id = gt.custom_tour_id
            WHERE gt.custom_tour_id IS DISTINCT FROM $1
        "#,
    )
    .bind(excluding)
    .fetch_all(executor)
    .await
}

pub async fn assign_guide<'e, E>(
    executor: E,
    guide_id: i64,
    custom_tour_id: i64,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("INSERT INTO guide_tours (guide_id, custom_tour_id) VALUES ($1, $2)")
        .bind(guide_id)
        .bind(custom_tour_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn release_guide<'e, E>(executor: E, custom_tour_id: i64) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("DELETE FROM guide_tours WHERE custom_tour_id = $1")
        .bind(custom_tour_id)
        .execute(executor)
        .await?;
    Ok(())
}
