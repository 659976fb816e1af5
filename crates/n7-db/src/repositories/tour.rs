use sqlx::{Executor, Postgres, QueryBuilder};

use crate::models::{Tour, TourImages, TourListing, TourSearch, TourWrite};

const TOUR_COLUMNS: &str = r#"
    id, seller_id, name, description, price, trip_type, category,
    departure_date, return_date, departure_location, destination_location,
    included_features, images, dress_code, duration, available,
    available_capacity, max_capacity, rating, created_at, updated_at
"#;

pub async fn create_tour<'e, E>(
    executor: E,
    seller_id: i64,
    tour: &TourWrite,
) -> Result<Tour, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            INSERT INTO tours (
                seller_id, name, description, price, trip_type, category,
                departure_date, return_date, departure_location, destination_location,
                included_features, images, dress_code, duration, available,
                available_capacity, max_capacity
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {TOUR_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(seller_id)
        .bind(&tour.name)
        .bind(&tour.description)
        .bind(tour.price)
        .bind(tour.trip_type)
        .bind(&tour.category)
        .bind(tour.departure_date)
        .bind(tour.return_date)
        .bind(&tour.departure_location)
        .bind(&tour.destination_location)
        .bind(&tour.included_features)
        .bind(&tour.images)
        .bind(&tour.dress_code)
        .bind(tour.duration)
        .bind(tour.available)
        .bind(tour.available_capacity)
        .bind(tour.max_capacity)
        .fetch_one(executor)
        .await
}

pub async fn update_tour<'e, E>(
    executor: E,
    tour_id: i64,
    tour: &TourWrite,
) -> Result<Option<Tour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            UPDATE tours
            SET name = $2, description = $3, price = $4, trip_type = $5, category = $6,
                departure_date = $7, return_date = $8, departure_location = $9,
                destination_location = $10, included_features = $11, images = $12,
                dress_code = $13, duration = $14, available = $15,
                available_capacity = $16, max_capacity = $17, updated_at = NOW()
            WHERE id = $1
            RETURNING {TOUR_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(tour_id)
        .bind(&tour.name)
        .bind(&tour.description)
        .bind(tour.price)
        .bind(tour.trip_type)
        .bind(&tour.category)
        .bind(tour.departure_date)
        .bind(tour.return_date)
        .bind(&tour.departure_location)
        .bind(&tour.destination_location)
        .bind(&tour.included_features)
        .bind(&tour.images)
        .bind(&tour.dress_code)
        .bind(tour.duration)
        .bind(tour.available)
        .bind(tour.available_capacity)
        .bind(tour.max_capacity)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id<'e, E>(executor: E, tour_id: i64) -> Result<Option<Tour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1");
    sqlx::query_as(&sql)
        .bind(tour_id)
        .fetch_optional(executor)
        .await
}

/// Fetch the tour and lock its row until the transaction ends
pub async fn find_by_id_for_update<'e, E>(
    executor: E,
    tour_id: i64,
) -> Result<Option<Tour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1 FOR UPDATE");
    sqlx::query_as(&sql)
        .bind(tour_id)
        .fetch_optional(executor)
        .await
}

/// Only tours open for booking
pub async fn find_available_by_id<'e, E>(
    executor: E,
    tour_id: i64,
) -> Result<Option<Tour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1 AND available = TRUE");
    sqlx::query_as(&sql)
        .bind(tour_id)
        .fetch_optional(executor)
        .await
}

pub async fn exists<'e, E>(executor: E, tour_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tours WHERE id = $1)")
        .bind(tour_id)
        .fetch_one(executor)
        .await
}

pub async fn delete_tour<'e, E>(executor: E, tour_id: i64) -> Result<Option<Tour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("DELETE FROM tours WHERE id = $1 RETURNING {TOUR_COLUMNS}");
    sqlx::query_as(&sql)
        .bind(tour_id)
        .fetch_optional(executor)
        .await
}

pub async fn count_completed_payments<'e, E>(executor: E, tour_id: i64) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM payments
            WHERE tour_id = $1 AND status = 'COMPLETED'
        "#,
    )
    .bind(tour_id)
    .fetch_one(executor)
    .await
}

/// `ILIKE` pattern matching `needle` anywhere, with its wildcards taken literally
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Public listing: available tours matching the filters, soonest departure first
pub async fn search<'e, E>(executor: E, filter: &TourSearch) -> Result<Vec<TourListing>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
        // language=PostgreSQL
        r#"
            SELECT t.*,
                   COALESCE(b.booked_people, 0)::bigint AS booked_people,
                   t.available_capacity AS remaining_capacity
            FROM tours t
            LEFT JOIN (
                SELECT tour_id, SUM(number_of_people) AS booked_people
                FROM payments
                WHERE status = 'COMPLETED'
                GROUP BY tour_id
            ) b ON b.tour_id = t.id
            WHERE t.available = TRUE
        "#,
    );

    if let Some(departure) = &filter.departure_location {
        qb.push(" AND t.departure_location ILIKE ")
            .push_bind(contains_pattern(departure))
            .push(r" ESCAPE '\'");
    }
    if let Some(destination) = &filter.destination_location {
        qb.push(" AND t.destination_location ILIKE ")
            .push_bind(contains_pattern(destination))
            .push(r" ESCAPE '\'");
    }
    if let Some(category) = &filter.category {
        qb.push(" AND t.category ILIKE ")
            .push_bind(contains_pattern(category))
            .push(r" ESCAPE '\'");
    }
    if let Some(trip_type) = filter.trip_type {
        qb.push(" AND t.trip_type = ").push_bind(trip_type);
    }
    if filter.with_seats_only {
        qb.push(" AND t.available_capacity > 0");
    }
    if let Some(from) = filter.departure_from {
        qb.push(" AND t.departure_date >= ").push_bind(from);
    }
    if let Some(until) = filter.return_until {
        qb.push(" AND t.return_date <= ").push_bind(until);
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND t.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND t.price <= ").push_bind(max);
    }

    qb.push(" ORDER BY t.departure_date ASC, t.id ASC");

    qb.build_query_as::<TourListing>()
        .fetch_all(executor)
        .await
}

pub async fn list_by_seller<'e, E>(executor: E, seller_id: i64) -> Result<Vec<Tour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "SELECT {TOUR_COLUMNS} FROM tours WHERE seller_id = $1 ORDER BY departure_date ASC"
    );
    sqlx::query_as(&sql)
        .bind(seller_id)
        .fetch_all(executor)
        .await
}

pub async fn set_images<'e, E>(
    executor: E,
    tour_id: i64,
    images: &[String],
) -> Result<Option<TourImages>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE tours
            SET images = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, images
        "#,
    )
    .bind(tour_id)
    .bind(images)
    .fetch_optional(executor)
    .await
}

pub async fn set_rating<'e, E>(executor: E, tour_id: i64, rating: f64) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE tours SET rating = $2, updated_at = NOW() WHERE id = $1")
        .bind(tour_id)
        .bind(rating)
        .execute(executor)
        .await?;
    Ok(())
}

/// Lock the tour row until the transaction ends, returning its open seats
pub async fn lock_for_update<'e, E>(executor: E, tour_id: i64) -> Result<Option<i32>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar("SELECT available_capacity FROM tours WHERE id = $1 FOR UPDATE")
        .bind(tour_id)
        .fetch_optional(executor)
        .await
}

pub async fn set_capacity<'e, E>(executor: E, tour_id: i64, capacity: i32) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE tours SET available_capacity = $2, updated_at = NOW() WHERE id = $1")
        .bind(tour_id)
        .bind(capacity)
        .execute(executor)
        .await?;
    Ok(())
}
