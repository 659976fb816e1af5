use sqlx::{Executor, Postgres};

use crate::models::{Review, ReviewWithContext};

pub async fn create_review<'e, E>(
    executor: E,
    user_id: i64,
    tour_id: i64,
    rating: i16,
    review: Option<&str>,
) -> Result<Review, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO reviews (user_id, tour_id, rating, review)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, tour_id, rating, review, created_at
        "#,
    )
    .bind(user_id)
    .bind(tour_id)
    .bind(rating)
    .bind(review)
    .fetch_one(executor)
    .await
}

pub async fn find_by_user_and_tour<'e, E>(
    executor: E,
    user_id: i64,
    tour_id: i64,
) -> Result<Option<Review>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, tour_id, rating, review, created_at
            FROM reviews
            WHERE user_id = $1 AND tour_id = $2
        "#,
    )
    .bind(user_id)
    .bind(tour_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, review_id: i64) -> Result<Option<Review>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        "SELECT id, user_id, tour_id, rating, review, created_at FROM reviews WHERE id = $1",
    )
    .bind(review_id)
    .fetch_optional(executor)
    .await
}

pub async fn delete_review<'e, E>(executor: E, review_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(review_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Every rating left on a tour, used to recompute its average
pub async fn ratings_for_tour<'e, E>(executor: E, tour_id: i64) -> Result<Vec<i16>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar("SELECT rating FROM reviews WHERE tour_id = $1")
        .bind(tour_id)
        .fetch_all(executor)
        .await
}

pub async fn list_all_with_context<'e, E>(
    executor: E,
) -> Result<Vec<ReviewWithContext>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT r.id, r.user_id, r.tour_id, r.rating, r.review, r.created_at,
                   u.username, t.name AS tour_name
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            JOIN tours t ON t.id = r.tour_id
            ORDER BY r.created_at DESC
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn list_for_tour<'e, E>(
    executor: E,
    tour_id: i64,
) -> Result<Vec<ReviewWithContext>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT r.id, r.user_id, r.tour_id, r.rating, r.review, r.created_at,
                   u.username, t.name AS tour_name
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            JOIN tours t ON t.id = r.tour_id
            WHERE r.tour_id = $1
            ORDER BY r.created_at DESC
        "#,
    )
    .bind(tour_id)
    .fetch_all(executor)
    .await
}
