use sqlx::{Executor, Postgres};

use crate::models::{HistoryEntry, HistoryWithTour};

/// Upserts the (user, tour) row, bumping its interaction count
pub async fn record_view<'e, E>(
    executor: E,
    user_id: i64,
    tour_id: i64,
) -> Result<HistoryEntry, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO history (user_id, tour_id, interaction, viewed_at)
            VALUES ($1, $2, 1, NOW())
            ON CONFLICT (user_id, tour_id)
            DO UPDATE SET interaction = history.interaction + 1, viewed_at = NOW()
            RETURNING id, user_id, tour_id, interaction, viewed_at
        "#,
    )
    .bind(user_id)
    .bind(tour_id)
    .fetch_one(executor)
    .await
}

pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Vec<HistoryWithTour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT h.id, h.user_id, h.tour_id, h.interaction, h.viewed_at,
                   t.name AS tour_name, t.destination_location
            FROM history h
            JOIN tours t ON t.id = h.tour_id
            WHERE h.user_id = $1
            ORDER BY h.viewed_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}
