use sqlx::{Executor, Postgres};

use crate::models::{NewPayment, Payment, PaymentWithPayer, PaymentWithTour};

const PAYMENT_COLUMNS: &str = r#"
    id, user_id, tour_id, custom_tour_id, amount, number_of_people, currency, status,
    transaction_id, form_url, notes, refund_amount, created_at, processed_at, refunded_at
"#;

pub async fn create_payment<'e, E>(executor: E, payment: &NewPayment) -> Result<Payment, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            INSERT INTO payments (
                user_id, tour_id, custom_tour_id, amount, number_of_people, currency,
                status, transaction_id, form_url, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'PROCESSING', $7, $8, $9)
            RETURNING {PAYMENT_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(payment.user_id)
        .bind(payment.target.tour_id())
        .bind(payment.target.custom_tour_id())
        .bind(payment.amount)
        .bind(payment.number_of_people)
        .bind(&payment.currency)
        .bind(&payment.transaction_id)
        .bind(&payment.form_url)
        .bind(&payment.notes)
        .fetch_one(executor)
        .await
}

/// Locks the payment row until the surrounding transaction ends
pub async fn find_by_transaction_id_for_update<'e, E>(
    executor: E,
    transaction_id: &str,
) -> Result<Option<Payment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE transaction_id = $1 FOR UPDATE");
    sqlx::query_as(&sql)
        .bind(transaction_id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id<'e, E>(executor: E, payment_id: i64) -> Result<Option<Payment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
    sqlx::query_as(&sql)
        .bind(payment_id)
        .fetch_optional(executor)
        .await
}

pub async fn find_with_tour<'e, E>(
    executor: E,
    payment_id: i64,
) -> Result<Option<PaymentWithTour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT p.*,
                   t.name AS tour_name,
                   t.departure_date AS tour_departure_date,
                   t.departure_location AS tour_departure_location,
                   t.price AS tour_price
            FROM payments p
            LEFT JOIN tours t ON t.id = p.tour_id
            WHERE p.id = $1
        "#,
    )
    .bind(payment_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Vec<PaymentWithTour>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT p.*,
                   t.name AS tour_name,
                   t.departure_date AS tour_departure_date,
                   t.departure_location AS tour_departure_location,
                   t.price AS tour_price
            FROM payments p
            LEFT JOIN tours t ON t.id = p.tour_id
            WHERE p.user_id = $1
            ORDER BY p.created_at DESC, p.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Payments made on any of the given tours, with the payer's contact details
pub async fn list_for_tours<'e, E>(
    executor: E,
    tour_ids: &[i64],
) -> Result<Vec<PaymentWithPayer>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT p.*, u.username, u.email
            FROM payments p
            JOIN users u ON u.id = p.user_id
            WHERE p.tour_id = ANY($1)
            ORDER BY p.created_at DESC
        "#,
    )
    .bind(tour_ids)
    .fetch_all(executor)
    .await
}

pub async fn mark_completed<'e, E>(executor: E, payment_id: i64) -> Result<Payment, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            UPDATE payments
            SET status = 'COMPLETED', processed_at = NOW()
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(payment_id)
        .fetch_one(executor)
        .await
}

/// Refunds a completed payment; `None` when it is no longer COMPLETED
pub async fn mark_refunded<'e, E>(
    executor: E,
    payment_id: i64,
    refund_amount: f64,
) -> Result<Option<Payment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            UPDATE payments
            SET status = 'REFUNDED', refund_amount = $2, refunded_at = NOW()
            WHERE id = $1 AND status = 'COMPLETED'
            RETURNING {PAYMENT_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(payment_id)
        .bind(refund_amount)
        .fetch_optional(executor)
        .await
}

/// Booking ledger entry written alongside a new payment
pub async fn record_booking<'e, E>(
    executor: E,
    tourist_id: i64,
    tour_id: i64,
    guests: i32,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("INSERT INTO tourist_tours (tourist_id, tour_id, guests) VALUES ($1, $2, $3)")
        .bind(tourist_id)
        .bind(tour_id)
        .bind(guests)
        .execute(executor)
        .await?;
    Ok(())
}
