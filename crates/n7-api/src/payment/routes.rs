use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use n7_booking::{
    BookingError,
    booking::{booking_total, check_capacity, remaining_after, resolve_refund_amount},
    currency::find_currency,
};
use n7_db::{
    models::{BookingTarget, NewPayment, Payment, PaymentStatus, PaymentWithTour, Role},
    repositories::{
        custom_tour as custom_tour_repo, payment as payment_repo, tour as tour_repo,
    },
};
use serde::{Deserialize, Serialize};

use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    extract::{Json, Path},
    make_rate_limit_layer,
    metrics,
    middleware::rate_limit,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/payments", post(make_payment))
        .route("/payments/initiate", post(initiate_payment))
        .route(
            "/payments/update-transaction/{order_num}",
            put(update_transaction),
        )
        .route("/payments/my", get(my_payments))
        .route("/payments/{id}", get(get_payment))
        .route("/payments/{id}/refund", put(refund_payment))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

const DEFAULT_CURRENCY: &str = "DZD";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub tour_id: Option<i64>,
    pub custom_tour_id: Option<i64>,
    pub number_of_people: i32,
    /// Accepted for client compatibility, the tour's own departure date applies
    pub selected_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakePaymentRequest {
    pub tour_id: Option<i64>,
    pub custom_tour_id: Option<i64>,
    pub number_of_people: i32,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub refund_amount: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub id: i64,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub form_url: Option<String>,
}

impl From<&Payment> for PaymentSummary {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            amount: payment.amount,
            currency: payment.currency.clone(),
            status: payment.status,
            transaction_id: payment.transaction_id.clone(),
            form_url: payment.form_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InitiatePaymentResponse {
    pub payment: PaymentSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakePaymentResponse {
    pub payment: Payment,
    pub payment_url: Option<String>,
    pub transaction_id: Option<String>,
}

/// A payment is for exactly one catalog tour or one custom tour
pub fn booking_target(
    tour_id: Option<i64>,
    custom_tour_id: Option<i64>,
) -> Result<BookingTarget, ApiError> {
    match (tour_id, custom_tour_id) {
        (Some(id), None) => Ok(BookingTarget::Tour(id)),
        (None, Some(id)) => Ok(BookingTarget::CustomTour(id)),
        (None, None) => Err(ApiError::Validation(
            "tourId or customTourId is required".to_string(),
        )),
        (Some(_), Some(_)) => Err(ApiError::Validation(
            "Provide either tourId or customTourId, not both".to_string(),
        )),
    }
}

fn tour_unavailable() -> ApiError {
    ApiError::NotFound("Tour not found or not available".to_string())
}

/// Total owed for the party
///
/// Catalog tours must still have the seats; a custom tour can only be paid by
/// the traveller who built it.
async fn price_booking(
    state: &ApiState,
    user_id: i64,
    target: BookingTarget,
    number_of_people: i32,
) -> Result<f64, ApiError> {
    match target {
        BookingTarget::Tour(tour_id) => {
            let tour = tour_repo::find_available_by_id(&state.pool, tour_id)
                .await?
                .ok_or_else(tour_unavailable)?;
            check_capacity(number_of_people, tour.available_capacity)?;
            Ok(booking_total(tour.price, number_of_people)?)
        }
        BookingTarget::CustomTour(custom_tour_id) => {
            let custom_tour = custom_tour_repo::find_by_id(&state.pool, custom_tour_id)
                .await?
                .ok_or_else(tour_unavailable)?
                .custom_tour;
            if custom_tour.user_id != user_id {
                return Err(ApiError::Forbidden(
                    "You can only pay for your own custom tours".to_string(),
                ));
            }
            Ok(booking_total(custom_tour.price, number_of_people)?)
        }
    }
}

/// Price the booking, open a gateway transaction and persist the PROCESSING payment
///
/// Capacity is only checked here; seats are taken when the transaction completes.
async fn open_payment(
    state: &ApiState,
    user_id: i64,
    target: BookingTarget,
    number_of_people: i32,
    currency: &str,
    notes: Option<String>,
) -> Result<Payment, ApiError> {
    let amount = price_booking(state, user_id, target, number_of_people).await?;

    let gateway = state.gateway()?;
    let transaction = match gateway.initiate(amount).await {
        Ok(transaction) => transaction,
        Err(e) => {
            metrics::record_payment_event("initiate", false);
            return Err(e);
        }
    };

    let notes = notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let mut tx = state.pool.begin().await?;

    let payment = payment_repo::create_payment(
        &mut *tx,
        &NewPayment {
            user_id,
            target,
            amount,
            number_of_people,
            currency: currency.to_string(),
            transaction_id: Some(transaction.order_number),
            form_url: transaction.form_url,
            notes,
        },
    )
    .await?;

    if let Some(tour_id) = target.tour_id() {
        payment_repo::record_booking(&mut *tx, user_id, tour_id, number_of_people).await?;
    }

    tx.commit().await?;

    metrics::record_payment_event("initiate", true);
    tracing::info!(
        payment_id = payment.id,
        user_id,
        target = ?target,
        amount,
        "Payment initiated"
    );

    Ok(payment)
}

async fn initiate_payment(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<InitiatePaymentRequest>,
) -> Result<Json<InitiatePaymentResponse>, ApiError> {
    if let Some(date) = &payload.selected_date {
        tracing::debug!(selected_date = %date, "Selected date ignored, tour schedule applies");
    }

    let target = booking_target(payload.tour_id, payload.custom_tour_id)?;

    let payment = open_payment(
        &state,
        auth_user.user_id,
        target,
        payload.number_of_people,
        DEFAULT_CURRENCY,
        payload.notes,
    )
    .await?;

    Ok(Json(InitiatePaymentResponse {
        payment: PaymentSummary::from(&payment),
    }))
}

async fn make_payment(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<MakePaymentRequest>,
) -> Result<Json<MakePaymentResponse>, ApiError> {
    let target = booking_target(payload.tour_id, payload.custom_tour_id)?;

    let currency = match payload.currency.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_CURRENCY.to_string(),
        Some(code) => find_currency(code)
            .map(|c| c.code.to_string())
            .ok_or_else(|| ApiError::Validation(format!("Unsupported currency: {code}")))?,
    };

    let payment = open_payment(
        &state,
        auth_user.user_id,
        target,
        payload.number_of_people,
        &currency,
        payload.notes,
    )
    .await?;

    Ok(Json(MakePaymentResponse {
        payment_url: payment.form_url.clone(),
        transaction_id: payment.transaction_id.clone(),
        payment,
    }))
}

/// Confirm a gateway order: mark it COMPLETED and take the seats, atomically
async fn update_transaction(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(order_num): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let mut tx = state.pool.begin().await?;

    let payment = payment_repo::find_by_transaction_id_for_update(&mut *tx, &order_num)
        .await?
        .ok_or_else(|| ApiError::NotFound("No payment found for this transaction".to_string()))?;

    auth_user.require_self_or_admin(payment.user_id, "You can only update your own payments")?;

    match payment.status {
        // Confirming twice must not take the seats twice
        PaymentStatus::Completed => return Ok(Json(payment)),
        PaymentStatus::Processing => {}
        PaymentStatus::Failed | PaymentStatus::Refunded => {
            return Err(ApiError::BadRequest(
                "Only processing payments can be completed".to_string(),
            ));
        }
    }

    if let Some(tour_id) = payment.tour_id
        && let Some(capacity) = tour_repo::lock_for_update(&mut *tx, tour_id).await?
    {
        let remaining = remaining_after(capacity, payment.number_of_people).map_err(|e| {
            metrics::record_payment_event("complete", false);
            match e {
                BookingError::NotEnoughCapacity => ApiError::Conflict(e.to_string()),
                other => other.into(),
            }
        })?;
        tour_repo::set_capacity(&mut *tx, tour_id, remaining).await?;
    }

    let completed = payment_repo::mark_completed(&mut *tx, payment.id).await?;

    tx.commit().await?;

    metrics::record_payment_event("complete", true);
    tracing::info!(
        payment_id = completed.id,
        transaction_id = %order_num,
        "Payment completed"
    );

    Ok(Json(completed))
}

async fn my_payments(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<Vec<PaymentWithTour>>, ApiError> {
    let payments = payment_repo::list_for_user(&state.pool, auth_user.user_id).await?;
    Ok(Json(payments))
}

async fn get_payment(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<PaymentWithTour>, ApiError> {
    let payment = payment_repo::find_with_tour(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?;

    auth_user.require_self_or_admin(
        payment.payment.user_id,
        "You can only view your own payments",
    )?;

    Ok(Json(payment))
}

async fn refund_payment(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    payload: Option<Json<RefundRequest>>,
) -> Result<Json<Payment>, ApiError> {
    auth_user.require_role(&[Role::Admin])?;

    let payment = payment_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?;

    let not_refundable =
        || ApiError::BadRequest("Only completed payments can be refunded".to_string());

    if payment.status != PaymentStatus::Completed {
        return Err(not_refundable());
    }

    let requested = payload.and_then(|Json(body)| body.refund_amount);
    let amount = resolve_refund_amount(payment.amount, requested)?;

    // Status is re-checked by the update itself
    let refunded = payment_repo::mark_refunded(&state.pool, id, amount)
        .await?
        .ok_or_else(not_refundable)?;

    metrics::record_payment_event("refund", true);
    tracing::info!(payment_id = id, amount, "Payment refunded");

    Ok(Json(refunded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_target() {
        assert_eq!(booking_target(Some(3), None).unwrap(), BookingTarget::Tour(3));
        assert_eq!(
            booking_target(None, Some(8)).unwrap(),
            BookingTarget::CustomTour(8)
        );
        assert!(matches!(
            booking_target(None, None),
            Err(ApiError::Validation(msg)) if msg == "tourId or customTourId is required"
        ));
        assert!(matches!(
            booking_target(Some(3), Some(8)),
            Err(ApiError::Validation(_))
        ));
    }
}
