use std::collections::HashMap;

use axum::{Router, extract::State, routing::get};
use n7_booking::currency::{BASE_CURRENCY, convert, find_currency, format_price};
use serde::{Deserialize, Serialize};

use crate::{
    ApiState,
    currency::RateSource,
    error::ApiError,
    extract::{Json, Query},
    make_rate_limit_layer,
    middleware::rate_limit,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/exchange-rates", get(exchange_rates))
        .route("/exchange-rates/convert", get(convert_amount))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

#[derive(Debug, Serialize)]
pub struct RatesResponse {
    pub base: &'static str,
    pub rates: HashMap<String, f64>,
    pub source: RateSource,
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    /// Amount in USD
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub amount: f64,
    pub currency: &'static str,
    pub converted: f64,
    pub formatted: String,
}

async fn exchange_rates(State(state): State<ApiState>) -> Json<RatesResponse> {
    let (rates, source) = state.exchange_rates.rates().await;

    Json(RatesResponse {
        base: BASE_CURRENCY,
        rates,
        source,
    })
}

async fn convert_amount(
    State(state): State<ApiState>,
    Query(query): Query<ConvertQuery>,
) -> Result<Json<ConvertResponse>, ApiError> {
    if !query.amount.is_finite() || query.amount < 0.0 {
        return Err(ApiError::Validation(
            "Amount must be a non-negative number".to_string(),
        ));
    }

    let currency = find_currency(query.currency.trim()).ok_or_else(|| {
        ApiError::Validation(format!("Unsupported currency: {}", query.currency))
    })?;

    let (rates, _) = state.exchange_rates.rates().await;

    Ok(Json(ConvertResponse {
        amount: query.amount,
        currency: currency.code,
        converted: convert(query.amount, currency.code, &rates),
        formatted: format_price(query.amount, currency, &rates),
    }))
}
