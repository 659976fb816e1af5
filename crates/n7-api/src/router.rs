use axum::{Json, Router, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{
    auth, currency, custom_tour, health, history, payment, review, state::ApiState, tour, user,
};

pub fn router() -> Router<ApiState> {
    let api = Router::new()
        .merge(auth::routes())
        .merge(user::routes())
        .merge(tour::routes())
        .merge(custom_tour::routes())
        .merge(review::routes())
        .merge(payment::routes())
        .merge(history::routes())
        .merge(currency::routes());

    Router::new()
        .merge(health::routes())
        .nest("/api", api)
        .fallback(handler_404)
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "The requested resource was not found" })),
    )
}
