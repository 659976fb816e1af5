use axum::http::StatusCode;
use serde_json::json;

use crate::common::{self, test_data};

fn count(statuses: &[StatusCode], wanted: StatusCode) -> usize {
    statuses.iter().filter(|&&status| status == wanted).count()
}

#[tokio::test]
async fn test_rate_limit_auth_endpoints() {
    let (_state, client) = common::setup().await;

    // Auth endpoints allow 5 req/s with a burst of 10
    let mut statuses = Vec::new();
    for _ in 0..25 {
        let body = json!({
            "email": test_data::unique_email("nobody"),
            "password": "secret123"
        });
        statuses.push(client.post_json("/api/auth/signin", &body).await.status);
    }

    assert!(
        count(&statuses, StatusCode::TOO_MANY_REQUESTS) > 0,
        "Some sign-in attempts should be rate limited. Got statuses: {statuses:?}"
    );
    assert!(
        count(&statuses, StatusCode::NOT_FOUND) >= 10,
        "The burst should reach the handler. Got statuses: {statuses:?}"
    );
}

#[tokio::test]
async fn test_rate_limit_general_endpoints() {
    let (_state, client) = common::setup().await;

    // General endpoints allow 10 req/s with a burst of 20
    let mut statuses = Vec::new();
    for _ in 0..30 {
        statuses.push(client.get("/api/exchange-rates").await.status);
    }

    assert!(
        count(&statuses, StatusCode::OK) >= 20,
        "The whole burst should succeed. Got statuses: {statuses:?}"
    );
}

#[tokio::test]
async fn test_route_groups_limited_independently() {
    let (_state, client) = common::setup().await;

    for _ in 0..25 {
        let body = json!({ "email": "limit@example.com", "password": "secret123" });
        client.post_json("/api/auth/signin", &body).await;
    }

    // The auth limiter being exhausted leaves other groups untouched
    client
        .get("/api/exchange-rates")
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_recovery_after_delay() {
    let (_state, client) = common::setup().await;

    for _ in 0..25 {
        let body = json!({ "email": "recover@example.com", "password": "secret123" });
        client.post_json("/api/auth/signin", &body).await;
    }

    tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;

    let response = client
        .post_json(
            "/api/auth/signin",
            &json!({ "email": "recover@example.com", "password": "secret123" }),
        )
        .await;
    assert_ne!(
        response.status,
        StatusCode::TOO_MANY_REQUESTS,
        "Tokens should replenish after a second"
    );
}
