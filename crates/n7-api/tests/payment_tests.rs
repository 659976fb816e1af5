use axum::http::StatusCode;
use httpmock::prelude::*;
use n7_api::router;
use n7_db::models::Role;
use serde_json::json;

use crate::common::{self, TestClient, TestStateBuilder, TestUser, db};

async fn gateway_setup(server: &MockServer) -> (n7_api::ApiState, TestClient) {
    let state = TestStateBuilder::new()
        .with_payment_gateway(&server.base_url())
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::new(router::router().with_state(state.clone()));
    (state, client)
}

async fn mock_initiate(server: &MockServer, order: &str) {
    let order = order.to_string();
    server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/payment/initiate")
                .header("x-app-key", "test-key")
                .header("x-app-secret", "test-secret");
            then.status(200).json_body(json!({
                "data": {
                    "id": order,
                    "attributes": { "form_url": "https://epay.test/form" }
                }
            }));
        })
        .await;
}

fn unique_order() -> String {
    format!("ORD-{}", uuid::Uuid::new_v4())
}

#[tokio::test]
async fn test_initiate_payment() {
    let server = MockServer::start_async().await;
    let order = unique_order();
    mock_initiate(&server, &order).await;
    let (state, client) = gateway_setup(&server).await;

    let seller = TestUser::create(&state, "pseller", Role::Vendeur).await;
    let tourist = TestUser::create(&state, "ptourist", Role::Tourist).await;
    let tour = db::create_tour(&state.pool, seller.id, "Paid", 15000.0, 5)
        .await
        .unwrap();

    let response = client
        .post_json_with_auth(
            "/api/payments/initiate",
            &json!({ "tourId": tour.id, "numberOfPeople": 3, "selectedDate": "2030-01-01" }),
            &tourist.token,
        )
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["payment"]["amount"], 45000.0);
    assert_eq!(body["payment"]["currency"], "DZD");
    assert_eq!(body["payment"]["status"], "PROCESSING");
    assert_eq!(body["payment"]["transactionId"], order.as_str());
    assert_eq!(body["payment"]["formUrl"], "https://epay.test/form");

    let bookings: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tourist_tours WHERE tourist_id = $1")
            .bind(tourist.id)
            .fetch_one(&state.pool)
            .await
            .unwrap();
    assert_eq!(bookings, 1);

    // Seats are only taken on completion
    assert_eq!(db::tour_capacity(&state.pool, tour.id).await.unwrap(), 5);

    db::delete_tour(&state.pool, tour.id).await.unwrap();
    seller.cleanup(&state).await;
    tourist.cleanup(&state).await;
}

#[tokio::test]
async fn test_initiate_payment_rejections() {
    let server = MockServer::start_async().await;
    let (state, client) = gateway_setup(&server).await;

    let seller = TestUser::create(&state, "rseller", Role::Vendeur).await;
    let tourist = TestUser::create(&state, "rtourist", Role::Tourist).await;
    let tour = db::create_tour(&state.pool, seller.id, "Small", 100.0, 2)
        .await
        .unwrap();

    let too_many = client
        .post_json_with_auth(
            "/api/payments/initiate",
            &json!({ "tourId": tour.id, "numberOfPeople": 3 }),
            &tourist.token,
        )
        .await;
    too_many.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(too_many.error(), "Not enough capacity for the selected tour");

    let missing = client
        .post_json_with_auth(
            "/api/payments/initiate",
            &json!({ "tourId": 999_999_999, "numberOfPeople": 1 }),
            &tourist.token,
        )
        .await;
    missing.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(missing.error(), "Tour not found or not available");

    // No mock registered, so the gateway answers 404
    let failed = client
        .post_json_with_auth(
            "/api/payments/initiate",
            &json!({ "tourId": tour.id, "numberOfPeople": 1 }),
            &tourist.token,
        )
        .await;
    failed.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(
        failed.error(),
        "Payment initiation failed. Please try again."
    );

    db::delete_tour(&state.pool, tour.id).await.unwrap();
    seller.cleanup(&state).await;
    tourist.cleanup(&state).await;
}

#[tokio::test]
async fn test_payment_without_gateway_config() {
    let (state, client) = common::setup().await;
    let seller = TestUser::create(&state, "nseller", Role::Vendeur).await;
    let tourist = TestUser::create(&state, "ntourist", Role::Tourist).await;
    let tour = db::create_tour(&state.pool, seller.id, "Unpaid", 100.0, 5)
        .await
        .unwrap();

    let response = client
        .post_json_with_auth(
            "/api/payments",
            &json!({ "tourId": tour.id, "numberOfPeople": 1 }),
            &tourist.token,
        )
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.error().starts_with("Payment configuration error"));

    db::delete_tour(&state.pool, tour.id).await.unwrap();
    seller.cleanup(&state).await;
    tourist.cleanup(&state).await;
}

#[tokio::test]
async fn test_complete_transaction_is_idempotent() {
    let server = MockServer::start_async().await;
    let order = unique_order();
    mock_initiate(&server, &order).await;
    let (state, client) = gateway_setup(&server).await;

    let seller = TestUser::create(&state, "cseller", Role::Vendeur).await;
    let tourist = TestUser::create(&state, "ctourist", Role::Tourist).await;
    let other = TestUser::create(&state, "cother", Role::Tourist).await;
    let tour = db::create_tour(&state.pool, seller.id, "Completed", 100.0, 5)
        .await
        .unwrap();

    let created = client
        .post_json_with_auth(
            "/api/payments",
            &json!({ "tourId": tour.id, "numberOfPeople": 2, "currency": "eur", "notes": "Vegetarian" }),
            &tourist.token,
        )
        .await;
    created.assert_status(StatusCode::OK);
    let body: serde_json::Value = created.json();
    assert_eq!(body["transactionId"], order.as_str());
    assert_eq!(body["paymentUrl"], "https://epay.test/form");
    assert_eq!(body["payment"]["currency"], "EUR");
    assert_eq!(body["payment"]["notes"], "Vegetarian");

    let uri = format!("/api/payments/update-transaction/{order}");

    client
        .put_with_auth(&uri, &other.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let completed = client.put_with_auth(&uri, &tourist.token).await;
    completed.assert_status(StatusCode::OK);
    let payment: serde_json::Value = completed.json();
    assert_eq!(payment["status"], "COMPLETED");
    assert!(payment["processedAt"].is_string());
    assert_eq!(db::tour_capacity(&state.pool, tour.id).await.unwrap(), 3);

    // A second confirmation leaves capacity alone
    let again = client.put_with_auth(&uri, &tourist.token).await;
    again.assert_status(StatusCode::OK);
    assert_eq!(db::tour_capacity(&state.pool, tour.id).await.unwrap(), 3);

    client
        .put_with_auth(
            "/api/payments/update-transaction/UNKNOWN-ORDER",
            &tourist.token,
        )
        .await
        .assert_status(StatusCode::NOT_FOUND);

    db::delete_tour(&state.pool, tour.id).await.unwrap();
    for user in [seller, tourist, other] {
        user.cleanup(&state).await;
    }
}

#[tokio::test]
async fn test_complete_transaction_without_capacity_conflicts() {
    let server = MockServer::start_async().await;
    let order = unique_order();
    mock_initiate(&server, &order).await;
    let (state, client) = gateway_setup(&server).await;

    let seller = TestUser::create(&state, "kseller", Role::Vendeur).await;
    let tourist = TestUser::create(&state, "ktourist", Role::Tourist).await;
    let tour = db::create_tour(&state.pool, seller.id, "Oversold", 100.0, 4)
        .await
        .unwrap();

    client
        .post_json_with_auth(
            "/api/payments/initiate",
            &json!({ "tourId": tour.id, "numberOfPeople": 3 }),
            &tourist.token,
        )
        .await
        .assert_status(StatusCode::OK);

    // Seats sold elsewhere in the meantime
    n7_db::repositories::tour::set_capacity(&state.pool, tour.id, 1)
        .await
        .unwrap();

    let response = client
        .put_with_auth(
            &format!("/api/payments/update-transaction/{order}"),
            &tourist.token,
        )
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(db::tour_capacity(&state.pool, tour.id).await.unwrap(), 1);

    db::delete_tour(&state.pool, tour.id).await.unwrap();
    seller.cleanup(&state).await;
    tourist.cleanup(&state).await;
}

#[tokio::test]
async fn test_payment_lookup_and_refund() {
    let (state, client) = common::setup().await;
    let seller = TestUser::create(&state, "lseller", Role::Vendeur).await;
    let tourist = TestUser::create(&state, "ltourist", Role::Tourist).await;
    let other = TestUser::create(&state, "lother", Role::Tourist).await;
    let admin = TestUser::create(&state, "ladmin", Role::Admin).await;
    let tour = db::create_tour(&state.pool, seller.id, "Refundable", 100.0, 5)
        .await
        .unwrap();
    let payment_id = db::insert_completed_payment(&state.pool, tourist.id, tour.id, 400.0, 4)
        .await
        .unwrap();
    let uri = format!("/api/payments/{payment_id}");

    let mine = client.get_with_auth("/api/payments/my", &tourist.token).await;
    mine.assert_status(StatusCode::OK);
    let payments: Vec<serde_json::Value> = mine.json();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["tourName"], "Refundable");

    client
        .get_with_auth(&uri, &tourist.token)
        .await
        .assert_status(StatusCode::OK);
    client
        .get_with_auth(&uri, &other.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    client
        .get_with_auth(&uri, &admin.token)
        .await
        .assert_status(StatusCode::OK);

    let refund_uri = format!("{uri}/refund");

    client
        .put_json_with_auth(&refund_uri, &json!({}), &tourist.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    client
        .put_json_with_auth(&refund_uri, &json!({ "refundAmount": 500.0 }), &admin.token)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let refunded = client
        .put_json_with_auth(&refund_uri, &json!({ "refundAmount": 150.0 }), &admin.token)
        .await;
    refunded.assert_status(StatusCode::OK);
    let body: serde_json::Value = refunded.json();
    assert_eq!(body["status"], "REFUNDED");
    assert_eq!(body["refundAmount"], 150.0);
    assert!(body["refundedAt"].is_string());

    let twice = client.put_with_auth(&refund_uri, &admin.token).await;
    twice.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(twice.error(), "Only completed payments can be refunded");

    db::delete_tour(&state.pool, tour.id).await.unwrap();
    for user in [seller, tourist, other, admin] {
        user.cleanup(&state).await;
    }
}

#[tokio::test]
async fn test_pay_for_custom_tour() {
    let server = MockServer::start_async().await;
    let order = unique_order();
    mock_initiate(&server, &order).await;
    let (state, client) = gateway_setup(&server).await;

    let traveller = TestUser::create(&state, "cttourist", Role::Tourist).await;
    let other = TestUser::create(&state, "ctother", Role::Tourist).await;

    let custom: serde_json::Value = client
        .post_json_with_auth(
            "/api/custom-tours",
            &json!({
                "guests": 2,
                "departureDate": "2099-05-01",
                "returnDate": "2099-05-04",
                "departureLocation": "Constantine",
                "destinationLocation": "Ghardaia",
                "price": 20000.0
            }),
            &traveller.token,
        )
        .await
        .json();
    let custom_id = custom["id"].as_i64().unwrap();

    let response = client
        .post_json_with_auth(
            "/api/payments/initiate",
            &json!({ "customTourId": custom_id, "numberOfPeople": 1 }),
            &other.token,
        )
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.error(), "You can only pay for your own custom tours");

    let response = client
        .post_json_with_auth(
            "/api/payments/initiate",
            &json!({ "tourId": 1, "customTourId": custom_id, "numberOfPeople": 1 }),
            &traveller.token,
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = client
        .post_json_with_auth(
            "/api/payments/initiate",
            &json!({ "customTourId": custom_id, "numberOfPeople": 2 }),
            &traveller.token,
        )
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["payment"]["amount"], 40000.0);
    assert_eq!(body["payment"]["transactionId"], order.as_str());

    // Custom trips have no seats to book
    let bookings: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tourist_tours WHERE tourist_id = $1")
            .bind(traveller.id)
            .fetch_one(&state.pool)
            .await
            .unwrap();
    assert_eq!(bookings, 0);

    let completed = client
        .put_with_auth(
            &format!("/api/payments/update-transaction/{order}"),
            &traveller.token,
        )
        .await;
    completed.assert_status(StatusCode::OK);
    let payment: serde_json::Value = completed.json();
    assert_eq!(payment["status"], "COMPLETED");
    assert_eq!(payment["customTourId"], custom_id);
    assert!(payment["tourId"].is_null());

    let response = client
        .delete_with_auth(&format!("/api/custom-tours/{custom_id}"), &traveller.token)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.error(),
        "Cannot delete a custom tour that has already been paid for"
    );

    traveller.cleanup(&state).await;
    other.cleanup(&state).await;
}
