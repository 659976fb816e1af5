use axum::http::StatusCode;
use n7_db::models::Role;
use serde_json::json;

use crate::common::{self, TestUser, test_data};

#[tokio::test]
async fn test_get_profile() {
    let (state, client) = common::setup().await;
    let user = TestUser::create(&state, "profile", Role::Guide).await;

    let response = client.get_with_auth("/api/users/profile", &user.token).await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["username"], user.username.as_str());
    assert_eq!(body["role"], "GUIDE");

    user.cleanup(&state).await;
}

#[tokio::test]
async fn test_list_users_filtered_by_role() {
    let (state, client) = common::setup().await;
    let seller = TestUser::create(&state, "lister", Role::Vendeur).await;

    let response = client.get("/api/users?role=VENDEUR").await;

    response.assert_status(StatusCode::OK);
    let users: Vec<serde_json::Value> = response.json();
    assert!(users.iter().all(|u| u["role"] == "VENDEUR"));
    assert!(users.iter().any(|u| u["id"] == seller.id));

    seller.cleanup(&state).await;
}

#[tokio::test]
async fn test_update_profile() {
    let (state, client) = common::setup().await;
    let user = TestUser::create(&state, "upd", Role::Tourist).await;
    let new_name = test_data::unique_username("renamed");

    let response = client
        .patch_json_with_auth("/api/users", &json!({ "username": new_name }), &user.token)
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["username"], new_name.as_str());
    assert_eq!(body["email"], user.email.as_str());

    let invalid = client
        .patch_json_with_auth("/api/users", &json!({ "email": "not-an-email" }), &user.token)
        .await;
    invalid.assert_status(StatusCode::BAD_REQUEST);

    user.cleanup(&state).await;
}

#[tokio::test]
async fn test_update_profile_username_taken() {
    let (state, client) = common::setup().await;
    let first = TestUser::create(&state, "taken", Role::Tourist).await;
    let second = TestUser::create(&state, "taker", Role::Tourist).await;

    let response = client
        .patch_json_with_auth(
            "/api/users",
            &json!({ "username": first.username }),
            &second.token,
        )
        .await;

    response.assert_status(StatusCode::CONFLICT);

    first.cleanup(&state).await;
    second.cleanup(&state).await;
}

#[tokio::test]
async fn test_delete_user_permissions() {
    let (state, client) = common::setup().await;
    let owner = TestUser::create(&state, "owner", Role::Tourist).await;
    let other = TestUser::create(&state, "other", Role::Tourist).await;
    let admin = TestUser::create(&state, "admin", Role::Admin).await;

    client
        .delete_with_auth(&format!("/api/users/{}", owner.id), &other.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let deleted = client
        .delete_with_auth(&format!("/api/users/{}", owner.id), &admin.token)
        .await;
    deleted.assert_status(StatusCode::OK);
    let body: serde_json::Value = deleted.json();
    assert_eq!(body["id"], owner.id);

    client
        .delete_with_auth(&format!("/api/users/{}", owner.id), &admin.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    other.cleanup(&state).await;
    admin.cleanup(&state).await;
}
