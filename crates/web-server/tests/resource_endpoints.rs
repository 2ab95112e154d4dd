//! End-to-end behaviour of the `/api/users` and `/api/orders` handlers over
//! in-memory stores.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use common::{failing_app, send, send_json, test_app};
use rstest::rstest;

const ACCOUNT_BODY: &str = r#"{"name":"A","email":"a@x.com"}"#;
const ORDER_BODY: &str = r#"{"user_id":1,"amount":-12.5,"description":"refund"}"#;

#[tokio::test]
async fn account_lifecycle() {
    let app = test_app();

    let (status, created) =
        send_json(&app.router, Method::POST, "/api/users", Some(ACCOUNT_BODY)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "A");
    assert_eq!(created["email"], "a@x.com");
    let id = created["id"].as_i64().expect("id must be an integer");
    let created_at = created["created_at"].as_str().expect("created_at must be a string");
    assert!(created_at.parse::<DateTime<Utc>>().is_ok());

    let uri = format!("/api/users/{id}");
    let (status, fetched) = send_json(&app.router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, body) = send(&app.router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, body) = send(&app.router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "not found");
}

#[tokio::test]
async fn transaction_round_trips_its_fields() {
    let app = test_app();

    let (status, created) =
        send_json(&app.router, Method::POST, "/api/orders", Some(ORDER_BODY)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user_id"], 1);
    assert_eq!(created["amount"], -12.5);
    assert_eq!(created["description"], "refund");
    assert!(created["id"].is_i64());
    assert!(created["created_at"].is_string());

    let uri = format!("/api/orders/{}", created["id"]);
    let (status, fetched) = send_json(&app.router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[rstest]
#[case("/api/users")]
#[case("/api/orders")]
#[tokio::test]
async fn empty_list_is_an_empty_array(#[case] path: &str) {
    let app = test_app();
    let (status, body) = send(&app.router, Method::GET, path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn list_is_capped_at_one_hundred_newest_first() {
    let app = test_app();
    for i in 0..105 {
        let body = format!(r#"{{"name":"u{i}","email":"u{i}@x.com"}}"#);
        let (status, _) = send(&app.router, Method::POST, "/api/users", Some(&body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, listed) = send_json(&app.router, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 100);
    assert_eq!(listed[0]["name"], "u104");
    let ids: Vec<i64> = listed.iter().map(|v| v["id"].as_i64().unwrap()).collect();
    assert!(ids.windows(2).all(|w| w[0] > w[1]));
}

#[rstest]
#[case("/api/users/9999999", ACCOUNT_BODY)]
#[case("/api/orders/9999999", ORDER_BODY)]
#[tokio::test]
async fn update_of_a_missing_row_is_still_no_content(#[case] uri: &str, #[case] body: &str) {
    let app = test_app();
    let (status, text) = send(&app.router, Method::PUT, uri, Some(body)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(text.is_empty());
}

#[rstest]
#[case("/api/users/123456789")]
#[case("/api/orders/123456789")]
#[tokio::test]
async fn delete_is_idempotent(#[case] uri: &str) {
    let app = test_app();
    let (first, _) = send(&app.router, Method::DELETE, uri, None).await;
    let (second, _) = send(&app.router, Method::DELETE, uri, None).await;
    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NO_CONTENT);
}

#[rstest]
#[case("/api/users/987654321")]
#[case("/api/orders/987654321")]
#[tokio::test]
async fn never_issued_id_is_not_found(#[case] uri: &str) {
    let app = test_app();
    let (status, body) = send(&app.router, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "not found");
}

#[tokio::test]
async fn update_replaces_the_whole_record() {
    let app = test_app();
    let (_, created) =
        send_json(&app.router, Method::POST, "/api/users", Some(ACCOUNT_BODY)).await;
    let uri = format!("/api/users/{}", created["id"]);

    let (status, _) = send(&app.router, Method::PUT, &uri, Some(r#"{"name":"B"}"#)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, fetched) = send_json(&app.router, Method::GET, &uri, None).await;
    assert_eq!(fetched["name"], "B");
    assert_eq!(fetched["email"], "");
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["created_at"], created["created_at"]);
}

#[tokio::test]
async fn null_fields_are_stored_as_zero_values() {
    let app = test_app();

    let (status, created) = send_json(
        &app.router,
        Method::POST,
        "/api/users",
        Some(r#"{"name":"A","email":null}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "A");
    assert_eq!(created["email"], "");

    let (status, created) = send_json(
        &app.router,
        Method::POST,
        "/api/orders",
        Some(r#"{"user_id":null,"amount":null,"description":"d"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user_id"], 0);
    assert_eq!(created["amount"], 0.0);

    let uri = format!("/api/orders/{}", created["id"]);
    let (status, _) = send(&app.router, Method::PUT, &uri, Some(r#"{"description":null}"#)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, fetched) = send_json(&app.router, Method::GET, &uri, None).await;
    assert_eq!(fetched["description"], "");
}

#[rstest]
#[case(Method::POST, "/api/users", "not json")]
#[case(Method::POST, "/api/users", "")]
#[case(Method::POST, "/api/orders", r#"{"amount":"lots"}"#)]
#[case(Method::PUT, "/api/users/1", "{")]
#[case(Method::PUT, "/api/orders/1", r#"{"user_id":"one"}"#)]
#[tokio::test]
async fn undecodable_bodies_are_rejected_before_the_store(
    #[case] method: Method,
    #[case] uri: &str,
    #[case] body: &str,
) {
    let app = test_app();
    let (status, text) = send(&app.router, method, uri, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "bad request");
    assert_eq!(app.metrics.store_observations(), 0);
}

#[rstest]
#[case(Method::GET, "/api/users/abc")]
#[case(Method::DELETE, "/api/orders/1.5")]
#[case(Method::GET, "/api/orders/12abc")]
#[case(Method::GET, "/api/users/%201%20")]
#[tokio::test]
async fn malformed_ids_are_client_errors(#[case] method: Method, #[case] uri: &str) {
    let app = test_app();
    let (status, text) = send(&app.router, method, uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.starts_with("invalid id: "), "{text}");
    assert_eq!(app.metrics.store_observations(), 0);
}

#[tokio::test]
async fn malformed_id_on_update_is_a_client_error() {
    let app = test_app();
    let (status, _) = send(&app.router, Method::PUT, "/api/users/abc", Some(ACCOUNT_BODY)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[case(Method::POST, "/api/users", Some(ACCOUNT_BODY))]
#[case(Method::GET, "/api/users", None)]
#[case(Method::GET, "/api/orders/1", None)]
#[case(Method::PUT, "/api/orders/1", Some(ORDER_BODY))]
#[case(Method::DELETE, "/api/users/1", None)]
#[tokio::test]
async fn store_failures_surface_their_text(
    #[case] method: Method,
    #[case] uri: &str,
    #[case] body: Option<&str>,
) {
    let app = failing_app("connection refused");
    let (status, text) = send(&app.router, method, uri, body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text, "database unavailable: connection refused");
}

#[tokio::test]
async fn accounts_and_transactions_are_independent() {
    let app = test_app();
    send(&app.router, Method::POST, "/api/users", Some(ACCOUNT_BODY)).await;

    let (_, orders) = send(&app.router, Method::GET, "/api/orders", None).await;
    assert_eq!(orders, "[]");
}
