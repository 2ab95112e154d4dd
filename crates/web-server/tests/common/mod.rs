//! Shared helpers for the HTTP integration tests.
//!
//! Every test gets its own router over fresh in-memory stores and its own
//! metrics registry, so tests never observe each other's traffic.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use core_types::{Account, Transaction};
use database::MemoryStore;
use http_body_util::BodyExt;
use telemetry::Metrics;
use tower::ServiceExt;
use web_server::{AppState, app};

pub struct TestApp {
    pub router: Router,
    pub metrics: Arc<Metrics>,
    pub ready: Arc<AtomicBool>,
}

/// A router over empty, healthy in-memory stores.
pub fn test_app() -> TestApp {
    let metrics = Arc::new(Metrics::new());
    build(
        Arc::new(MemoryStore::<Account>::new(Arc::clone(&metrics))),
        Arc::new(MemoryStore::<Transaction>::new(Arc::clone(&metrics))),
        metrics,
        true,
    )
}

/// A router whose stores fail every call with `message`.
pub fn failing_app(message: &str) -> TestApp {
    let metrics = Arc::new(Metrics::new());
    build(
        Arc::new(MemoryStore::<Account>::unavailable(Arc::clone(&metrics), message)),
        Arc::new(MemoryStore::<Transaction>::unavailable(Arc::clone(&metrics), message)),
        metrics,
        false,
    )
}

fn build(
    accounts: Arc<MemoryStore<Account>>,
    transactions: Arc<MemoryStore<Transaction>>,
    metrics: Arc<Metrics>,
    ready: bool,
) -> TestApp {
    let ready = Arc::new(AtomicBool::new(ready));
    let router = app(AppState {
        accounts,
        transactions,
        metrics: Arc::clone(&metrics),
        ready: Arc::clone(&ready),
    });
    TestApp {
        router,
        metrics,
        ready,
    }
}

/// Sends one request through the router and returns status and body text.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn send_json(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let (status, text) = send(router, method, uri, body).await;
    let value = serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("expected JSON from {uri}, got {text:?}: {e}"));
    (status, value)
}
