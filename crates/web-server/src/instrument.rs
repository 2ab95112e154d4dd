use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use telemetry::Metrics;

/// `path` label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Records one latency observation and one count for every request, keyed by
/// method, route template and final status.
///
/// The status is read from the response the inner service produced, so error
/// responses built by extractors or `AppError` are observed like any other.
pub async fn track_metrics(
    State(metrics): State<Arc<Metrics>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned());

    let response = next.run(req).await;

    metrics.observe_request(
        method.as_str(),
        &path,
        response.status().as_u16(),
        start.elapsed(),
    );
    response
}
