use crate::{error::AppError, AppState};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use core_types::{parse_entity_id, Account, Transaction};
use database::{Record, Store, LIST_LIMIT};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use telemetry::PROMETHEUS_CONTENT_TYPE;

/// A resource kind served under `/api/{NAME}s`.
///
/// Both kinds share one set of handlers; this trait only says which store in
/// the `AppState` holds them.
pub trait Resource: Record<Fields: DeserializeOwned> + Serialize {
    const NAME: &'static str;

    fn store(state: &AppState) -> &dyn Store<Self>;
}

impl Resource for Account {
    const NAME: &'static str = "user";

    fn store(state: &AppState) -> &dyn Store<Self> {
        state.accounts.as_ref()
    }
}

impl Resource for Transaction {
    const NAME: &'static str = "order";

    fn store(state: &AppState) -> &dyn Store<Self> {
        state.transactions.as_ref()
    }
}

/// A JSON request body.
///
/// Unlike `axum::Json` this ignores the `Content-Type` header and turns every
/// failure (unreadable body, invalid JSON, wrongly typed field) into a 400.
pub struct JsonPayload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonPayload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Decode(e.body_text()))?;
        serde_json::from_slice(&bytes)
            .map(JsonPayload)
            .map_err(|e| AppError::Decode(e.to_string()))
    }
}

/// # POST /api/{resource}s
pub async fn create<R: Resource>(
    State(state): State<Arc<AppState>>,
    JsonPayload(fields): JsonPayload<R::Fields>,
) -> Result<(StatusCode, Json<R>), AppError> {
    let record = R::store(&state).create(fields).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// # GET /api/{resource}s
/// The newest rows, highest id first, capped at `LIST_LIMIT`.
pub async fn list<R: Resource>(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<R>>, AppError> {
    let records = R::store(&state).list_recent(LIST_LIMIT).await?;
    Ok(Json(records))
}

/// # GET /api/{resource}s/:id
pub async fn get<R: Resource>(
    Path(raw_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<R>, AppError> {
    let id = parse_entity_id(&raw_id)?;
    let record = R::store(&state).find(id).await?;
    Ok(Json(record))
}

/// # PUT /api/{resource}s/:id
/// Replaces every writable field. Answers 204 whether or not the row exists.
pub async fn update<R: Resource>(
    Path(raw_id): Path<String>,
    State(state): State<Arc<AppState>>,
    JsonPayload(fields): JsonPayload<R::Fields>,
) -> Result<StatusCode, AppError> {
    let id = parse_entity_id(&raw_id)?;
    let affected = R::store(&state).update(id, fields).await?;
    tracing::debug!(resource = R::NAME, id, affected, "Update applied.");
    Ok(StatusCode::NO_CONTENT)
}

/// # DELETE /api/{resource}s/:id
/// Idempotent: deleting a missing row is still a 204.
pub async fn delete<R: Resource>(
    Path(raw_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    let id = parse_entity_id(&raw_id)?;
    let affected = R::store(&state).delete(id).await?;
    tracing::debug!(resource = R::NAME, id, affected, "Delete applied.");
    Ok(StatusCode::NO_CONTENT)
}

/// # GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

/// # GET /health
/// 200 once the startup probe (or the background re-probe) reached the store.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    if state.ready.load(Ordering::Relaxed) {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}
