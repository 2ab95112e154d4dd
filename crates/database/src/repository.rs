use crate::error::DbError;
use crate::record::{Record, id_at, timestamp_at};
use crate::store::Store;
use async_trait::async_trait;
use core_types::EntityId;
use sqlx::PgPool;
use sqlx::postgres::PgRow;
use std::sync::Arc;
use telemetry::Metrics;

/// The `DbRepository` is the PostgreSQL implementation of [`Store`] for every
/// [`Record`] kind. It encapsulates all SQL execution and row mapping.
#[derive(Clone)]
pub struct DbRepository {
    pool: PgPool,
    metrics: Arc<Metrics>,
}

/// Turns a driver-level decode failure into a mapping error for `R`.
fn mapped<R: Record, T>(result: Result<T, sqlx::Error>) -> Result<T, DbError> {
    result.map_err(|e| DbError::Mapping {
        table: R::TABLE,
        message: e.to_string(),
    })
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self { pool, metrics }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl<R: Record> Store<R> for DbRepository {
    async fn create(&self, fields: R::Fields) -> Result<R, DbError> {
        let query = R::bind_fields(sqlx::query(R::INSERT), &fields);
        let row: PgRow = self.metrics.time_store(query.fetch_one(&self.pool)).await?;

        let id = mapped::<R, _>(id_at(&row, 0))?;
        let created_at = mapped::<R, _>(timestamp_at(&row, 1))?;
        Ok(R::from_parts(id, created_at, fields))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<R>, DbError> {
        let rows = self
            .metrics
            .time_store(sqlx::query(R::SELECT_RECENT).bind(limit).fetch_all(&self.pool))
            .await?;

        rows.iter().map(|row| mapped::<R, _>(R::from_row(row))).collect()
    }

    async fn find(&self, id: EntityId) -> Result<R, DbError> {
        let row = self
            .metrics
            .time_store(sqlx::query(R::SELECT_ONE).bind(id).fetch_one(&self.pool))
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => DbError::NotFound,
                other => other.into(),
            })?;

        mapped::<R, _>(R::from_row(&row))
    }

    async fn update(&self, id: EntityId, fields: R::Fields) -> Result<u64, DbError> {
        let query = R::bind_fields(sqlx::query(R::UPDATE), &fields).bind(id);
        let result = self.metrics.time_store(query.execute(&self.pool)).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: EntityId) -> Result<u64, DbError> {
        let result = self
            .metrics
            .time_store(sqlx::query(R::DELETE).bind(id).execute(&self.pool))
            .await?;
        Ok(result.rows_affected())
    }
}
