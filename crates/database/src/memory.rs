use crate::error::DbError;
use crate::record::Record;
use crate::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use core_types::EntityId;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use telemetry::Metrics;

/// An in-process [`Store`] with the same observable contract as
/// [`DbRepository`](crate::DbRepository): store-assigned ids and timestamps,
/// newest-first listing, row counts from update and delete, and one latency
/// observation per call.
///
/// Rows live only as long as the value does. Test suites use it to drive the
/// HTTP layer without a database.
pub struct MemoryStore<R: Record> {
    rows: DashMap<EntityId, R>,
    next_id: AtomicI64,
    metrics: Arc<Metrics>,
    failure: Option<String>,
}

impl<R: Record> MemoryStore<R> {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicI64::new(0),
            metrics,
            failure: None,
        }
    }

    /// A store whose every call fails with `DbError::Unavailable(message)`,
    /// for exercising the error path.
    pub fn unavailable(metrics: Arc<Metrics>, message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(metrics)
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn check(&self) -> Result<(), DbError> {
        match &self.failure {
            Some(message) => Err(DbError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn insert(&self, fields: R::Fields) -> Result<R, DbError> {
        self.check()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let record = R::from_parts(id, Utc::now(), fields);
        self.rows.insert(id, record.clone());
        Ok(record)
    }

    fn newest(&self, limit: i64) -> Result<Vec<R>, DbError> {
        self.check()?;
        let mut rows: Vec<(EntityId, R)> = self
            .rows
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows.into_iter().map(|(_, record)| record).collect())
    }

    fn get(&self, id: EntityId) -> Result<R, DbError> {
        self.check()?;
        self.rows
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(DbError::NotFound)
    }

    fn replace(&self, id: EntityId, fields: R::Fields) -> Result<u64, DbError> {
        self.check()?;
        match self.rows.get_mut(&id) {
            Some(mut row) => {
                let created_at = row.created_at();
                *row = R::from_parts(id, created_at, fields);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn remove(&self, id: EntityId) -> Result<u64, DbError> {
        self.check()?;
        Ok(self.rows.remove(&id).map_or(0, |_| 1))
    }
}

#[async_trait]
impl<R: Record> Store<R> for MemoryStore<R> {
    async fn create(&self, fields: R::Fields) -> Result<R, DbError> {
        self.metrics.time_store(async { self.insert(fields) }).await
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<R>, DbError> {
        self.metrics.time_store(async { self.newest(limit) }).await
    }

    async fn find(&self, id: EntityId) -> Result<R, DbError> {
        self.metrics.time_store(async { self.get(id) }).await
    }

    async fn update(&self, id: EntityId, fields: R::Fields) -> Result<u64, DbError> {
        self.metrics.time_store(async { self.replace(id, fields) }).await
    }

    async fn delete(&self, id: EntityId) -> Result<u64, DbError> {
        self.metrics.time_store(async { self.remove(id) }).await
    }
}
