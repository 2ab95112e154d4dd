use crate::error::DbError;
use crate::record::Record;
use async_trait::async_trait;
use core_types::EntityId;

/// Maximum number of rows a list call returns.
pub const LIST_LIMIT: i64 = 100;

/// Persistence operations for one resource kind.
///
/// Every method is a single statement; nothing is cached between calls.
/// `update` and `delete` report the number of affected rows and leave it to
/// the caller to decide whether zero is an error.
#[async_trait]
pub trait Store<R: Record>: Send + Sync {
    /// Inserts `fields`; the store assigns the id and creation timestamp.
    async fn create(&self, fields: R::Fields) -> Result<R, DbError>;

    /// The newest `limit` rows, highest id first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<R>, DbError>;

    /// Exactly one row, or `DbError::NotFound`.
    async fn find(&self, id: EntityId) -> Result<R, DbError>;

    /// Overwrites every writable field of row `id`.
    async fn update(&self, id: EntityId, fields: R::Fields) -> Result<u64, DbError>;

    async fn delete(&self, id: EntityId) -> Result<u64, DbError>;
}
