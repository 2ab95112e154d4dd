use chrono::{DateTime, NaiveDateTime, Utc};
use core_types::{Account, AccountFields, EntityId, Transaction, TransactionFields};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};

/// A bound statement ready to be executed against the pool.
pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// A resource kind the store gateway knows how to persist.
///
/// Each implementation supplies its static SQL and its positional row
/// mapping. Column order in every `SELECT` is `id`, the writable fields in
/// declaration order, then `created_at`; `from_row` relies on it.
pub trait Record: Sized + Clone + Send + Sync + Unpin + 'static {
    /// The client-writable columns.
    type Fields: Clone + Send + Sync + 'static;

    const TABLE: &'static str;
    /// Binds the writable fields, returns `id, created_at`.
    const INSERT: &'static str;
    /// `$1` is the row cap.
    const SELECT_RECENT: &'static str;
    /// `$1` is the id.
    const SELECT_ONE: &'static str;
    /// Binds the writable fields, then the id.
    const UPDATE: &'static str;
    /// `$1` is the id.
    const DELETE: &'static str;

    fn bind_fields<'q>(query: PgQuery<'q>, fields: &Self::Fields) -> PgQuery<'q>;
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;
    fn from_parts(id: EntityId, created_at: DateTime<Utc>, fields: Self::Fields) -> Self;
    fn created_at(&self) -> DateTime<Utc>;
}

/// Reads an identifier column, accepting both `INT8` and `INT4` schemas.
pub(crate) fn id_at(row: &PgRow, index: usize) -> Result<EntityId, sqlx::Error> {
    match row.try_get::<i64, _>(index) {
        Err(sqlx::Error::ColumnDecode { .. }) => row.try_get::<i32, _>(index).map(i64::from),
        other => other,
    }
}

/// Reads a creation timestamp, accepting both `TIMESTAMPTZ` and `TIMESTAMP`
/// (the latter is taken to be UTC).
pub(crate) fn timestamp_at(row: &PgRow, index: usize) -> Result<DateTime<Utc>, sqlx::Error> {
    match row.try_get::<DateTime<Utc>, _>(index) {
        Err(sqlx::Error::ColumnDecode { .. }) => row
            .try_get::<NaiveDateTime, _>(index)
            .map(|naive| naive.and_utc()),
        other => other,
    }
}

impl Record for Account {
    type Fields = AccountFields;

    const TABLE: &'static str = "users";
    const INSERT: &'static str =
        "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id, created_at";
    const SELECT_RECENT: &'static str =
        "SELECT id, name, email, created_at FROM users ORDER BY id DESC LIMIT $1";
    const SELECT_ONE: &'static str = "SELECT id, name, email, created_at FROM users WHERE id = $1";
    const UPDATE: &'static str = "UPDATE users SET name = $1, email = $2 WHERE id = $3";
    const DELETE: &'static str = "DELETE FROM users WHERE id = $1";

    fn bind_fields<'q>(query: PgQuery<'q>, fields: &AccountFields) -> PgQuery<'q> {
        query.bind(fields.name.clone()).bind(fields.email.clone())
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Account {
            id: id_at(row, 0)?,
            name: row.try_get(1)?,
            email: row.try_get(2)?,
            created_at: timestamp_at(row, 3)?,
        })
    }

    fn from_parts(id: EntityId, created_at: DateTime<Utc>, fields: AccountFields) -> Self {
        Account::from_parts(id, created_at, fields)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for Transaction {
    type Fields = TransactionFields;

    const TABLE: &'static str = "orders";
    const INSERT: &'static str = "INSERT INTO orders (user_id, amount, description) VALUES ($1, $2, $3) RETURNING id, created_at";
    const SELECT_RECENT: &'static str = "SELECT id, user_id, amount, description, created_at FROM orders ORDER BY id DESC LIMIT $1";
    const SELECT_ONE: &'static str =
        "SELECT id, user_id, amount, description, created_at FROM orders WHERE id = $1";
    const UPDATE: &'static str =
        "UPDATE orders SET user_id = $1, amount = $2, description = $3 WHERE id = $4";
    const DELETE: &'static str = "DELETE FROM orders WHERE id = $1";

    fn bind_fields<'q>(query: PgQuery<'q>, fields: &TransactionFields) -> PgQuery<'q> {
        query
            .bind(fields.user_id)
            .bind(fields.amount)
            .bind(fields.description.clone())
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Transaction {
            id: id_at(row, 0)?,
            user_id: id_at(row, 1)?,
            amount: row.try_get(2)?,
            description: row.try_get(3)?,
            created_at: timestamp_at(row, 4)?,
        })
    }

    fn from_parts(id: EntityId, created_at: DateTime<Utc>, fields: TransactionFields) -> Self {
        Transaction::from_parts(id, created_at, fields)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
