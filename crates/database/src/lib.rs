//! # Tally Database Crate
//!
//! This crate is the store gateway: the only place that talks to PostgreSQL.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** Handlers see the `Store` trait, never SQL. Each resource
//!   kind describes its own statements and row mapping through `Record`.
//! - **Parameterized only:** Every statement is a static SQL string with
//!   bound parameters; no value is ever formatted into SQL text.
//! - **Measured:** Every store call, successful or not, is observed in the
//!   `db_query_duration_seconds` histogram.
//! - **Asynchronous & Pooled:** One `PgPool` is shared by every request; the
//!   pool is the only source of queuing.
//!
//! ## Public API
//!
//! - `connect`: opens (but does not ping) the connection pool.
//! - `ping` / `wait_until_ready`: the bounded startup readiness probe.
//! - `Store`: per-resource create/list/find/update/delete.
//! - `DbRepository`: the PostgreSQL `Store`.
//! - `MemoryStore`: an in-process `Store` with the same contract, behind the
//!   `testing` feature.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod readiness;
pub mod record;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::connect;
pub use error::DbError;
#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryStore;
pub use readiness::{Readiness, ping, wait_until_ready};
pub use record::Record;
pub use repository::DbRepository;
pub use store::{LIST_LIMIT, Store};
