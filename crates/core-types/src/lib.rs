pub mod error;
pub mod id;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use id::{EntityId, parse_entity_id};
pub use structs::{Account, AccountFields, Transaction, TransactionFields};
