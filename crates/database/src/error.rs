use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    /// Any failure reported by the driver or the server. The message is the
    /// driver's own text.
    #[error("{0}")]
    Query(#[from] sqlx::Error),

    #[error("failed to map {table} row: {message}")]
    Mapping { table: &'static str, message: String },

    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}
