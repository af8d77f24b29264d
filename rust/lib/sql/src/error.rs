use thiserror::Error;

/// Errors raised by the embedded SQL layer.
#[derive(Error, Debug)]
pub enum SQLError {
    #[error("failed to open database: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("statement failed: {0}")]
    Execution(String),

    /// A previous holder of the connection panicked.
    #[error("database connection lock poisoned")]
    Poisoned,
}
