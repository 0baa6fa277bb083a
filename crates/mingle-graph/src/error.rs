use thiserror::Error;

/// A node's property bag did not match the shape the caller asked for.
#[derive(Debug, Error)]
#[error("node {id} ({label}) failed to decode: {source}")]
pub struct DecodeError {
    pub id: i64,
    pub label: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("graph transaction failed: {0}")]
    TransactionFailed(#[from] rusqlite::Error),
    #[error("graph store unavailable: {0}")]
    Unavailable(String),
}
