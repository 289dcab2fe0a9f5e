//! Named snapshots of encoded documents, kept as one JSON list under a
//! fixed key of a small key-value store.

mod entry;
mod history;
mod store;

pub use crate::entry::*;
pub use crate::history::*;
pub use crate::store::*;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("nothing to save: content is empty")]
    EmptyContent,
    #[error("no history entry with id {0}")]
    NotFound(String),
    #[error("history storage failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored history is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub type HistoryResult<T> = Result<T, HistoryError>;
