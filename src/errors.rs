use std::path::Path;

use thiserror::Error;

/// Errors surfaced to callers of the data pipeline.
///
/// An empty filter result is not an error; check [`SalesTable::is_empty`]
/// instead.
///
/// [`SalesTable::is_empty`]: crate::data::model::SalesTable::is_empty
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data at '{path}' is unavailable: {reason}")]
    DataUnavailable { path: String, reason: String },
}

impl DataError {
    /// Wrap a parse/IO failure for `path`, keeping the full context chain.
    pub fn unavailable(path: &Path, err: &anyhow::Error) -> Self {
        DataError::DataUnavailable {
            path: path.display().to_string(),
            reason: format!("{err:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
