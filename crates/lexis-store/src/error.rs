use std::path::PathBuf;

/// Errors from snapshot load and save.
///
/// Store operations themselves never fail; bad input yields `false`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error reading or writing a snapshot file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON snapshot could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Text snapshot is malformed.
    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for snapshot operations.
pub type StoreResult<T> = Result<T, StoreError>;
