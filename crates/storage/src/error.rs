use std::path::PathBuf;

/// All errors that can be returned while saving or loading a distribution.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The file could not be opened, read or written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level JSON value is not an object.
    #[error("expected a JSON object mapping outcomes to counts")]
    NotAnObject,

    /// A key that is neither an integer array nor a bare integer.
    #[error("invalid outcome key {0:?}: expected a JSON array of integers or an integer")]
    InvalidKey(String),

    /// A count that is not a finite non-negative number.
    #[error("invalid count for outcome {key:?}: {value}")]
    InvalidCount { key: String, value: String },
}
