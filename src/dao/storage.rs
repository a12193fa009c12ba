use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the command.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored record exists but could not be decoded into its model.
    #[error("malformed record under `{key}`")]
    Malformed {
        /// Key of the unreadable record.
        key: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// A model could not be encoded before being written.
    #[error("failed to encode record for `{key}`")]
    Encode {
        /// Key the record was destined for.
        key: String,
        /// Encoder failure.
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
