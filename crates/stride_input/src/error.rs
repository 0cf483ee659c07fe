use crate::frame::RecordingError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed recording json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid recording name {0:?}")]
    InvalidName(String),

    #[error("recording {0:?} not found")]
    NotFound(String),

    #[error("recording {name:?} is corrupt: {source}")]
    Corrupt {
        name: String,
        #[source]
        source: RecordingError,
    },

    #[error("persistence worker has shut down")]
    WorkerClosed,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
