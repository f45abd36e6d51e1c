//! Typed errors for conditions that abort a run outright.
//!
//! Expected remote failures (transport loss, command rejections, timeouts)
//! never appear here; they flow back as booleans, `Option<ApiResponse>`, or
//! `Outcome` values that callers branch on. `RunError` covers only the fatal
//! setup conditions: job list missing, storage unopenable, bridge unusable.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that end a run before (or instead of) processing chapters.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("chapter list not found at {path}")]
    ChapterListMissing { path: PathBuf },

    #[error("failed to read chapter list at {path}: {source}")]
    ChapterListUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse chapter list at {path}: {source}")]
    ChapterListInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("chapter list at {path} is empty")]
    ChapterListEmpty { path: PathBuf },

    #[error("progress store unavailable: {0}")]
    Store(#[source] anyhow::Error),

    #[error("bridge is not attached and reattachment failed")]
    BridgeUnavailable,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
