use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: any of these aborts a run before a report exists.
///
/// Per-file problems (bad JSON, unreadable file, failed upload) are never
/// `SyncError`s; they become entries in the [`crate::report::SyncReport`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("content root not found: {}", .0.display())]
    ContentRootMissing(PathBuf),

    #[error("content root is not a directory: {}", .0.display())]
    ContentRootNotADirectory(PathBuf),

    #[error("content root cannot be accessed: {}: {source}", path.display())]
    ContentRootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("path cannot be mapped to a storage key (not valid UTF-8): {}", .0.display())]
    UnmappablePath(PathBuf),

    #[error("concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),
}

