use std::io;

/// Alias for `Result<T, ArchiveError>`.
pub(crate) type ArchiveResult<T> = Result<T, ArchiveError>;

/// Infrastructure failures while accessing the OCF ZIP container.
///
/// These never represent publication rule violations by themselves; the
/// stage observing one converts it into the appropriate message
/// (`PKG-008`, `RSC-001`, `RSC-004`).
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub(crate) enum ArchiveError {
    /// The archive itself is unreadable: unsupported format or malformed
    /// central directory.
    #[error("[UnreadableArchive]: {source}")]
    Unreadable {
        /// The root cause of this error.
        source: io::Error,
    },

    /// The requested entry does not exist in the archive.
    #[error("[NotFound - `{path}`]: entry does not exist")]
    NotFound { path: String },

    /// The entry exists but its data cannot be decompressed or read.
    #[error("[CannotRead - `{path}`]: {source}")]
    CannotRead {
        /// The root cause of this error.
        source: io::Error,
        path: String,
    },

    /// The archive lock was poisoned by a panicking reader.
    #[error("[Poisoned]: archive lock poisoned")]
    Poisoned,
}

impl ArchiveError {
    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::NotFound { .. })
    }
}
