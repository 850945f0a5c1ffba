use std::path::PathBuf;

/// All errors that can be returned by a SnapshotStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing a snapshot generation failed.
    #[error("snapshot I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted snapshot is not well-formed CSV.
    #[error("malformed snapshot '{}': {message}", path.display())]
    Csv { path: PathBuf, message: String },

    /// Promoting the current generation to previous failed. Neither
    /// generation has been overwritten when this is returned.
    #[error(
        "snapshot rotation failed moving '{}' to '{}': {source}",
        from.display(),
        to.display()
    )]
    Rotation {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Both generations resolve to the same file, so rotating would
    /// overwrite the previous generation with the current one.
    #[error("previous and current snapshots both point at '{}'", path.display())]
    SharedGeneration { path: PathBuf },

    /// The persisted snapshot has no identifier column.
    #[error("snapshot '{}' has no '{column}' column", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// The persisted snapshot lists the same identifier twice.
    #[error("snapshot '{}' contains identifier '{id}' more than once", path.display())]
    DuplicateIdentifier { path: PathBuf, id: String },

    /// A row could not be added to an in-memory snapshot.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Violations of the one-row-per-identifier table contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("identifier '{0}' is already present in the snapshot")]
    DuplicateIdentifier(String),

    #[error("row '{id}' has {found} cells, expected {expected}")]
    Arity {
        id: String,
        expected: usize,
        found: usize,
    },
}
