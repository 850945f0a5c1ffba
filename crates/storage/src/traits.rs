use crate::error::StorageError;
use crate::record::Snapshot;

/// Whether an earlier run has left a snapshot behind.
///
/// Determined once per run by [`SnapshotStore::history`] and passed along
/// as data; callers must not re-inspect the backing storage to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    /// No generation exists; this run initializes tracking.
    NoHistory,
    /// At least one generation exists. `pending_rotation` is true when a
    /// current generation from an earlier run must be promoted to previous
    /// before this run's snapshot is persisted.
    HasHistory { pending_rotation: bool },
}

impl History {
    pub fn is_initial(&self) -> bool {
        matches!(self, History::NoHistory)
    }
}

/// Storage for the two snapshot generations (previous and current).
///
/// ## Generation lifecycle
///
/// 1. `history()`: inspect the backing storage once at startup.
/// 2. `NoHistory`: `persist_initial(snapshot)` makes the snapshot the sole
///    (previous) generation.
/// 3. `HasHistory`: `rotate()` when pending, then `persist_current(snapshot)`,
///    then `load_previous()` for comparison.
///
/// ## Failure semantics
///
/// `rotate` replaces the previous generation with the current one in a
/// single step. If it fails, both generations are left as they were.
/// `persist_*` never leaves a partially written generation behind.
pub trait SnapshotStore {
    /// Inspect which generations exist.
    fn history(&self) -> Result<History, StorageError>;

    /// Load the previous generation, or `None` if none has been persisted.
    fn load_previous(&self) -> Result<Option<Snapshot>, StorageError>;

    /// Load the current generation, or `None` if none has been persisted.
    fn load_current(&self) -> Result<Option<Snapshot>, StorageError>;

    /// Persist `snapshot` as the first and only generation.
    fn persist_initial(&mut self, snapshot: &Snapshot) -> Result<(), StorageError>;

    /// Persist `snapshot` as the current generation, replacing any existing one.
    fn persist_current(&mut self, snapshot: &Snapshot) -> Result<(), StorageError>;

    /// Promote the current generation to previous, retiring the old previous.
    ///
    /// Returns `Ok(false)` without touching anything when there is no
    /// current generation to promote.
    fn rotate(&mut self) -> Result<bool, StorageError>;
}
