use crate::error::StorageError;
use crate::record::Snapshot;
use crate::traits::{History, SnapshotStore};

/// In-process snapshot store. Holds both generations in memory; used for
/// dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    previous: Option<Snapshot>,
    current: Option<Snapshot>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds the given generations.
    pub fn with_generations(previous: Option<Snapshot>, current: Option<Snapshot>) -> Self {
        Self { previous, current }
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn history(&self) -> Result<History, StorageError> {
        Ok(match (&self.previous, &self.current) {
            (None, None) => History::NoHistory,
            (_, current) => History::HasHistory {
                pending_rotation: current.is_some(),
            },
        })
    }

    fn load_previous(&self) -> Result<Option<Snapshot>, StorageError> {
        Ok(self.previous.clone())
    }

    fn load_current(&self) -> Result<Option<Snapshot>, StorageError> {
        Ok(self.current.clone())
    }

    fn persist_initial(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.previous = Some(snapshot.clone());
        self.current = None;
        Ok(())
    }

    fn persist_current(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.current = Some(snapshot.clone());
        Ok(())
    }

    fn rotate(&mut self) -> Result<bool, StorageError> {
        match self.current.take() {
            Some(current) => {
                self.previous = Some(current);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
