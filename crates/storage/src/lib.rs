mod csv_store;
mod error;
mod memory;
mod record;
mod traits;

pub mod conformance;

pub use csv_store::{read_snapshot, write_snapshot, CsvSnapshotStore};
pub use error::{SnapshotError, StorageError};
pub use memory::MemorySnapshotStore;
pub use record::{Cell, Column, ColumnKind, Snapshot, TableSchema};
pub use traits::{History, SnapshotStore};
