use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{SnapshotError, StorageError};
use crate::record::{Cell, Column, Snapshot, TableSchema};
use crate::traits::{History, SnapshotStore};

/// Snapshot store backed by two CSV files, one per generation.
///
/// Each file has a header row; the identifier column comes first and the
/// remaining columns follow in snapshot order. Missing numeric values are
/// written as empty cells.
#[derive(Debug, Clone)]
pub struct CsvSnapshotStore {
    previous: PathBuf,
    current: PathBuf,
    schema: TableSchema,
}

impl CsvSnapshotStore {
    pub fn new(previous: impl Into<PathBuf>, current: impl Into<PathBuf>, schema: TableSchema) -> Self {
        Self {
            previous: previous.into(),
            current: current.into(),
            schema,
        }
    }

    /// Fail when both generations name the same file.
    fn ensure_distinct(&self) -> Result<(), StorageError> {
        let same = self.previous == self.current
            || matches!(
                (fs::canonicalize(&self.previous), fs::canonicalize(&self.current)),
                (Ok(a), Ok(b)) if a == b
            );
        if same {
            return Err(StorageError::SharedGeneration {
                path: self.current.clone(),
            });
        }
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Option<Snapshot>, StorageError> {
        match File::open(path) {
            Ok(file) => read_snapshot_from(file, path, &self.schema).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl SnapshotStore for CsvSnapshotStore {
    fn history(&self) -> Result<History, StorageError> {
        self.ensure_distinct()?;
        let previous = exists(&self.previous)?;
        let current = exists(&self.current)?;
        Ok(if previous || current {
            History::HasHistory {
                pending_rotation: current,
            }
        } else {
            History::NoHistory
        })
    }

    fn load_previous(&self) -> Result<Option<Snapshot>, StorageError> {
        self.load(&self.previous)
    }

    fn load_current(&self) -> Result<Option<Snapshot>, StorageError> {
        self.load(&self.current)
    }

    fn persist_initial(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.ensure_distinct()?;
        write_snapshot(&self.previous, snapshot)?;
        // A stale current file would otherwise be promoted over this one.
        match fs::remove_file(&self.current) {
            Ok(()) => tracing::warn!(path = %self.current.display(), "removed stale current snapshot"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.current.clone(),
                    source,
                })
            }
        }
        tracing::info!(
            path = %self.previous.display(),
            rows = snapshot.len(),
            "initialized snapshot history"
        );
        Ok(())
    }

    fn persist_current(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        write_snapshot(&self.current, snapshot)?;
        tracing::info!(
            path = %self.current.display(),
            rows = snapshot.len(),
            "persisted current snapshot"
        );
        Ok(())
    }

    fn rotate(&mut self) -> Result<bool, StorageError> {
        self.ensure_distinct()?;
        // A single rename replaces the previous generation atomically.
        match fs::rename(&self.current, &self.previous) {
            Ok(()) => {
                tracing::info!(
                    from = %self.current.display(),
                    to = %self.previous.display(),
                    "rotated snapshot generations"
                );
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !exists(&self.current)? => Ok(false),
            Err(source) => Err(StorageError::Rotation {
                from: self.current.clone(),
                to: self.previous.clone(),
                source,
            }),
        }
    }
}

fn exists(path: &Path) -> Result<bool, StorageError> {
    path.try_exists().map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_error(path: &Path, err: csv::Error) -> StorageError {
    StorageError::Csv {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Read a persisted snapshot.
///
/// Column kinds come from `schema`; header columns the schema does not know
/// load as text so that a later diff can report the drift.
pub fn read_snapshot(path: &Path, schema: &TableSchema) -> Result<Snapshot, StorageError> {
    let file = File::open(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_snapshot_from(file, path, schema)
}

fn read_snapshot_from<R: Read>(
    reader: R,
    path: &Path,
    schema: &TableSchema,
) -> Result<Snapshot, StorageError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().map_err(|e| csv_error(path, e))?.clone();

    let key_idx = headers
        .iter()
        .position(|h| h == schema.key_column)
        .ok_or_else(|| StorageError::MissingColumn {
            path: path.to_path_buf(),
            column: schema.key_column.clone(),
        })?;

    let columns: Vec<(usize, Column)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != key_idx)
        .map(|(i, name)| {
            let column = schema
                .column(name)
                .cloned()
                .unwrap_or_else(|| Column::text(name));
            (i, column)
        })
        .collect();

    let mut snapshot = Snapshot::with_columns(
        &schema.key_column,
        columns.iter().map(|(_, c)| c.clone()).collect(),
    );

    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let id = record.get(key_idx).unwrap_or_default().trim();
        if id.is_empty() {
            tracing::warn!(
                path = %path.display(),
                line = line + 2,
                "skipping snapshot row without an identifier"
            );
            continue;
        }
        let cells = columns
            .iter()
            .map(|(i, column)| Cell::parse(record.get(*i).unwrap_or_default(), column))
            .collect();
        snapshot.insert(id, cells).map_err(|e| match e {
            SnapshotError::DuplicateIdentifier(id) => StorageError::DuplicateIdentifier {
                path: path.to_path_buf(),
                id,
            },
            other => StorageError::Snapshot(other),
        })?;
    }

    Ok(snapshot)
}

/// Write a snapshot as CSV.
///
/// The data goes to a temporary file next to `path` which is renamed over
/// `path` only once fully written and flushed.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), StorageError> {
    let io_error = |source: io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_error)?;

    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        let header = std::iter::once(snapshot.key_column())
            .chain(snapshot.columns().iter().map(|c| c.name.as_str()));
        writer.write_record(header).map_err(|e| csv_error(path, e))?;
        for (id, cells) in snapshot.rows() {
            let row = std::iter::once(id.to_string()).chain(cells.iter().map(Cell::to_field));
            writer.write_record(row).map_err(|e| csv_error(path, e))?;
        }
        writer.flush().map_err(io_error)?;
    }
    tmp.as_file_mut().flush().map_err(io_error)?;
    tmp.as_file().sync_all().map_err(io_error)?;

    tmp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
