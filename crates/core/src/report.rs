//! Change report artifacts.
//!
//! A report is an ordered list of named [`Section`] tables. Change runs
//! produce four sections in a fixed order; initialization runs produce only
//! the full current table.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use time::Date;
use trialwatch_storage::Snapshot;

use crate::diff::SnapshotDiff;

pub const ADDED_SECTION: &str = "Added Trials";
pub const DELETED_SECTION: &str = "Deleted Trials";
pub const MODIFIED_SECTION: &str = "Modified Trials";
pub const ALL_SECTION: &str = "All Pulled Trials";

pub const MODIFIED_COLUMNS: [&str; 4] = ["NCT ID", "Field", "Old Trial", "Updated Trial"];

/// Errors from writing a report artifact.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("could not write report '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not serialize report '{}': {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One labeled table of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Section {
    /// A section holding every row of `snapshot`, identifier first.
    pub fn from_snapshot(name: &str, snapshot: &Snapshot) -> Self {
        let columns = std::iter::once(snapshot.key_column().to_string())
            .chain(snapshot.columns().iter().map(|c| c.name.clone()))
            .collect();
        let rows = snapshot
            .rows()
            .map(|(id, cells)| {
                std::iter::once(Value::String(id.to_string()))
                    .chain(cells.iter().map(cell_value))
                    .collect()
            })
            .collect();
        Self {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    /// Long-form before/after table: one row per differing field.
    pub fn from_modified(name: &str, diff: &SnapshotDiff) -> Self {
        let rows = diff
            .modified
            .iter()
            .flat_map(|row| {
                row.fields.iter().map(move |f| {
                    vec![
                        Value::String(row.id.clone()),
                        Value::String(f.column.clone()),
                        cell_value(&f.before),
                        cell_value(&f.after),
                    ]
                })
            })
            .collect();
        Self {
            name: name.to_string(),
            columns: MODIFIED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

fn cell_value<T: Serialize>(cell: &T) -> Value {
    serde_json::to_value(cell).unwrap_or(Value::Null)
}

/// Sections for a comparison run, in report order.
pub fn change_sections(diff: &SnapshotDiff, current: &Snapshot) -> Vec<Section> {
    vec![
        Section::from_snapshot(ADDED_SECTION, &diff.added),
        Section::from_snapshot(DELETED_SECTION, &diff.deleted),
        Section::from_modified(MODIFIED_SECTION, diff),
        Section::from_snapshot(ALL_SECTION, current),
    ]
}

/// Sections for a run that initialized history: only the full table.
pub fn initialization_sections(current: &Snapshot) -> Vec<Section> {
    vec![Section::from_snapshot(ALL_SECTION, current)]
}

/// Destination for report artifacts.
pub trait ArtifactWriter {
    /// Write `sections` as one artifact and return where it landed.
    fn write_artifact(&self, sections: &[Section]) -> Result<PathBuf, ReportError>;
}

#[derive(Debug, Clone)]
enum ReportTarget {
    /// `<dir>/<prefix>_<MMDDYY>.json`
    Dated { dir: PathBuf, prefix: String },
    Fixed(PathBuf),
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    generated: String,
    sections: &'a [Section],
}

/// Writes reports as pretty-printed JSON documents.
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    target: ReportTarget,
    date: Date,
}

impl JsonReportWriter {
    /// Name each report after `prefix` and `date` inside `dir`.
    pub fn dated(dir: impl Into<PathBuf>, prefix: impl Into<String>, date: Date) -> Self {
        Self {
            target: ReportTarget::Dated {
                dir: dir.into(),
                prefix: prefix.into(),
            },
            date,
        }
    }

    /// Always write to `path`.
    pub fn at_path(path: impl Into<PathBuf>, date: Date) -> Self {
        Self {
            target: ReportTarget::Fixed(path.into()),
            date,
        }
    }

    pub fn path(&self) -> PathBuf {
        match &self.target {
            ReportTarget::Dated { dir, prefix } => {
                dir.join(format!("{}_{}.json", prefix, date_stamp(self.date)))
            }
            ReportTarget::Fixed(path) => path.clone(),
        }
    }
}

/// `MMDDYY`, the stamp used in report file names.
pub fn date_stamp(date: Date) -> String {
    format!(
        "{:02}{:02}{:02}",
        u8::from(date.month()),
        date.day(),
        date.year().rem_euclid(100)
    )
}

impl ArtifactWriter for JsonReportWriter {
    fn write_artifact(&self, sections: &[Section]) -> Result<PathBuf, ReportError> {
        let path = self.path();
        let io_error = |source: io::Error| ReportError::Io {
            path: path.clone(),
            source,
        };

        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_error)?;
        }

        let document = ReportDocument {
            generated: self.date.to_string(),
            sections,
        };
        let mut out = BufWriter::new(File::create(&path).map_err(io_error)?);
        serde_json::to_writer_pretty(&mut out, &document).map_err(|source| {
            ReportError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        out.write_all(b"\n").map_err(io_error)?;
        out.flush().map_err(io_error)?;

        tracing::info!(path = %path.display(), sections = sections.len(), "wrote report");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_snapshots;
    use tempfile::TempDir;
    use time::macros::date;
    use trialwatch_storage::{Cell, Column, TableSchema};

    fn schema() -> TableSchema {
        TableSchema::new(
            "NCT ID",
            vec![Column::text("Overall Status"), Column::numeric("Enrollment")],
        )
    }

    fn snap(rows: &[(&str, &str, Option<f64>)]) -> Snapshot {
        let mut s = Snapshot::new(&schema());
        for (id, status, enrollment) in rows {
            s.insert(
                *id,
                vec![
                    Cell::text(*status),
                    enrollment.map(Cell::number).unwrap_or_else(Cell::missing),
                ],
            )
            .unwrap();
        }
        s
    }

    #[test]
    fn change_sections_are_ordered_and_named() {
        let previous = snap(&[("NCT001", "Recruiting", Some(10.0))]);
        let current = snap(&[("NCT001", "Completed", None), ("NCT002", "Recruiting", None)]);
        let diff = diff_snapshots(&previous, &current).unwrap();
        let sections = change_sections(&diff, &current);

        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Added Trials", "Deleted Trials", "Modified Trials", "All Pulled Trials"]
        );
        assert_eq!(sections[0].rows, vec![vec![
            Value::from("NCT002"),
            Value::from("Recruiting"),
            Value::Null
        ]]);
        assert!(sections[1].rows.is_empty());
        assert_eq!(sections[1].columns, vec!["NCT ID", "Overall Status", "Enrollment"]);
        assert_eq!(sections[2].columns, MODIFIED_COLUMNS.to_vec());
        assert_eq!(sections[2].rows.len(), 2);
        assert_eq!(
            sections[2].rows[1],
            vec![
                Value::from("NCT001"),
                Value::from("Enrollment"),
                Value::from(10.0),
                Value::Null
            ]
        );
        assert_eq!(sections[3].rows.len(), 2);
    }

    #[test]
    fn initialization_has_only_the_full_table() {
        let current = snap(&[("NCT001", "Recruiting", Some(1.0))]);
        let sections = initialization_sections(&current);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, ALL_SECTION);
    }

    #[test]
    fn dated_writer_names_file_and_keeps_empty_sections() {
        let dir = TempDir::new().unwrap();
        let writer = JsonReportWriter::dated(dir.path(), "ClinicalTrialChanges", date!(2026 - 03 - 07));
        let empty = snap(&[]);
        let diff = diff_snapshots(&empty, &empty).unwrap();
        let path = writer
            .write_artifact(&change_sections(&diff, &empty))
            .unwrap();

        assert_eq!(path, dir.path().join("ClinicalTrialChanges_030726.json"));
        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["generated"], "2026-03-07");
        let sections = doc["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 4);
        for section in sections {
            assert_eq!(section["rows"], serde_json::json!([]));
            assert!(!section["columns"].as_array().unwrap().is_empty());
        }
    }

    #[test]
    fn fixed_writer_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("report.json");
        let writer = JsonReportWriter::at_path(&path, date!(2026 - 10 - 16));
        let written = writer
            .write_artifact(&initialization_sections(&snap(&[("NCT001", "x", None)])))
            .unwrap();
        assert_eq!(written, path);
        assert!(path.exists());
    }

    #[test]
    fn date_stamp_is_zero_padded() {
        assert_eq!(date_stamp(date!(2009 - 01 - 02)), "010209");
        assert_eq!(date_stamp(date!(2026 - 12 - 31)), "123126");
    }
}
