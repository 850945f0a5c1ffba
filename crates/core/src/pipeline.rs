//! The single run entry point: collect, resolve, persist, diff, report.

use std::path::PathBuf;

use serde::Serialize;
use trialwatch_storage::{History, SnapshotStore, StorageError};

use crate::collect::{collect_terms, StudySource, TermReport};
use crate::diff::{diff_snapshots, DiffError};
use crate::report::{change_sections, initialization_sections, ArtifactWriter, ReportError};
use crate::resolve::resolve_conflicts;

/// Fatal run errors. Fetch failures and schema drift are not fatal; they
/// are recorded in the [`RunSummary`].
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// What one run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// True when no history existed and this run only seeded it.
    pub initialized: bool,
    pub total_records: usize,
    pub added_count: usize,
    pub deleted_count: usize,
    pub modified_count: usize,
    pub unchanged_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_artifact: Option<PathBuf>,
    /// Why the comparison was skipped, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_skipped: Option<String>,
    pub term_reports: Vec<TermReport>,
}

impl RunSummary {
    fn new(total_records: usize, term_reports: Vec<TermReport>) -> Self {
        Self {
            initialized: false,
            total_records,
            added_count: 0,
            deleted_count: 0,
            modified_count: 0,
            unchanged_count: 0,
            output_artifact: None,
            diff_skipped: None,
            term_reports,
        }
    }

    /// Format the summary as human-readable text.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        for t in &self.term_reports {
            match &t.failure {
                Some(failure) => lines.push(format!(
                    "{}: {} record(s) from {} page(s), stopped early: {}",
                    t.term, t.records, t.pages, failure
                )),
                None => lines.push(format!(
                    "{}: {} record(s) from {} page(s)",
                    t.term, t.records, t.pages
                )),
            }
        }
        if self.initialized {
            lines.push(format!(
                "no historic trial data found; initialized tracking with {} trial(s)",
                self.total_records
            ));
        } else if let Some(reason) = &self.diff_skipped {
            lines.push(format!(
                "persisted {} trial(s); comparison skipped: {}",
                self.total_records, reason
            ));
        } else {
            lines.push(format!(
                "{} trial(s): {} added, {} deleted, {} modified, {} unchanged",
                self.total_records,
                self.added_count,
                self.deleted_count,
                self.modified_count,
                self.unchanged_count
            ));
        }
        if let Some(path) = &self.output_artifact {
            lines.push(format!("report written to {}", path.display()));
        }
        lines.join("\n")
    }
}

/// Run one full pull-and-compare cycle.
///
/// History is read from `store` once up front. With no history the resolved
/// snapshot becomes the sole generation and only the full table is
/// reported. Otherwise the last current generation is rotated to previous,
/// the new snapshot is persisted as current, and the two are diffed.
///
/// A rotation failure aborts before anything is written. A schema mismatch
/// between generations skips the report but keeps the persisted snapshot.
pub fn run<S, T, W>(
    terms: &[String],
    source: &mut S,
    store: &mut T,
    writer: &W,
) -> Result<RunSummary, RunError>
where
    S: StudySource + ?Sized,
    T: SnapshotStore + ?Sized,
    W: ArtifactWriter + ?Sized,
{
    let history = store.history()?;
    tracing::info!(?history, terms = terms.len(), "starting run");

    let collection = collect_terms(source, terms);
    let resolved = resolve_conflicts(collection.records);
    let current = resolved.to_snapshot().map_err(StorageError::from)?;
    let mut summary = RunSummary::new(current.len(), collection.terms);

    match history {
        History::NoHistory => {
            store.persist_initial(&current)?;
            summary.initialized = true;
            summary.output_artifact =
                Some(writer.write_artifact(&initialization_sections(&current))?);
        }
        History::HasHistory { pending_rotation } => {
            if pending_rotation {
                store.rotate()?;
            }
            store.persist_current(&current)?;

            let Some(previous) = store.load_previous()? else {
                // Rotation only ever replaces previous, so this means the
                // previous generation vanished between history() and now.
                summary.diff_skipped = Some("previous snapshot is missing".to_string());
                return Ok(summary);
            };

            match diff_snapshots(&previous, &current) {
                Ok(diff) => {
                    summary.added_count = diff.added.len();
                    summary.deleted_count = diff.deleted.len();
                    summary.modified_count = diff.modified.len();
                    summary.unchanged_count = diff.unchanged;
                    summary.output_artifact =
                        Some(writer.write_artifact(&change_sections(&diff, &current))?);
                }
                Err(e @ DiffError::SchemaMismatch { .. }) => {
                    tracing::warn!(error = %e, "skipping comparison");
                    summary.diff_skipped = Some(e.to_string());
                }
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::collect::testing::{page, study, ScriptedSource};
    use crate::collect::FetchError;
    use crate::report::{Section, ADDED_SECTION, ALL_SECTION, MODIFIED_SECTION};
    use crate::schema::{trial_schema, ASSET, OVERALL_STATUS};
    use tempfile::TempDir;
    use trialwatch_storage::{
        read_snapshot, write_snapshot, Cell, Column, CsvSnapshotStore, MemorySnapshotStore,
        Snapshot, TableSchema,
    };

    /// Captures written sections instead of touching the filesystem.
    #[derive(Default)]
    struct CapturingWriter {
        written: RefCell<Vec<Vec<Section>>>,
    }

    impl ArtifactWriter for CapturingWriter {
        fn write_artifact(&self, sections: &[Section]) -> Result<PathBuf, ReportError> {
            self.written.borrow_mut().push(sections.to_vec());
            Ok(PathBuf::from(format!("report-{}.json", self.written.borrow().len())))
        }
    }

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn source_with(status: &str) -> ScriptedSource {
        ScriptedSource::default()
            .with_term("drugA", vec![page(vec![study("NCT001", status)], None)])
    }

    #[test]
    fn first_run_initializes_history() {
        let mut store = MemorySnapshotStore::new();
        let writer = CapturingWriter::default();
        let summary = run(
            &terms(&["drugA"]),
            &mut source_with("RECRUITING"),
            &mut store,
            &writer,
        )
        .unwrap();

        assert!(summary.initialized);
        assert_eq!(summary.total_records, 1);
        assert_eq!(summary.output_artifact, Some(PathBuf::from("report-1.json")));
        assert!(store.previous().is_some());
        assert!(store.current().is_none());

        let written = writer.written.borrow();
        assert_eq!(written[0].len(), 1);
        assert_eq!(written[0][0].name, ALL_SECTION);
    }

    #[test]
    fn status_change_and_addition_are_reported() {
        let mut store = MemorySnapshotStore::new();
        let writer = CapturingWriter::default();
        run(&terms(&["drugA"]), &mut source_with("RECRUITING"), &mut store, &writer).unwrap();

        let mut source = ScriptedSource::default().with_term(
            "drugA",
            vec![page(
                vec![study("NCT001", "COMPLETED"), study("NCT002", "RECRUITING")],
                None,
            )],
        );
        let summary = run(&terms(&["drugA"]), &mut source, &mut store, &writer).unwrap();

        assert!(!summary.initialized);
        assert_eq!(summary.added_count, 1);
        assert_eq!(summary.deleted_count, 0);
        assert_eq!(summary.modified_count, 1);
        assert_eq!(summary.unchanged_count, 0);

        let written = writer.written.borrow();
        let sections = &written[1];
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0].name, ADDED_SECTION);
        assert_eq!(sections[0].rows[0][0], "NCT002");
        assert_eq!(sections[2].name, MODIFIED_SECTION);
        assert_eq!(sections[2].rows.len(), 1);
        assert_eq!(sections[2].rows[0][1], OVERALL_STATUS);
        assert_eq!(sections[2].rows[0][2], "RECRUITING");
        assert_eq!(sections[2].rows[0][3], "COMPLETED");
    }

    #[test]
    fn third_run_compares_against_second() {
        let mut store = MemorySnapshotStore::new();
        let writer = CapturingWriter::default();
        for status in ["RECRUITING", "ACTIVE_NOT_RECRUITING", "COMPLETED"] {
            run(&terms(&["drugA"]), &mut source_with(status), &mut store, &writer).unwrap();
        }
        let written = writer.written.borrow();
        let modified = &written[2][2];
        assert_eq!(modified.rows[0][2], "ACTIVE_NOT_RECRUITING");
        assert_eq!(modified.rows[0][3], "COMPLETED");
        assert_eq!(
            store.previous().unwrap().cell("NCT001", OVERALL_STATUS),
            Some(&Cell::text("ACTIVE_NOT_RECRUITING"))
        );
    }

    #[test]
    fn shared_trial_lists_every_term() {
        let mut source = ScriptedSource::default()
            .with_term("drugA", vec![page(vec![study("NCT050", "RECRUITING")], None)])
            .with_term("drugB", vec![page(vec![study("NCT050", "COMPLETED")], None)]);
        let mut store = MemorySnapshotStore::new();
        let summary = run(
            &terms(&["drugA", "drugB"]),
            &mut source,
            &mut store,
            &CapturingWriter::default(),
        )
        .unwrap();

        assert_eq!(summary.total_records, 1);
        let snapshot = store.previous().unwrap();
        assert_eq!(snapshot.cell("NCT050", ASSET), Some(&Cell::text("drugA, drugB")));
        assert_eq!(snapshot.cell("NCT050", OVERALL_STATUS), Some(&Cell::text("RECRUITING")));
    }

    #[test]
    fn schema_drift_skips_report_but_persists_current() {
        let narrow = TableSchema::new("NCT ID", vec![Column::text(ASSET)]);
        let mut previous = Snapshot::new(&narrow);
        previous.insert("NCT001", vec![Cell::text("drugA")]).unwrap();
        let mut store = MemorySnapshotStore::with_generations(Some(previous), None);
        let writer = CapturingWriter::default();

        let summary = run(&terms(&["drugA"]), &mut source_with("RECRUITING"), &mut store, &writer)
            .unwrap();

        assert!(!summary.initialized);
        assert!(summary.output_artifact.is_none());
        assert!(summary
            .diff_skipped
            .as_deref()
            .unwrap()
            .contains("only in current"));
        assert!(writer.written.borrow().is_empty());
        let current = store.current().unwrap();
        assert_eq!(current.columns(), trial_schema().columns.as_slice());
        assert_eq!(current.len(), 1);
    }

    #[test]
    fn schema_drift_on_disk_still_writes_current_file() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.csv");
        let new = dir.path().join("new.csv");
        let narrow = TableSchema::new("NCT ID", vec![Column::text(ASSET)]);
        let mut previous = Snapshot::new(&narrow);
        previous.insert("NCT001", vec![Cell::text("drugA")]).unwrap();
        write_snapshot(&old, &previous).unwrap();

        let mut store = CsvSnapshotStore::new(&old, &new, trial_schema());
        let writer = CapturingWriter::default();
        let summary = run(&terms(&["drugA"]), &mut source_with("RECRUITING"), &mut store, &writer)
            .unwrap();

        assert!(summary.diff_skipped.is_some());
        assert!(writer.written.borrow().is_empty());
        assert!(new.exists());
        let reloaded = read_snapshot(&new, &trial_schema()).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.cell("NCT001", OVERALL_STATUS), Some(&Cell::text("RECRUITING")));
        assert_eq!(read_snapshot(&old, &trial_schema()).unwrap().columns().len(), 1);
        assert!(store.load_current().unwrap().is_some());
    }

    #[test]
    fn shared_snapshot_file_fails_before_anything_is_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trials.csv");
        let mut store = CsvSnapshotStore::new(&path, &path, trial_schema());
        let writer = CapturingWriter::default();
        let err = run(&terms(&["drugA"]), &mut source_with("RECRUITING"), &mut store, &writer)
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::Storage(StorageError::SharedGeneration { .. })
        ));
        assert!(!path.exists());
        assert!(writer.written.borrow().is_empty());
    }

    #[test]
    fn fetch_failure_keeps_partial_results() {
        let mut source = ScriptedSource::default()
            .with_term(
                "drugA",
                vec![
                    page(vec![study("NCT001", "RECRUITING")], Some("next")),
                    Err(FetchError::Status {
                        term: "drugA".into(),
                        status: 500,
                    }),
                ],
            )
            .with_term("drugB", vec![page(vec![study("NCT002", "RECRUITING")], None)]);
        let mut store = MemorySnapshotStore::new();
        let summary = run(
            &terms(&["drugA", "drugB"]),
            &mut source,
            &mut store,
            &CapturingWriter::default(),
        )
        .unwrap();

        assert_eq!(summary.total_records, 2);
        assert!(summary.term_reports[0].failure.is_some());
        assert!(summary.to_text().contains("stopped early"));
    }

    #[test]
    fn summary_text_for_initialization() {
        let mut store = MemorySnapshotStore::new();
        let summary = run(
            &terms(&["drugA"]),
            &mut source_with("RECRUITING"),
            &mut store,
            &CapturingWriter::default(),
        )
        .unwrap();
        let text = summary.to_text();
        assert!(text.contains("initialized tracking with 1 trial(s)"));
        assert!(text.contains("report written to report-1.json"));
    }
}
