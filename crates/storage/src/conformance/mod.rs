//! Conformance test suite for `SnapshotStore` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! `SnapshotStore` implementation can run to verify correctness. The suite
//! covers:
//!
//! - **History**: empty stores report `NoHistory`, persisted generations
//!   report `HasHistory` with the right rotation flag
//! - **Rotation**: the current generation replaces the previous one and
//!   exactly one prior generation survives
//! - **Round trip**: persisted snapshots load back unchanged
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty store for each test:
//!
//! ```ignore
//! use trialwatch_storage::conformance::run_conformance_suite;
//!
//! #[test]
//! fn csv_conformance() {
//!     let dir = tempfile::TempDir::new().unwrap();
//!     let counter = std::cell::Cell::new(0);
//!     let report = run_conformance_suite(|| {
//!         counter.set(counter.get() + 1);
//!         let n = counter.get();
//!         CsvSnapshotStore::new(
//!             dir.path().join(format!("old-{n}.csv")),
//!             dir.path().join(format!("new-{n}.csv")),
//!             conformance::schema(),
//!         )
//!     });
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod history;
mod rotation;
mod roundtrip;

use std::fmt;

use crate::record::{Cell, Column, Snapshot, TableSchema};
use crate::SnapshotStore;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "history", "rotation", "roundtrip").
    pub category: String,
    /// Test name (e.g. "empty_store_has_no_history").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a store backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// store, ensuring test isolation.
pub fn run_conformance_suite<S, F>(factory: F) -> ConformanceReport
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut results = Vec::new();

    results.extend(history::run_history_tests(&factory));
    results.extend(rotation::run_rotation_tests(&factory));
    results.extend(roundtrip::run_roundtrip_tests(&factory));

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: fixture snapshots ───────────────────────────────────────────────

/// The table layout used by every conformance fixture. File-backed stores
/// under test must be constructed with this schema.
pub fn schema() -> TableSchema {
    TableSchema::new(
        "NCT ID",
        vec![
            Column::text("Asset"),
            Column::text("Overall Status"),
            Column::numeric("Enrollment"),
            Column::text("Start Date"),
        ],
    )
}

fn make_snapshot(rows: &[(&str, &str, &str, Option<f64>)]) -> Snapshot {
    let mut snapshot = Snapshot::new(&schema());
    for (id, asset, status, enrollment) in rows {
        let cells = vec![
            Cell::text(*asset),
            Cell::text(*status),
            enrollment.map(Cell::number).unwrap_or_else(Cell::missing),
            Cell::text("Unknown Date"),
        ];
        snapshot
            .insert(*id, cells)
            .expect("fixture identifiers are unique");
    }
    snapshot
}

fn week_one() -> Snapshot {
    make_snapshot(&[
        ("NCT001", "drugA", "Recruiting", Some(120.0)),
        ("NCT002", "drugA, drugB", "Completed", None),
    ])
}

fn week_two() -> Snapshot {
    make_snapshot(&[
        ("NCT001", "drugA", "Active, not recruiting", Some(118.0)),
        ("NCT003", "drugB", "Not yet recruiting", Some(40.0)),
    ])
}

fn week_three() -> Snapshot {
    make_snapshot(&[("NCT003", "drugB", "Recruiting", Some(40.0))])
}

fn ids(snapshot: &Snapshot) -> Vec<String> {
    snapshot.ids().map(str::to_string).collect()
}
