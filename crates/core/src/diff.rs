use serde::Serialize;
use serde_json::Value;
use trialwatch_storage::{Cell, Column, Snapshot};

/// Absolute tolerance for numeric cell equality.
pub const NUMERIC_TOLERANCE: f64 = 1e-9;

/// Error type for diff operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// The two snapshots do not share the same typed column set.
    #[error("{}", describe_mismatch(.only_in_previous, .only_in_current, .kind_conflicts))]
    SchemaMismatch {
        only_in_previous: Vec<String>,
        only_in_current: Vec<String>,
        /// Columns present in both with different kinds.
        kind_conflicts: Vec<String>,
    },
}

fn describe_mismatch(previous: &[String], current: &[String], kinds: &[String]) -> String {
    let mut parts = Vec::new();
    if !previous.is_empty() {
        parts.push(format!("only in previous: {}", previous.join(", ")));
    }
    if !current.is_empty() {
        parts.push(format!("only in current: {}", current.join(", ")));
    }
    if !kinds.is_empty() {
        parts.push(format!("column kind differs: {}", kinds.join(", ")));
    }
    format!("snapshot schema mismatch ({})", parts.join("; "))
}

/// A single field-level difference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub column: String,
    pub before: Cell,
    pub after: Cell,
}

/// A row present in both snapshots with at least one differing field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowChange {
    pub id: String,
    pub fields: Vec<FieldChange>,
}

/// The result of diffing two snapshots.
///
/// `added`, `deleted`, and the ids in `modified` are pairwise disjoint.
/// Together with the `unchanged` rows they cover every identifier of both
/// snapshots exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotDiff {
    /// Rows only in current, in current order.
    pub added: Snapshot,
    /// Rows only in previous, in previous order.
    pub deleted: Snapshot,
    /// Common rows that differ, in current order.
    pub modified: Vec<RowChange>,
    /// Number of common rows with no differing field.
    pub unchanged: usize,
}

impl SnapshotDiff {
    /// Returns true if there are no differences.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    /// Serialize the diff to a JSON value.
    pub fn to_json(&self) -> Value {
        let added: Vec<&str> = self.added.ids().collect();
        let deleted: Vec<&str> = self.deleted.ids().collect();
        serde_json::json!({
            "added": added,
            "deleted": deleted,
            "modified": self.modified,
            "unchanged": self.unchanged,
        })
    }

    /// Format the diff as human-readable text.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        for id in self.added.ids() {
            lines.push(format!("+ {}", id));
        }
        for id in self.deleted.ids() {
            lines.push(format!("- {}", id));
        }
        for row in &self.modified {
            lines.push(format!("~ {}", row.id));
            for f in &row.fields {
                lines.push(format!("    {}: {} -> {}", f.column, f.before, f.after));
            }
        }

        lines.join("\n")
    }
}

/// Whether two cells differ under the comparison rule.
///
/// Numbers differ when they are further apart than [`NUMERIC_TOLERANCE`].
/// A missing number equals another missing number and differs from any
/// present one. Text differs unless byte-for-byte equal, placeholders
/// included.
pub fn cells_differ(before: &Cell, after: &Cell) -> bool {
    match (before, after) {
        (Cell::Numeric(Some(a)), Cell::Numeric(Some(b))) => (a - b).abs() > NUMERIC_TOLERANCE,
        (Cell::Numeric(None), Cell::Numeric(None)) => false,
        (Cell::Numeric(_), Cell::Numeric(_)) => true,
        (Cell::Text(a), Cell::Text(b)) => a != b,
        _ => true,
    }
}

/// Pair up previous/current column positions by name, or report the drift.
fn align_columns(previous: &Snapshot, current: &Snapshot) -> Result<Vec<(usize, usize)>, DiffError> {
    let mut only_in_previous = Vec::new();
    let mut only_in_current = Vec::new();
    let mut kind_conflicts = Vec::new();

    if previous.key_column() != current.key_column() {
        only_in_previous.push(previous.key_column().to_string());
        only_in_current.push(current.key_column().to_string());
    }

    let mut pairs = Vec::with_capacity(current.columns().len());
    for (ci, column) in current.columns().iter().enumerate() {
        match previous.column_index(&column.name) {
            Some(pi) => {
                let prev: &Column = &previous.columns()[pi];
                if prev.is_compatible(column) {
                    pairs.push((pi, ci));
                } else {
                    kind_conflicts.push(column.name.clone());
                }
            }
            None => only_in_current.push(column.name.clone()),
        }
    }
    for column in previous.columns() {
        if current.column_index(&column.name).is_none() {
            only_in_previous.push(column.name.clone());
        }
    }

    if only_in_previous.is_empty() && only_in_current.is_empty() && kind_conflicts.is_empty() {
        Ok(pairs)
    } else {
        Err(DiffError::SchemaMismatch {
            only_in_previous,
            only_in_current,
            kind_conflicts,
        })
    }
}

/// Diff two snapshots, producing added, deleted, and modified row sets.
///
/// Rows are matched by identifier, columns by name. Fails with
/// [`DiffError::SchemaMismatch`] before comparing anything if the column
/// sets are incompatible.
pub fn diff_snapshots(previous: &Snapshot, current: &Snapshot) -> Result<SnapshotDiff, DiffError> {
    let pairs = align_columns(previous, current)?;

    let added = current.filter_ids(|id| !previous.contains(id));
    let deleted = previous.filter_ids(|id| !current.contains(id));

    let mut modified = Vec::new();
    let mut unchanged = 0;
    for (id, after) in current.rows() {
        let Some(before) = previous.row(id) else {
            continue;
        };
        let fields: Vec<FieldChange> = pairs
            .iter()
            .filter(|(pi, ci)| cells_differ(&before[*pi], &after[*ci]))
            .map(|&(pi, ci)| FieldChange {
                column: current.columns()[ci].name.clone(),
                before: before[pi].clone(),
                after: after[ci].clone(),
            })
            .collect();
        if fields.is_empty() {
            unchanged += 1;
        } else {
            modified.push(RowChange {
                id: id.to_string(),
                fields,
            });
        }
    }

    Ok(SnapshotDiff {
        added,
        deleted,
        modified,
        unchanged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use trialwatch_storage::TableSchema;

    fn schema() -> TableSchema {
        TableSchema::new(
            "NCT ID",
            vec![
                Column::text("Overall Status"),
                Column::numeric("Enrollment"),
                Column::text("Start Date"),
            ],
        )
    }

    fn snap(rows: &[(&str, &str, Option<f64>, &str)]) -> Snapshot {
        let mut s = Snapshot::new(&schema());
        for (id, status, enrollment, start) in rows {
            s.insert(
                *id,
                vec![
                    Cell::text(*status),
                    enrollment.map(Cell::number).unwrap_or_else(Cell::missing),
                    Cell::text(*start),
                ],
            )
            .unwrap();
        }
        s
    }

    fn ids(s: &Snapshot) -> Vec<&str> {
        s.ids().collect()
    }

    #[test]
    fn identical_snapshots_produce_empty_diff() {
        let s = snap(&[
            ("NCT001", "Recruiting", Some(10.0), "2024-01"),
            ("NCT002", "Completed", None, "Unknown Date"),
        ]);
        let diff = diff_snapshots(&s, &s).unwrap();
        assert!(diff.is_empty());
        assert_eq!(diff.unchanged, 2);
        assert_eq!(diff.to_text(), "");
    }

    #[test]
    fn status_change_and_new_trial() {
        let previous = snap(&[("NCT001", "Recruiting", Some(10.0), "2024-01")]);
        let current = snap(&[
            ("NCT001", "Completed", Some(10.0), "2024-01"),
            ("NCT002", "Recruiting", Some(5.0), "2024-02"),
        ]);
        let diff = diff_snapshots(&previous, &current).unwrap();
        assert_eq!(ids(&diff.added), vec!["NCT002"]);
        assert!(diff.deleted.is_empty());
        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.modified[0].id, "NCT001");
        assert_eq!(
            diff.modified[0].fields,
            vec![FieldChange {
                column: "Overall Status".into(),
                before: Cell::text("Recruiting"),
                after: Cell::text("Completed"),
            }]
        );
    }

    #[test]
    fn deleted_rows_keep_previous_order() {
        let previous = snap(&[
            ("NCT003", "a", None, "d"),
            ("NCT001", "a", None, "d"),
            ("NCT002", "a", None, "d"),
        ]);
        let current = snap(&[("NCT001", "a", None, "d")]);
        let diff = diff_snapshots(&previous, &current).unwrap();
        assert_eq!(ids(&diff.deleted), vec!["NCT003", "NCT002"]);
        assert_eq!(diff.unchanged, 1);
    }

    #[test]
    fn numeric_tolerance_boundary() {
        let base = snap(&[("NCT001", "s", Some(0.0), "d")]);
        let exact = snap(&[("NCT001", "s", Some(1e-9), "d")]);
        let over = snap(&[("NCT001", "s", Some(1e-9 + 1e-12), "d")]);
        assert!(diff_snapshots(&base, &exact).unwrap().modified.is_empty());
        assert_eq!(diff_snapshots(&base, &over).unwrap().modified.len(), 1);
    }

    #[test]
    fn missing_numbers_compare_as_equal_to_each_other_only() {
        let missing = snap(&[("NCT001", "s", None, "d")]);
        let five = snap(&[("NCT001", "s", Some(5.0), "d")]);
        assert!(diff_snapshots(&missing, &missing).unwrap().modified.is_empty());

        let diff = diff_snapshots(&missing, &five).unwrap();
        assert_eq!(diff.modified[0].fields[0].column, "Enrollment");
        assert_eq!(diff.modified[0].fields[0].before, Cell::missing());
        assert_eq!(diff.modified[0].fields[0].after, Cell::number(5.0));

        assert_eq!(diff_snapshots(&five, &missing).unwrap().modified.len(), 1);
    }

    #[test]
    fn placeholder_to_real_value_is_a_change() {
        let previous = snap(&[("NCT001", "s", None, "Unknown Date")]);
        let current = snap(&[("NCT001", "s", None, "2025-03-01")]);
        let diff = diff_snapshots(&previous, &current).unwrap();
        assert_eq!(diff.modified[0].fields[0].column, "Start Date");
    }

    #[test]
    fn partitions_cover_the_union_exactly_once() {
        let previous = snap(&[
            ("A", "x", Some(1.0), "d"),
            ("B", "x", Some(1.0), "d"),
            ("C", "x", Some(1.0), "d"),
        ]);
        let current = snap(&[
            ("B", "y", Some(1.0), "d"),
            ("C", "x", Some(1.0), "d"),
            ("D", "x", Some(1.0), "d"),
        ]);
        let diff = diff_snapshots(&previous, &current).unwrap();

        let added: BTreeSet<&str> = diff.added.ids().collect();
        let deleted: BTreeSet<&str> = diff.deleted.ids().collect();
        let modified: BTreeSet<&str> = diff.modified.iter().map(|r| r.id.as_str()).collect();
        assert!(added.is_disjoint(&deleted));
        assert!(added.is_disjoint(&modified));
        assert!(deleted.is_disjoint(&modified));

        let union: BTreeSet<&str> = previous.ids().chain(current.ids()).collect();
        assert_eq!(
            added.len() + deleted.len() + modified.len() + diff.unchanged,
            union.len()
        );
    }

    #[test]
    fn extra_column_in_current_is_schema_mismatch() {
        let previous = snap(&[("NCT001", "s", None, "d")]);
        let mut wider_schema = schema();
        wider_schema.columns.push(Column::text("Acronym"));
        let mut current = Snapshot::new(&wider_schema);
        current
            .insert(
                "NCT001",
                vec![Cell::text("s"), Cell::missing(), Cell::text("d"), Cell::text("X")],
            )
            .unwrap();

        let err = diff_snapshots(&previous, &current).unwrap_err();
        assert_eq!(
            err,
            DiffError::SchemaMismatch {
                only_in_previous: vec![],
                only_in_current: vec!["Acronym".into()],
                kind_conflicts: vec![],
            }
        );
        assert!(err.to_string().contains("only in current: Acronym"));
    }

    #[test]
    fn kind_conflict_is_schema_mismatch() {
        let previous = snap(&[("NCT001", "s", None, "d")]);
        let text_schema = TableSchema::new(
            "NCT ID",
            vec![
                Column::text("Overall Status"),
                Column::text("Enrollment"),
                Column::text("Start Date"),
            ],
        );
        let current = Snapshot::new(&text_schema);
        let err = diff_snapshots(&previous, &current).unwrap_err();
        assert!(matches!(
            err,
            DiffError::SchemaMismatch { ref kind_conflicts, .. } if kind_conflicts == &vec!["Enrollment".to_string()]
        ));
    }

    #[test]
    fn column_order_does_not_matter() {
        let previous = snap(&[("NCT001", "Recruiting", Some(3.0), "d")]);
        let reordered = TableSchema::new(
            "NCT ID",
            vec![
                Column::text("Start Date"),
                Column::numeric("Enrollment"),
                Column::text("Overall Status"),
            ],
        );
        let mut current = Snapshot::new(&reordered);
        current
            .insert(
                "NCT001",
                vec![Cell::text("d"), Cell::number(3.0), Cell::text("Completed")],
            )
            .unwrap();
        let diff = diff_snapshots(&previous, &current).unwrap();
        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.modified[0].fields.len(), 1);
        assert_eq!(diff.modified[0].fields[0].column, "Overall Status");
    }

    #[test]
    fn text_and_json_renderings() {
        let previous = snap(&[
            ("NCT001", "Recruiting", Some(10.0), "d"),
            ("NCT009", "Recruiting", None, "d"),
        ]);
        let current = snap(&[
            ("NCT001", "Completed", Some(10.0), "d"),
            ("NCT002", "Recruiting", None, "d"),
        ]);
        let diff = diff_snapshots(&previous, &current).unwrap();
        assert_eq!(
            diff.to_text(),
            "+ NCT002\n- NCT009\n~ NCT001\n    Overall Status: Recruiting -> Completed"
        );
        let json = diff.to_json();
        assert_eq!(json["added"], serde_json::json!(["NCT002"]));
        assert_eq!(json["deleted"], serde_json::json!(["NCT009"]));
        assert_eq!(json["modified"][0]["fields"][0]["before"], "Recruiting");
        assert_eq!(json["unchanged"], 0);
    }
}
