//! Conflict resolution: one record per NCT ID.
//!
//! The same trial is often surfaced by several query terms. Resolution
//! groups records by NCT ID and merges each group:
//!
//! - origin terms are concatenated in first-seen order, each term once;
//! - every other field keeps the value of the first record seen for that
//!   NCT ID. Values carried by later duplicates are discarded, so the input
//!   order decides which duplicate is representative.

use indexmap::map::Entry;
use indexmap::IndexMap;
use trialwatch_storage::{Snapshot, SnapshotError};

use crate::record::TrialRecord;
use crate::schema::trial_schema;

/// Records keyed by NCT ID, at most one per identifier, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedTrials {
    records: IndexMap<String, TrialRecord>,
}

impl ResolvedTrials {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, nct_id: &str) -> Option<&TrialRecord> {
        self.records.get(nct_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrialRecord> {
        self.records.values()
    }

    pub fn into_records(self) -> Vec<TrialRecord> {
        self.records.into_values().collect()
    }

    /// Flatten into a snapshot using the trial column layout.
    pub fn to_snapshot(&self) -> Result<Snapshot, SnapshotError> {
        let schema = trial_schema();
        let rows = self
            .records
            .iter()
            .map(|(id, record)| (id.clone(), record.to_cells()))
            .collect();
        Snapshot::from_rows(&schema.key_column, schema.columns, rows)
    }
}

/// Merge records sharing an NCT ID into one record per identifier.
pub fn resolve_conflicts<I>(records: I) -> ResolvedTrials
where
    I: IntoIterator<Item = TrialRecord>,
{
    let records = records
        .into_iter()
        .fold(IndexMap::new(), |mut acc: IndexMap<String, TrialRecord>, record| {
            match acc.entry(record.nct_id.clone()) {
                Entry::Occupied(mut first) => {
                    append_terms(&mut first.get_mut().origin_terms, record.origin_terms);
                }
                Entry::Vacant(slot) => {
                    let mut first = record;
                    let terms = std::mem::take(&mut first.origin_terms);
                    append_terms(&mut first.origin_terms, terms);
                    slot.insert(first);
                }
            }
            acc
        });

    ResolvedTrials { records }
}

fn append_terms(into: &mut Vec<String>, terms: Vec<String>) {
    for term in terms {
        if !into.contains(&term) {
            into.push(term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ASSET, OVERALL_STATUS, TITLE};
    use trialwatch_storage::Cell;

    fn record(id: &str, term: &str, status: &str) -> TrialRecord {
        TrialRecord {
            overall_status: Some(status.to_string()),
            title: Some(format!("{id} via {term}")),
            ..TrialRecord::new(id, term)
        }
    }

    #[test]
    fn duplicate_ids_merge_terms_and_keep_first_fields() {
        let resolved = resolve_conflicts(vec![
            record("NCT050", "drugA", "RECRUITING"),
            record("NCT050", "drugB", "COMPLETED"),
        ]);
        assert_eq!(resolved.len(), 1);
        let merged = resolved.get("NCT050").unwrap();
        assert_eq!(merged.origin_label(), "drugA, drugB");
        assert_eq!(merged.overall_status.as_deref(), Some("RECRUITING"));
        assert_eq!(merged.title.as_deref(), Some("NCT050 via drugA"));
    }

    #[test]
    fn terms_are_unique_in_first_seen_order() {
        let resolved = resolve_conflicts(vec![
            record("NCT001", "drugC", "x"),
            record("NCT002", "drugA", "x"),
            record("NCT001", "drugA", "x"),
            record("NCT001", "drugC", "x"),
            record("NCT001", "drugB", "x"),
        ]);
        assert_eq!(
            resolved.get("NCT001").unwrap().origin_terms,
            vec!["drugC", "drugA", "drugB"]
        );
        let order: Vec<&str> = resolved.iter().map(|r| r.nct_id.as_str()).collect();
        assert_eq!(order, vec!["NCT001", "NCT002"]);
    }

    #[test]
    fn single_record_passes_through_with_terms_deduplicated() {
        let mut r = record("NCT001", "drugA", "x");
        r.origin_terms.push("drugA".into());
        let resolved = resolve_conflicts(vec![r.clone()]);
        let out = resolved.get("NCT001").unwrap();
        assert_eq!(out.origin_terms, vec!["drugA"]);
        assert_eq!(out.overall_status, r.overall_status);
    }

    #[test]
    fn resolving_resolved_records_is_a_no_op() {
        let once = resolve_conflicts(vec![
            record("NCT001", "drugA", "x"),
            record("NCT002", "drugB", "y"),
            record("NCT001", "drugB", "z"),
        ]);
        let twice = resolve_conflicts(once.clone().into_records());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let resolved = resolve_conflicts(Vec::new());
        assert!(resolved.is_empty());
        assert!(resolved.to_snapshot().unwrap().is_empty());
    }

    #[test]
    fn snapshot_has_one_row_per_identifier() {
        let resolved = resolve_conflicts(vec![
            record("NCT050", "drugA", "RECRUITING"),
            record("NCT050", "drugB", "COMPLETED"),
            record("NCT051", "drugB", "COMPLETED"),
        ]);
        let snap = resolved.to_snapshot().unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.cell("NCT050", ASSET), Some(&Cell::text("drugA, drugB")));
        assert_eq!(snap.cell("NCT050", OVERALL_STATUS), Some(&Cell::text("RECRUITING")));
        assert_eq!(snap.cell("NCT051", TITLE), Some(&Cell::text("NCT051 via drugB")));
    }
}
