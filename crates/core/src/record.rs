use serde::{Deserialize, Serialize};
use trialwatch_storage::Cell;

use crate::schema::{placeholder, LIST_SEPARATOR};

/// One trial site.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub country: Option<String>,
}

/// One clinical trial as retrieved from the registry.
///
/// Absent registry values stay `None` here; placeholder strings only appear
/// when the record is flattened into snapshot cells by [`TrialRecord::to_cells`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrialRecord {
    pub nct_id: String,
    /// Query terms that surfaced this trial, in first-seen order, no repeats.
    pub origin_terms: Vec<String>,
    pub title: Option<String>,
    pub lead_sponsor: Option<String>,
    pub acronym: Option<String>,
    pub overall_status: Option<String>,
    pub enrollment: Option<f64>,
    pub start_date: Option<String>,
    /// `None` when the study has no conditions module at all.
    pub conditions: Option<Vec<String>>,
    pub interventions: Vec<Option<String>>,
    pub primary_outcomes: Vec<Option<String>>,
    pub secondary_outcomes: Vec<Option<String>>,
    pub locations: Vec<Location>,
    pub primary_completion_date: Option<String>,
    pub study_first_post_date: Option<String>,
    pub last_update_post_date: Option<String>,
    pub study_type: Option<String>,
    pub phases: Vec<String>,
}

impl TrialRecord {
    pub fn new(nct_id: impl Into<String>, origin_term: impl Into<String>) -> Self {
        Self {
            nct_id: nct_id.into(),
            origin_terms: vec![origin_term.into()],
            ..Self::default()
        }
    }

    /// The `Asset` column value.
    pub fn origin_label(&self) -> String {
        self.origin_terms.join(LIST_SEPARATOR)
    }

    /// Flatten into cells in [`VALUE_COLUMNS`](crate::schema::VALUE_COLUMNS) order.
    pub fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(self.origin_label()),
            text_or(&self.title, placeholder::UNKNOWN),
            text_or(&self.lead_sponsor, placeholder::UNKNOWN_SPONSOR),
            text_or(&self.acronym, placeholder::UNKNOWN),
            text_or(&self.overall_status, placeholder::UNKNOWN),
            self.enrollment.map(Cell::number).unwrap_or_else(Cell::missing),
            text_or(&self.start_date, placeholder::UNKNOWN_DATE),
            Cell::text(self.conditions_label()),
            Cell::text(join_named(
                &self.interventions,
                placeholder::UNNAMED_INTERVENTION,
                placeholder::NO_INTERVENTIONS,
            )),
            Cell::text(join_named(
                &self.primary_outcomes,
                placeholder::UNNAMED_PRIMARY_OUTCOME,
                placeholder::NO_PRIMARY_OUTCOMES,
            )),
            Cell::text(join_named(
                &self.secondary_outcomes,
                placeholder::UNNAMED_SECONDARY_OUTCOME,
                placeholder::NO_SECONDARY_OUTCOMES,
            )),
            Cell::text(self.locations_label()),
            text_or(&self.primary_completion_date, placeholder::UNKNOWN_DATE),
            text_or(&self.study_first_post_date, placeholder::UNKNOWN_DATE),
            text_or(&self.last_update_post_date, placeholder::UNKNOWN_DATE),
            text_or(&self.study_type, placeholder::UNKNOWN),
            Cell::text(self.phases_label()),
        ]
    }

    fn conditions_label(&self) -> String {
        match &self.conditions {
            None => placeholder::NO_CONDITIONS_MODULE.to_string(),
            Some(list) if list.is_empty() => placeholder::NO_CONDITIONS.to_string(),
            Some(list) => list.join(LIST_SEPARATOR),
        }
    }

    fn locations_label(&self) -> String {
        if self.locations.is_empty() {
            return placeholder::NO_LOCATIONS.to_string();
        }
        self.locations
            .iter()
            .map(|loc| {
                format!(
                    "{} - {}",
                    loc.city.as_deref().unwrap_or(placeholder::NO_CITY),
                    loc.country.as_deref().unwrap_or(placeholder::NO_COUNTRY)
                )
            })
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR)
    }

    fn phases_label(&self) -> String {
        let joined = self.phases.join(LIST_SEPARATOR);
        if joined.is_empty() || joined == placeholder::NA_PHASE {
            placeholder::NO_PHASES.to_string()
        } else {
            joined
        }
    }
}

fn text_or(value: &Option<String>, fallback: &str) -> Cell {
    Cell::text(value.as_deref().unwrap_or(fallback))
}

fn join_named(items: &[Option<String>], unnamed: &str, empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .map(|item| item.as_deref().unwrap_or(unnamed))
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}
