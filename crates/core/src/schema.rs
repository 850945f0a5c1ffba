//! The fixed flat-row layout of a trial snapshot.
//!
//! Column names match the historic CSV files, so older snapshots load
//! against this layout. Placeholder text is not carried over verbatim:
//! older tooling wrote "Unknonw Lead Sponsor" and "No secomdary outcomes
//! indicated", and the corrected spellings below show up as modified cells
//! the first time a run compares against such a snapshot.

use trialwatch_storage::{Column, TableSchema};

pub const NCT_ID: &str = "NCT ID";
pub const ASSET: &str = "Asset";
pub const TITLE: &str = "Title";
pub const LEAD_SPONSOR: &str = "Lead Sponsor";
pub const ACRONYM: &str = "Acronym";
pub const OVERALL_STATUS: &str = "Overall Status";
pub const ENROLLMENT: &str = "Enrollment";
pub const START_DATE: &str = "Start Date";
pub const CONDITIONS: &str = "Conditions";
pub const INTERVENTIONS: &str = "Interventions";
pub const PRIMARY_OUTCOMES: &str = "Primary Outcome(s)";
pub const SECONDARY_OUTCOMES: &str = "Secondary Outcome(s)";
pub const LOCATIONS: &str = "Locations";
pub const PRIMARY_COMPLETION_DATE: &str = "Primary Completion Date";
pub const STUDY_FIRST_POST_DATE: &str = "Study First Post Date";
pub const LAST_UPDATE_POST_DATE: &str = "Last Update Post Date";
pub const STUDY_TYPE: &str = "Study Type";
pub const PHASES: &str = "Phases";

/// Separator between list items and between origin terms.
pub const LIST_SEPARATOR: &str = ", ";

pub mod placeholder {
    pub const UNKNOWN: &str = "Unknown";
    pub const UNKNOWN_SPONSOR: &str = "Unknown Lead Sponsor";
    pub const UNKNOWN_DATE: &str = "Unknown Date";
    pub const NO_CONDITIONS_MODULE: &str = "No conditions identified";
    pub const NO_CONDITIONS: &str = "No conditions listed";
    pub const NO_INTERVENTIONS: &str = "No interventions listed";
    pub const UNNAMED_INTERVENTION: &str = "No intervention name listed";
    pub const NO_PRIMARY_OUTCOMES: &str = "No primary outcomes listed";
    pub const UNNAMED_PRIMARY_OUTCOME: &str = "No primary outcome indicated";
    pub const NO_SECONDARY_OUTCOMES: &str = "No secondary outcomes listed";
    pub const UNNAMED_SECONDARY_OUTCOME: &str = "No secondary outcome indicated";
    pub const NO_LOCATIONS: &str = "No locations listed";
    pub const NO_CITY: &str = "No City";
    pub const NO_COUNTRY: &str = "No Country";
    pub const NO_PHASES: &str = "Not Available";
    /// Phase value the registry uses for "not applicable".
    pub const NA_PHASE: &str = "NA";
}

/// Value columns in snapshot order (the identifier column is separate).
pub const VALUE_COLUMNS: [&str; 17] = [
    ASSET,
    TITLE,
    LEAD_SPONSOR,
    ACRONYM,
    OVERALL_STATUS,
    ENROLLMENT,
    START_DATE,
    CONDITIONS,
    INTERVENTIONS,
    PRIMARY_OUTCOMES,
    SECONDARY_OUTCOMES,
    LOCATIONS,
    PRIMARY_COMPLETION_DATE,
    STUDY_FIRST_POST_DATE,
    LAST_UPDATE_POST_DATE,
    STUDY_TYPE,
    PHASES,
];

/// The snapshot layout for trial records.
pub fn trial_schema() -> TableSchema {
    let columns = VALUE_COLUMNS
        .iter()
        .map(|&name| match name {
            ENROLLMENT => Column::numeric(name),
            PHASES => Column::text(name).with_empty_placeholder(placeholder::NO_PHASES),
            _ => Column::text(name),
        })
        .collect();
    TableSchema::new(NCT_ID, columns)
}
