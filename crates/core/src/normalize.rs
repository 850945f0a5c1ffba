//! Flattening of registry study documents into [`TrialRecord`]s.
//!
//! The typed structs below mirror the subset of the ClinicalTrials.gov v2
//! `studies[]` document that trialwatch tracks. Every module and field is
//! optional; a missing module deserializes to its default.

use serde::{Deserialize, Serialize};

use crate::record::{Location, TrialRecord};

/// One element of the registry's `studies` array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStudy {
    pub protocol_section: ProtocolSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtocolSection {
    pub identification_module: IdentificationModule,
    pub status_module: StatusModule,
    pub sponsor_collaborators_module: SponsorCollaboratorsModule,
    /// Kept optional: a study without this module is reported differently
    /// from one whose module lists no conditions.
    pub conditions_module: Option<ConditionsModule>,
    pub design_module: DesignModule,
    pub arms_interventions_module: ArmsInterventionsModule,
    pub outcomes_module: OutcomesModule,
    pub contacts_locations_module: ContactsLocationsModule,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentificationModule {
    pub nct_id: Option<String>,
    pub official_title: Option<String>,
    pub acronym: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusModule {
    pub overall_status: Option<String>,
    pub start_date_struct: Option<DateStruct>,
    pub primary_completion_date_struct: Option<DateStruct>,
    pub study_first_post_date_struct: Option<DateStruct>,
    pub last_update_post_date_struct: Option<DateStruct>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DateStruct {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SponsorCollaboratorsModule {
    pub lead_sponsor: Option<Sponsor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sponsor {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionsModule {
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignModule {
    pub study_type: Option<String>,
    pub phases: Vec<String>,
    pub enrollment_info: Option<EnrollmentInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentInfo {
    pub count: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmsInterventionsModule {
    pub interventions: Vec<NamedItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedItem {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutcomesModule {
    pub primary_outcomes: Vec<Outcome>,
    pub secondary_outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Outcome {
    pub measure: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactsLocationsModule {
    pub locations: Vec<RawLocation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLocation {
    pub city: Option<String>,
    pub country: Option<String>,
}

fn date(value: &Option<DateStruct>) -> Option<String> {
    value.as_ref().and_then(|d| d.date.clone())
}

/// Flatten one registry study, tagging it with the term that surfaced it.
///
/// Returns `None` for a study without an NCT ID, since it cannot be keyed.
pub fn normalize(study: &RawStudy, term: &str) -> Option<TrialRecord> {
    let p = &study.protocol_section;
    let nct_id = p
        .identification_module
        .nct_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())?;

    Some(TrialRecord {
        nct_id: nct_id.to_string(),
        origin_terms: vec![term.to_string()],
        title: p.identification_module.official_title.clone(),
        lead_sponsor: p
            .sponsor_collaborators_module
            .lead_sponsor
            .as_ref()
            .and_then(|s| s.name.clone()),
        acronym: p.identification_module.acronym.clone(),
        overall_status: p.status_module.overall_status.clone(),
        enrollment: p
            .design_module
            .enrollment_info
            .as_ref()
            .and_then(|e| e.count)
            .filter(|c| !c.is_nan()),
        start_date: date(&p.status_module.start_date_struct),
        conditions: p.conditions_module.as_ref().map(|m| m.conditions.clone()),
        interventions: p
            .arms_interventions_module
            .interventions
            .iter()
            .map(|i| i.name.clone())
            .collect(),
        primary_outcomes: p
            .outcomes_module
            .primary_outcomes
            .iter()
            .map(|o| o.measure.clone())
            .collect(),
        secondary_outcomes: p
            .outcomes_module
            .secondary_outcomes
            .iter()
            .map(|o| o.measure.clone())
            .collect(),
        locations: p
            .contacts_locations_module
            .locations
            .iter()
            .map(|l| Location {
                city: l.city.clone(),
                country: l.country.clone(),
            })
            .collect(),
        primary_completion_date: date(&p.status_module.primary_completion_date_struct),
        study_first_post_date: date(&p.status_module.study_first_post_date_struct),
        last_update_post_date: date(&p.status_module.last_update_post_date_struct),
        study_type: p.design_module.study_type.clone(),
        phases: p.design_module.phases.clone(),
    })
}
