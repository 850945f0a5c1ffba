//! trialwatch-core: week-over-week change tracking for clinical-trial
//! registry pulls.
//!
//! The pipeline runs, in order:
//!
//! - [`collect`] -- page through registry results for each query term
//! - [`normalize`] -- flatten one registry study into a [`TrialRecord`]
//! - [`resolve`] -- merge records surfaced by several terms into one per NCT ID
//! - [`diff`] -- compare the resolved snapshot with the previous generation
//! - [`report`] -- serialize the change sections into one artifact
//!
//! [`pipeline::run`] drives all of them against a
//! [`SnapshotStore`](trialwatch_storage::SnapshotStore).

pub mod collect;
pub mod diff;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod resolve;
pub mod schema;

pub use collect::{collect_terms, Collection, FetchError, StudyPage, StudySource, TermReport};
pub use diff::{diff_snapshots, DiffError, FieldChange, RowChange, SnapshotDiff};
pub use normalize::{normalize, RawStudy};
pub use pipeline::{run, RunError, RunSummary};
pub use record::{Location, TrialRecord};
pub use report::{
    change_sections, initialization_sections, ArtifactWriter, JsonReportWriter, ReportError, Section,
};
pub use resolve::{resolve_conflicts, ResolvedTrials};
pub use schema::trial_schema;
