//! Multi-term collection over a paginated study source.

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, RawStudy};
use crate::record::TrialRecord;

/// One page of registry search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyPage {
    pub studies: Vec<RawStudy>,
    pub next_page_token: Option<String>,
}

/// Errors from fetching one page of results for a term.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The registry answered with a non-success status.
    #[error("registry returned status {status} for term '{term}'")]
    Status { term: String, status: u16 },

    /// The request never produced a response.
    #[error("request for term '{term}' failed: {message}")]
    Transport { term: String, message: String },

    /// The response body was not a study page.
    #[error("could not decode registry response for term '{term}': {message}")]
    Decode { term: String, message: String },
}

/// A paginated source of registry studies.
pub trait StudySource {
    /// Fetch one page of results for `term`. `page_token` is `None` for the
    /// first page and the previous page's `next_page_token` afterwards.
    fn fetch_page(&mut self, term: &str, page_token: Option<&str>)
        -> Result<StudyPage, FetchError>;
}

impl<S: StudySource + ?Sized> StudySource for &mut S {
    fn fetch_page(
        &mut self,
        term: &str,
        page_token: Option<&str>,
    ) -> Result<StudyPage, FetchError> {
        (**self).fetch_page(term, page_token)
    }
}

/// Lazily walks every page for one term, stopping after the last page or
/// the first error.
pub struct TermPages<'a, S: ?Sized> {
    source: &'a mut S,
    term: &'a str,
    next_token: Option<String>,
    done: bool,
}

impl<'a, S: StudySource + ?Sized> TermPages<'a, S> {
    pub fn new(source: &'a mut S, term: &'a str) -> Self {
        Self {
            source,
            term,
            next_token: None,
            done: false,
        }
    }
}

impl<S: StudySource + ?Sized> Iterator for TermPages<'_, S> {
    type Item = Result<StudyPage, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.source.fetch_page(self.term, self.next_token.as_deref());
        match &result {
            Ok(page) => {
                let repeated = page.next_page_token.is_some()
                    && page.next_page_token == self.next_token;
                if repeated {
                    tracing::warn!(term = self.term, "registry repeated a page token; stopping");
                }
                self.done = page.next_page_token.is_none() || repeated;
                self.next_token = page.next_page_token.clone();
            }
            Err(_) => self.done = true,
        }
        Some(result)
    }
}

/// Per-term outcome of a collection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermReport {
    pub term: String,
    pub pages: usize,
    pub records: usize,
    /// Studies dropped because they had no NCT ID.
    pub skipped: usize,
    /// Set when pagination stopped early; records fetched before the
    /// failure are kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// All records gathered for a list of terms, before conflict resolution.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub records: Vec<TrialRecord>,
    pub terms: Vec<TermReport>,
}

/// Fetch and normalize every page for each term, in order.
///
/// A fetch failure ends that term's pagination; its partial results are
/// kept and collection moves on to the next term.
pub fn collect_terms<S: StudySource + ?Sized>(source: &mut S, terms: &[String]) -> Collection {
    let mut collection = Collection::default();

    for term in terms {
        let mut report = TermReport {
            term: term.clone(),
            pages: 0,
            records: 0,
            skipped: 0,
            failure: None,
        };

        for page in TermPages::new(source, term) {
            match page {
                Ok(page) => {
                    report.pages += 1;
                    tracing::debug!(
                        term = term.as_str(),
                        page = report.pages,
                        studies = page.studies.len(),
                        "fetched registry page"
                    );
                    for study in &page.studies {
                        match normalize(study, term) {
                            Some(record) => {
                                collection.records.push(record);
                                report.records += 1;
                            }
                            None => {
                                tracing::warn!(term = term.as_str(), "skipping study without an NCT ID");
                                report.skipped += 1;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        term = term.as_str(),
                        pages = report.pages,
                        error = %e,
                        "fetch failed; keeping partial results for term"
                    );
                    report.failure = Some(e.to_string());
                }
            }
        }

        tracing::info!(
            term = term.as_str(),
            pages = report.pages,
            records = report.records,
            "collected term"
        );
        collection.terms.push(report);
    }

    collection
}
