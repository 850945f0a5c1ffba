//! HTTP client for the trial registry's study search API.
//!
//! [`RegistryClient`] is the production [`StudySource`]: one blocking GET per
//! page, `GET {base_url}?query.term=<term>&pageSize=<n>[&pageToken=<t>]`.

use trialwatch_core::{FetchError, StudyPage, StudySource};

pub struct RegistryClient {
    agent: ureq::Agent,
    base_url: String,
    page_size: u32,
}

impl RegistryClient {
    pub fn new(base_url: &str, page_size: u32) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size,
        }
    }
}

impl StudySource for RegistryClient {
    fn fetch_page(&mut self, term: &str, page_token: Option<&str>) -> Result<StudyPage, FetchError> {
        let mut request = self
            .agent
            .get(&self.base_url)
            .header("Accept", "application/json")
            .query("query.term", term)
            .query("pageSize", self.page_size.to_string());
        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }

        let response = request.call().map_err(|e| classify_error(e, term))?;

        response
            .into_body()
            .read_json::<StudyPage>()
            .map_err(|e| FetchError::Decode {
                term: term.to_string(),
                message: e.to_string(),
            })
    }
}

/// Status errors keep their code; everything else is a transport failure.
fn classify_error(err: ureq::Error, term: &str) -> FetchError {
    match err {
        ureq::Error::StatusCode(status) => FetchError::Status {
            term: term.to_string(),
            status,
        },
        other => FetchError::Transport {
            term: term.to_string(),
            message: other.to_string(),
        },
    }
}
