//! Run configuration for `trialwatch pull`.
//!
//! Settings come from an optional TOML file. Every key has a default, so an
//! empty file (or no file at all) is a valid configuration.
//!
//! # Example
//!
//! ```toml
//! [registry]
//! base_url = "https://clinicaltrials.gov/api/v2/studies"
//! page_size = 100
//!
//! [snapshots]
//! previous = "oldClinicalTrialsData.csv"
//! current = "newClinicalTrialsData.csv"
//!
//! [report]
//! dir = "."
//! prefix = "ClinicalTrialChanges"
//!
//! [assets]
//! file = "assets.csv"
//! terms = ["bitopertin"]
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "trialwatch.toml";

pub const DEFAULT_REGISTRY_URL: &str = "https://clinicaltrials.gov/api/v2/studies";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Largest page the registry will serve.
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration in '{}': {message}", path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("could not read asset list '{}': {message}", path.display())]
    Assets { path: PathBuf, message: String },

    #[error("previous and current snapshots must be different files, both are '{}'", path.display())]
    SharedSnapshotPath { path: PathBuf },

    #[error("no query terms given; pass --term, --assets, or set [assets] in the config file")]
    NoTerms,
}

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub registry: RegistrySettings,
    pub snapshots: SnapshotSettings,
    pub report: ReportSettings,
    pub assets: AssetSettings,
}

/// `[registry]`: where studies are fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySettings {
    pub base_url: String,
    pub page_size: u32,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// `[snapshots]`: the two persisted generations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapshotSettings {
    pub previous: PathBuf,
    pub current: PathBuf,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            previous: PathBuf::from("oldClinicalTrialsData.csv"),
            current: PathBuf::from("newClinicalTrialsData.csv"),
        }
    }
}

/// `[report]`: where dated change reports land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    pub dir: PathBuf,
    pub prefix: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            prefix: "ClinicalTrialChanges".to_string(),
        }
    }
}

/// `[assets]`: query terms, inline and/or from an asset list file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetSettings {
    pub file: Option<PathBuf>,
    pub terms: Vec<String>,
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and validate a config file.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate(path)?;
    Ok(config)
}

/// Load `explicit` if given, else [`DEFAULT_CONFIG_FILE`] if it exists in the
/// working directory, else the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        tracing::info!(path = DEFAULT_CONFIG_FILE, "using config file");
        return read_config(default_path);
    }
    Ok(Config::default())
}

impl Config {
    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        };
        if self.registry.base_url.trim().is_empty() {
            return Err(invalid("registry.base_url must not be empty".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.registry.page_size) {
            return Err(invalid(format!(
                "registry.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.registry.page_size
            )));
        }
        if self.report.prefix.trim().is_empty() {
            return Err(invalid("report.prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Append `more` to `terms`, trimming each and skipping blanks and repeats.
pub fn extend_terms<I, S>(terms: &mut Vec<String>, more: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for term in more {
        let term = term.as_ref().trim();
        if !term.is_empty() && !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }
}
