use std::path::PathBuf;
use std::process;

use time::OffsetDateTime;
use trialwatch_core::{run, trial_schema, JsonReportWriter};
use trialwatch_storage::CsvSnapshotStore;

use crate::assets::read_asset_terms;
use crate::config::{extend_terms, load_config, Config, ConfigError};
use crate::registry::RegistryClient;
use crate::{report_error, OutputFormat};

/// Command-line overrides for `trialwatch pull`.
#[derive(Debug, Default)]
pub(crate) struct PullArgs {
    pub terms: Vec<String>,
    pub assets: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub previous: Option<PathBuf>,
    pub current: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
}

impl PullArgs {
    /// Layer the flags over the config file and gather the query terms:
    /// configured terms, then the asset list, then `--term` values.
    fn resolve(self) -> Result<(Config, Vec<String>), ConfigError> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(path) = self.previous {
            config.snapshots.previous = path;
        }
        if let Some(path) = self.current {
            config.snapshots.current = path;
        }
        if let Some(dir) = self.report_dir {
            config.report.dir = dir;
        }
        if let Some(file) = self.assets {
            config.assets.file = Some(file);
        }
        if config.snapshots.previous == config.snapshots.current {
            return Err(ConfigError::SharedSnapshotPath {
                path: config.snapshots.current,
            });
        }

        let mut terms = Vec::new();
        extend_terms(&mut terms, &config.assets.terms);
        if let Some(file) = &config.assets.file {
            extend_terms(&mut terms, read_asset_terms(file)?);
        }
        extend_terms(&mut terms, &self.terms);

        if terms.is_empty() {
            return Err(ConfigError::NoTerms);
        }
        Ok((config, terms))
    }
}

pub(crate) fn cmd_pull(args: PullArgs, output: OutputFormat, quiet: bool) {
    let (config, terms) = match args.resolve() {
        Ok(resolved) => resolved,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    tracing::info!(terms = ?terms, base_url = %config.registry.base_url, "pulling registry data");

    let mut client = RegistryClient::new(&config.registry.base_url, config.registry.page_size);
    let mut store = CsvSnapshotStore::new(
        config.snapshots.previous,
        config.snapshots.current,
        trial_schema(),
    );
    let writer = JsonReportWriter::dated(
        config.report.dir,
        config.report.prefix,
        OffsetDateTime::now_utc().date(),
    );

    let summary = match run(&terms, &mut client, &mut store, &writer) {
        Ok(summary) => summary,
        Err(e) => {
            report_error(&format!("pull failed: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if !quiet {
        match output {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).unwrap_or_default()
                );
            }
            OutputFormat::Text => {
                println!("{}", summary.to_text());
            }
        }
    }
}
