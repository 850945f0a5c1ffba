use std::path::Path;
use std::process;

use time::OffsetDateTime;
use trialwatch_core::{change_sections, diff_snapshots, trial_schema, ArtifactWriter, JsonReportWriter};
use trialwatch_storage::read_snapshot;

use crate::{report_error, OutputFormat};

/// Compare two persisted snapshots. Exits 1 when they differ.
pub(crate) fn cmd_diff(
    previous_path: &Path,
    current_path: &Path,
    report: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let schema = trial_schema();

    let previous = match read_snapshot(previous_path, &schema) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    let current = match read_snapshot(current_path, &schema) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let snapshot_diff = match diff_snapshots(&previous, &current) {
        Ok(d) => d,
        Err(e) => {
            report_error(&format!("diff error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if let Some(path) = report {
        let writer = JsonReportWriter::at_path(path, OffsetDateTime::now_utc().date());
        if let Err(e) = writer.write_artifact(&change_sections(&snapshot_diff, &current)) {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }

    if !quiet {
        match output {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&snapshot_diff.to_json()).unwrap_or_default()
                );
            }
            OutputFormat::Text if snapshot_diff.is_empty() => {
                println!("no differences");
            }
            OutputFormat::Text => {
                println!("{}", snapshot_diff.to_text());
            }
        }
    }

    if !snapshot_diff.is_empty() {
        process::exit(1);
    }
}
