mod assets;
mod commands;
mod config;
mod registry;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use commands::pull::PullArgs;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Clinical trial registry change tracker.
#[derive(Parser)]
#[command(
    name = "trialwatch",
    version,
    about = "Clinical trial registry change tracker"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log progress to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull trials for every tracked term, persist the snapshot, and report changes
    Pull {
        /// Query term to track; repeatable, appended to configured terms
        #[arg(long = "term", value_name = "TERM")]
        terms: Vec<String>,
        /// Asset list file (CSV with an "Asset" column, or one term per line)
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Config file (defaults to ./trialwatch.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Path of the previous snapshot generation
        #[arg(long)]
        previous: Option<PathBuf>,
        /// Path of the current snapshot generation
        #[arg(long)]
        current: Option<PathBuf>,
        /// Directory for dated change reports
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// Compare two persisted snapshots
    Diff {
        /// Path to the previous snapshot CSV
        previous: PathBuf,
        /// Path to the current snapshot CSV
        current: PathBuf,
        /// Also write the change report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Pull {
            terms,
            assets,
            config,
            previous,
            current,
            report_dir,
        } => {
            commands::pull::cmd_pull(
                PullArgs {
                    terms,
                    assets,
                    config,
                    previous,
                    current,
                    report_dir,
                },
                cli.output,
                cli.quiet,
            );
        }
        Commands::Diff {
            previous,
            current,
            report,
        } => {
            commands::diff::cmd_diff(&previous, &current, report.as_deref(), cli.output, cli.quiet);
        }
    }
}

/// Logs go to stderr so stdout stays reserved for command output.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
