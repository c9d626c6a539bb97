mod crawl;
mod flag;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bbharv")]
#[command(about = "Forum thread harvester with resumable crawls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Harvest posts from a board, descending over a numeric range.
    Crawl {
        /// Target board (see `known sites` in the error message for the list).
        #[arg(long)]
        site: String,
        /// First index processed (post id or list page, per site).
        #[arg(long)]
        start: u64,
        /// Last index processed, inclusive.
        #[arg(long, default_value_t = 1)]
        end: u64,
        /// Re-crawl posts that are already stored.
        #[arg(long)]
        force: bool,
        /// Admission policy override: `mean` or `fixed:<n>`.
        #[arg(long)]
        policy: Option<String>,
        /// Show what would be crawled without opening a browser.
        #[arg(long)]
        dry_run: bool,
    },
    /// Annotate stored records with keyword hits (post-processing pass).
    Flag {
        #[arg(long)]
        site: String,
        /// Newline-delimited keyword list; `#` starts a comment line.
        #[arg(long)]
        keywords: PathBuf,
    },
    /// Print store statistics.
    Report {
        /// Restrict to one site; all known sites otherwise.
        #[arg(long)]
        site: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = bbharv_core::load_app_config()?;
    init_tracing(&config)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl {
            site,
            start,
            end,
            force,
            policy,
            dry_run,
        } => {
            crawl::run_crawl(&config, &site, start, end, force, policy.as_deref(), dry_run).await
        }
        Commands::Flag { site, keywords } => flag::run_flag(&config, &site, &keywords),
        Commands::Report { site } => report::run_report(&config, site.as_deref()),
    }
}

/// Two sinks: the operator tally on stderr, and an append-only event log
/// file that accumulates across runs for post-hoc auditing.
fn init_tracing(config: &bbharv_core::AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    if let Some(parent) = config.event_log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let event_log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.event_log_path)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(event_log)),
        )
        .init();

    Ok(())
}
