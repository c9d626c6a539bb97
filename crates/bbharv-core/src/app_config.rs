use std::path::PathBuf;

/// Runtime configuration for a harvest run.
///
/// Every field has a default so the binary works out of the box; see
/// [`crate::config::load_app_config`] for the corresponding `BBHARV_*`
/// environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root directory for harvested records; each site gets a subdirectory.
    pub output_dir: PathBuf,
    /// Append-only event log, kept across runs.
    pub event_log_path: PathBuf,
    pub log_level: String,
    /// User-Agent sent on both metadata requests and the browser session.
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Upper bound on every page-transition confirmation wait.
    pub wait_timeout_secs: u64,
    /// Pause after each confirmed pagination transition.
    pub page_delay_ms: u64,
    /// Politeness pause after each item, regardless of outcome.
    pub item_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Guard against cycling comment pagination.
    pub max_comment_pages: usize,
    pub chrome_headless: bool,
    pub chrome_executable: Option<PathBuf>,
}
