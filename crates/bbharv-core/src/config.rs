use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a `BBHARV_*` value does not parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a `BBHARV_*` value does not parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => match raw.as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                other => Err(ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: format!("expected a boolean, got {other:?}"),
                }),
            },
        }
    };

    let output_dir = PathBuf::from(or_default("BBHARV_OUTPUT_DIR", "./harvest"));
    let event_log_path = PathBuf::from(or_default(
        "BBHARV_EVENT_LOG",
        "./harvest/events.log",
    ));
    let log_level = or_default("BBHARV_LOG_LEVEL", "info");
    let user_agent = or_default(
        "BBHARV_USER_AGENT",
        "Mozilla/5.0 Chrome/124 Safari/537.36",
    );

    let request_timeout_secs = parse_u64("BBHARV_REQUEST_TIMEOUT_SECS", "10")?;
    let wait_timeout_secs = parse_u64("BBHARV_WAIT_TIMEOUT_SECS", "10")?;
    let page_delay_ms = parse_u64("BBHARV_PAGE_DELAY_MS", "500")?;
    let item_delay_ms = parse_u64("BBHARV_ITEM_DELAY_MS", "1000")?;
    let max_retries = parse_u32("BBHARV_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("BBHARV_RETRY_BACKOFF_BASE_SECS", "5")?;
    let max_comment_pages = parse_usize("BBHARV_MAX_COMMENT_PAGES", "200")?;
    let chrome_headless = parse_bool("BBHARV_CHROME_HEADLESS", true)?;
    let chrome_executable = lookup("BBHARV_CHROME_EXECUTABLE").ok().map(PathBuf::from);

    Ok(AppConfig {
        output_dir,
        event_log_path,
        log_level,
        user_agent,
        request_timeout_secs,
        wait_timeout_secs,
        page_delay_ms,
        item_delay_ms,
        max_retries,
        retry_backoff_base_secs,
        max_comment_pages,
        chrome_headless,
        chrome_executable,
    })
}
