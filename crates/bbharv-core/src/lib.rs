//! Shared configuration and record model for the bbharv workspace.

pub mod app_config;
pub mod config;
pub mod record;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use record::{Comment, HarvestRecord, PostDetail, PostId, PostMeta, PostSummary};
