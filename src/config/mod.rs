//! Configuration: per-user settings and per-project lint settings.

mod project;
mod user;

pub use project::{PROJECT_CONFIG_FILE, PROJECT_CONFIG_TEMPLATE, ProjectConfig};
pub use user::{UserConfig, validate_index_url};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid index URL `{url}`: {reason}")]
    InvalidIndexUrl { url: String, reason: String },

    #[error("concurrency must be at least 1")]
    InvalidConcurrency,
}
