//! CLI error types.

use imgcaptions_config::ConfigError;
use imgcaptions_filter::PatternError;
use imgcaptions_site::SiteError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Site(#[from] SiteError),

    #[error("{0}")]
    Pattern(#[from] PatternError),

    #[error("{0}")]
    Validation(String),
}
