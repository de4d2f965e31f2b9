//! Site errors.

use std::path::PathBuf;

/// Error scanning a page tree or reading a page header.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Pages directory does not exist.
    #[error("Pages directory not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error reading the pages directory.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Front matter is not valid YAML.
    #[error("Invalid front matter: {0}")]
    FrontMatter(String),
}
