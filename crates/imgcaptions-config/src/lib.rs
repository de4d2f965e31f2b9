//! Configuration management for imgcaptions.
//!
//! Parses `imgcaptions.toml` with serde and provides auto-discovery of the
//! config file in parent directories.
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults
//! 2. the config file
//! 3. a page's front-matter overrides ([`FilterOverrides`])
//! 4. CLI settings ([`CliSettings`])
//!
//! ## Environment Variable Expansion
//!
//! `prefix`, `site.pages_dir` and `site.base_url` support `${VAR}` and
//! `${VAR:-default}`.

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};

use imgcaptions_filter::{FilterConfig, MergePolicy, Mode};
use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "imgcaptions.toml";

/// Optional filter settings layered over the config file.
///
/// Used both for a page's `imgcaptions` front-matter table and for CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterOverrides {
    pub enabled: Option<bool>,
    pub mode: Option<Mode>,
    pub merge: Option<MergePolicy>,
    pub prefix: Option<String>,
}

impl FilterOverrides {
    fn apply_to(&self, config: &mut FilterConfig) {
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(merge) = self.merge {
            config.merge = merge;
        }
        if let Some(prefix) = &self.prefix {
            config.prefix.clone_from(prefix);
        }
    }
}

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Filter settings; these also win over page front matter.
    pub filter: FilterOverrides,
    /// Override pages directory.
    pub pages_dir: Option<PathBuf>,
    /// Override site base URL.
    pub base_url: Option<String>,
}

/// Pipeline event the filter runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Event {
    /// Raw page content, before Markdown is rendered.
    #[serde(rename = "onPageContentRaw")]
    PageContentRaw,
    /// Page content after rendering to HTML.
    #[serde(rename = "onPageContentProcessed")]
    PageContentProcessed,
}

impl Event {
    /// Event used when none is configured.
    #[must_use]
    pub fn default_for(mode: Mode) -> Self {
        match mode {
            Mode::Markdown => Self::PageContentRaw,
            Mode::Html => Self::PageContentProcessed,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PageContentRaw => "onPageContentRaw",
            Self::PageContentProcessed => "onPageContentProcessed",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether the filter runs at all.
    pub enabled: bool,
    /// Surface syntax to rewrite.
    pub mode: Mode,
    /// Pipeline event; derived from `mode` when unset.
    event: Option<Event>,
    /// Attribute merge policy.
    pub merge: MergePolicy,
    /// Route prefix handed to the resolver in HTML mode.
    pub prefix: String,
    /// Site configuration (paths are relative strings from TOML).
    site: SiteConfigRaw,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
    /// Filter settings from the CLI, reapplied over page overrides.
    #[serde(skip)]
    cli_filter: FilterOverrides,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw site configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    pages_dir: Option<String>,
    base_url: Option<String>,
}

/// Resolved site configuration with absolute paths.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Directory holding the page tree.
    pub pages_dir: PathBuf,
    /// Prefix for page URLs.
    pub base_url: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.base_url`").
        field: String,
        /// Error message from the expander.
        message: String,
    },
}

/// Require a base URL to be empty, a root-relative path or an http(s) URL.
fn require_base_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if url.is_empty()
        || url.starts_with('/')
        || url.starts_with("http://")
        || url.starts_with("https://")
    {
        return Ok(());
    }
    Err(ConfigError::Validation(format!(
        "{field} must be empty, start with '/', or start with http:// or https://"
    )))
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `imgcaptions.toml` in the current directory and
    /// its parents, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Pipeline event, explicit or derived from `mode`.
    #[must_use]
    pub fn event(&self) -> Event {
        self.event_for(self.mode)
    }

    /// Pipeline event for a page rendered in `mode`; an explicit `event` wins.
    #[must_use]
    pub fn event_for(&self, mode: Mode) -> Event {
        self.event.unwrap_or_else(|| Event::default_for(mode))
    }

    /// Filter settings for one page.
    ///
    /// `page` overrides the file values; CLI settings override both.
    #[must_use]
    pub fn filter_config(&self, page: &FilterOverrides) -> FilterConfig {
        let mut config = FilterConfig {
            enabled: self.enabled,
            mode: self.mode,
            merge: self.merge,
            prefix: self.prefix.clone(),
        };
        page.apply_to(&mut config);
        self.cli_filter.apply_to(&mut config);
        config
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let filter = &settings.filter;
        if let Some(enabled) = filter.enabled {
            self.enabled = enabled;
        }
        if let Some(mode) = filter.mode {
            self.mode = mode;
        }
        if let Some(merge) = filter.merge {
            self.merge = merge;
        }
        if let Some(prefix) = &filter.prefix {
            self.prefix.clone_from(prefix);
        }
        if let Some(pages_dir) = &settings.pages_dir {
            self.site_resolved.pages_dir.clone_from(pages_dir);
        }
        if let Some(base_url) = &settings.base_url {
            self.site_resolved.base_url.clone_from(base_url);
        }
        self.cli_filter = filter.clone();
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            enabled: true,
            mode: Mode::default(),
            event: None,
            merge: MergePolicy::default(),
            prefix: String::new(),
            site: SiteConfigRaw::default(),
            site_resolved: SiteConfig {
                pages_dir: base.join("pages"),
                base_url: String::new(),
            },
            config_path: None,
            cli_filter: FilterOverrides::default(),
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_base_url(&self.site_resolved.base_url, "site.base_url")?;
        if self.prefix.contains(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "prefix cannot contain whitespace".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.prefix = expand::expand_env(&self.prefix, "prefix")?;
        if let Some(ref pages_dir) = self.site.pages_dir {
            self.site.pages_dir = Some(expand::expand_env(pages_dir, "site.pages_dir")?);
        }
        if let Some(ref base_url) = self.site.base_url {
            self.site.base_url = Some(expand::expand_env(base_url, "site.base_url")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.site_resolved = SiteConfig {
            pages_dir: config_dir.join(self.site.pages_dir.as_deref().unwrap_or("pages")),
            base_url: self.site.base_url.clone().unwrap_or_default(),
        };
    }
}

/// Search for the config file in `start` and its parents.
#[must_use]
pub fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
