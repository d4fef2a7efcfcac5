//! Configuration management for Folio.
//!
//! Parses `folio.toml` with serde and discovers it in the current directory
//! or any parent. CLI overrides are applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! `${VAR}` and `${VAR:-default}` are expanded in:
//! - `site.root`
//! - `site.output_dir`
//! - `theme.layout`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// Default rendering component for generated pages.
pub const DEFAULT_LAYOUT: &str = "layouts/SourceLayout";

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the configured source roots.
    pub source: Option<SourceRoots>,
    /// Override the output directory.
    pub output_dir: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override remote asset fetching.
    pub assets_enabled: Option<bool>,
}

/// Top-level content directories eligible for page generation.
///
/// Written in TOML either as a single string or as an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SourceRoots {
    /// `source = "docs"`
    Single(String),
    /// `source = ["blog", "notes"]`
    Many(Vec<String>),
}

impl SourceRoots {
    /// All configured directory names, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Whether `segment` is one of the configured names.
    pub fn contains(&self, segment: &str) -> bool {
        match self {
            Self::Single(name) => name == segment,
            Self::Many(names) => names.iter().any(|n| n == segment),
        }
    }
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site layout (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Theme options handed to the source plugin.
    pub theme: ThemeConfig,
    /// Remote asset fetching.
    pub assets: AssetsConfig,
    cache: CacheConfigRaw,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    root: Option<String>,
    output_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
}

/// Resolved site configuration with absolute paths.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Directory containing the source root directories.
    pub root: PathBuf,
    /// Where `pages.json` is written.
    pub output_dir: PathBuf,
    /// Project data directory (`.folio/`).
    pub project_dir: PathBuf,
    /// Whether caching is enabled.
    pub cache_enabled: bool,
}

impl SiteConfig {
    /// Cache directory path (`.folio/cache/`).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.project_dir.join("cache")
    }

    /// Downloaded remote files (`.folio/assets/`).
    #[must_use]
    pub fn assets_dir(&self) -> PathBuf {
        self.project_dir.join("assets")
    }
}

/// Theme options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Source roots. `None` disables page generation.
    pub source: Option<SourceRoots>,
    /// Rendering component reference attached to every generated page.
    pub layout: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            source: None,
            layout: DEFAULT_LAYOUT.to_owned(),
        }
    }
}

/// Remote asset configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Whether featured images are downloaded.
    pub enabled: bool,
    /// HTTP timeout for a single download, in seconds.
    pub timeout_secs: u64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 30,
        }
    }
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
        /// Config field path (e.g., "`site.root`").
        field: String,
        /// Error message (e.g., "${`SITE_ROOT`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// Uses `config_path` when given, otherwise searches for `folio.toml` in
    /// the current directory and its parents, otherwise falls back to
    /// defaults rooted at the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the result does not validate.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source) = &settings.source {
            self.theme.source = Some(source.clone());
        }
        if let Some(output_dir) = &settings.output_dir {
            self.site_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.site_resolved.cache_enabled = cache_enabled;
        }
        if let Some(assets_enabled) = settings.assets_enabled {
            self.assets.enabled = assets_enabled;
        }
    }

    /// Directories to source content from: `site.root/<name>` for every
    /// configured source root.
    #[must_use]
    pub fn source_dirs(&self) -> Vec<(String, PathBuf)> {
        self.theme
            .source
            .iter()
            .flat_map(SourceRoots::names)
            .map(|name| (name.to_owned(), self.site_resolved.root.join(name)))
            .collect()
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
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

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            theme: ThemeConfig::default(),
            assets: AssetsConfig::default(),
            cache: CacheConfigRaw::default(),
            site_resolved: SiteConfig {
                root: base.to_path_buf(),
                output_dir: base.join(".folio/build"),
                project_dir: base.join(".folio"),
                cache_enabled: true,
            },
            config_path: None,
        }
    }

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
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` describing the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_theme()?;
        if self.assets.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "assets.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_theme(&self) -> Result<(), ConfigError> {
        if self.theme.layout.is_empty() {
            return Err(ConfigError::Validation(
                "theme.layout cannot be empty".to_owned(),
            ));
        }

        let Some(source) = &self.theme.source else {
            return Ok(());
        };
        if let SourceRoots::Many(names) = source
            && names.is_empty()
        {
            return Err(ConfigError::Validation(
                "theme.source cannot be an empty list".to_owned(),
            ));
        }
        for name in source.names() {
            if name.is_empty() {
                return Err(ConfigError::Validation(
                    "theme.source entries cannot be empty".to_owned(),
                ));
            }
            if name.contains('/') || name.contains('\\') {
                return Err(ConfigError::Validation(format!(
                    "theme.source entry {name:?} must be a single directory name"
                )));
            }
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(root) = self.site.root.take() {
            self.site.root = Some(expand::expand_env(&root, "site.root")?);
        }
        if let Some(output_dir) = self.site.output_dir.take() {
            self.site.output_dir = Some(expand::expand_env(&output_dir, "site.output_dir")?);
        }
        self.theme.layout = expand::expand_env(&self.theme.layout, "theme.layout")?;
        Ok(())
    }

    /// Resolve relative paths against the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.site_resolved = SiteConfig {
            root: config_dir.join(self.site.root.as_deref().unwrap_or(".")),
            output_dir: config_dir.join(self.site.output_dir.as_deref().unwrap_or(".folio/build")),
            project_dir: config_dir.join(".folio"),
            cache_enabled: self.cache.enabled.unwrap_or(true),
        };
    }
}
