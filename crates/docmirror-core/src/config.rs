//! Configuration module for docmirror.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding `remote.token`.
pub const TOKEN_ENV_VAR: &str = "DOCMIRROR_TOKEN";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for docmirror.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Origin API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Scheme and host of the API, without the `/api/v2` suffix.
    pub host: String,
    /// API token sent as `X-Auth-Token`. Overridden by `DOCMIRROR_TOKEN`.
    pub token: Option<String>,
    /// Mirror this account instead of the token's own account.
    pub user: Option<String>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

/// Local cache location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage root directory.
    pub root: PathBuf,
    /// Metadata directory holding the manifest, relative to `root`.
    pub meta_dir: PathBuf,
}

/// Synchronization behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum entities processed concurrently per level (1 = sequential).
    pub concurrency: usize,
    /// Skip scanning a repository's documents when the repository's own
    /// `updated_at` has not advanced. Faster, but misses document updates
    /// that do not bump the repository timestamp.
    pub trust_repository_timestamps: bool,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Whether to also write a debug-level log file.
    pub to_file: bool,
    /// Path of the log file. Defaults to `main.log` in the manifest directory.
    pub file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, or [`Config::default`] when no file exists there.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/docmirror/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("docmirror")
            .join("config.yaml")
    }

    /// Apply environment overrides (currently only [`TOKEN_ENV_VAR`]).
    pub fn apply_env(&mut self) {
        self.apply_token_override(std::env::var(TOKEN_ENV_VAR).ok());
    }

    fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.remote.token = Some(token);
        }
    }

    /// Directory handed to the manifest store: `storage.root/storage.meta_dir`.
    pub fn manifest_dir(&self) -> PathBuf {
        self.storage.root.join(&self.storage.meta_dir)
    }

    /// Effective log file path, or `None` when file logging is disabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        if !self.logging.to_file {
            return None;
        }
        Some(
            self.logging
                .file
                .clone()
                .unwrap_or_else(|| self.manifest_dir().join("main.log")),
        )
    }

    /// A copy safe to print: the token is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.remote.token.is_some() {
            copy.remote.token = Some("********".to_string());
        }
        copy
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "https://www.yuque.com".to_string(),
            token: None,
            user: None,
            user_agent: "docmirror".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("storage"),
            meta_dir: PathBuf::from(".meta"),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            trust_repository_timestamps: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            to_file: true,
            file: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.concurrency"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `sync.concurrency`.
pub const MAX_CONCURRENCY: usize = 32;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        if !(self.remote.host.starts_with("http://") || self.remote.host.starts_with("https://"))
        {
            errors.push(ValidationError {
                field: "remote.host".into(),
                message: format!("must be an http(s) URL, got '{}'", self.remote.host),
            });
        }
        if self
            .remote
            .token
            .as_deref()
            .map_or(true, |t| t.trim().is_empty())
        {
            errors.push(ValidationError {
                field: "remote.token".into(),
                message: format!("must be set (or provide {TOKEN_ENV_VAR})"),
            });
        }
        if self.remote.user_agent.trim().is_empty() {
            errors.push(ValidationError {
                field: "remote.user_agent".into(),
                message: "must not be empty".into(),
            });
        }
        if let Some(user) = &self.remote.user {
            if user.is_empty() || user.contains('/') {
                errors.push(ValidationError {
                    field: "remote.user".into(),
                    message: format!("invalid account login '{user}'"),
                });
            }
        }

        // --- storage ---
        if self.storage.root.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.root".into(),
                message: "must not be empty".into(),
            });
        }
        if self.storage.meta_dir.is_absolute() {
            errors.push(ValidationError {
                field: "storage.meta_dir".into(),
                message: "must be relative to storage.root".into(),
            });
        }

        // --- sync ---
        if self.sync.concurrency == 0 || self.sync.concurrency > MAX_CONCURRENCY {
            errors.push(ValidationError {
                field: "sync.concurrency".into(),
                message: format!("must be in range 1..={MAX_CONCURRENCY}"),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use docmirror_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .remote_token("secret")
///     .storage_root(PathBuf::from("/srv/mirror"))
///     .sync_concurrency(4)
///     .build();
/// assert_eq!(config.sync.concurrency, 4);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn remote_host(mut self, host: impl Into<String>) -> Self {
        self.config.remote.host = host.into();
        self
    }

    pub fn remote_token(mut self, token: impl Into<String>) -> Self {
        self.config.remote.token = Some(token.into());
        self
    }

    pub fn remote_user(mut self, user: impl Into<String>) -> Self {
        self.config.remote.user = Some(user.into());
        self
    }

    pub fn remote_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.remote.user_agent = user_agent.into();
        self
    }

    // --- storage ---

    pub fn storage_root(mut self, root: PathBuf) -> Self {
        self.config.storage.root = root;
        self
    }

    pub fn storage_meta_dir(mut self, meta_dir: PathBuf) -> Self {
        self.config.storage.meta_dir = meta_dir;
        self
    }

    // --- sync ---

    pub fn sync_concurrency(mut self, n: usize) -> Self {
        self.config.sync.concurrency = n;
        self
    }

    pub fn sync_trust_repository_timestamps(mut self, trust: bool) -> Self {
        self.config.sync.trust_repository_timestamps = trust;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_to_file(mut self, to_file: bool) -> Self {
        self.config.logging.to_file = to_file;
        self
    }

    pub fn logging_file(mut self, file: PathBuf) -> Self {
        self.config.logging.file = Some(file);
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
