use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "APP_";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(anyhow!("unknown environment {other:?}; expected development|staging|production")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppSection {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub enable_debug: bool,
    #[serde(default)]
    pub enable_analytics: bool,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            version: default_version(),
            environment: Environment::default(),
            enable_debug: false,
            enable_analytics: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default = "default_api_timeout")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { url: default_api_url(), timeout_ms: default_api_timeout() }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Upper bound on stored bytes (keys plus values); unlimited when absent.
    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::default(), path: default_storage_path(), quota_bytes: None }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: LogFormat::default(), filter: default_log_filter() }
    }
}

fn default_title() -> String { "appkit".into() }
fn default_version() -> String { env!("CARGO_PKG_VERSION").into() }
fn default_api_url() -> String { "http://localhost:3000/api".into() }
fn default_api_timeout() -> u64 { 10_000 }
fn default_storage_path() -> PathBuf { PathBuf::from("data/storage.json") }
fn default_log_filter() -> String { "info".into() }

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| anyhow!("cannot read {path}: {e}"))?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load from `path` (or `CONFIG_PATH`), apply `APP_*` overrides, then
    /// validate. Starts from defaults when the file is missing; a present but
    /// malformed file is still an error.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        let path = path.map(str::to_string).unwrap_or_else(config_path);
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            debug!(%path, "config file not found; using defaults");
            AppConfig::default()
        };
        cfg.apply_env_overrides();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply `APP_*` overrides using `lookup` to resolve variable names.
    /// Unparseable values are ignored and the file value is kept.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));
        if let Some(v) = var("TITLE") { self.app.title = v; }
        if let Some(v) = var("VERSION") { self.app.version = v; }
        if let Some(env) = var("ENVIRONMENT").and_then(|v| v.parse().ok()) { self.app.environment = env; }
        if let Some(b) = var("ENABLE_DEBUG").and_then(|v| parse_flag(&v)) { self.app.enable_debug = b; }
        if let Some(b) = var("ENABLE_ANALYTICS").and_then(|v| parse_flag(&v)) { self.app.enable_analytics = b; }
        if let Some(v) = var("API_URL") { self.api.url = v; }
        if let Some(ms) = var("API_TIMEOUT").and_then(|v| v.trim().parse().ok()) { self.api.timeout_ms = ms; }
        if let Some(v) = var("STORAGE_PATH") { self.storage.path = PathBuf::from(v); }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.app.normalize();
        self.api.validate()?;
        self.storage.validate()?;
        if self.logging.filter.trim().is_empty() {
            self.logging.filter = default_log_filter();
        }
        Ok(())
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl AppSection {
    fn normalize(&mut self) {
        if self.title.trim().is_empty() {
            self.title = default_title();
        }
        if self.version.trim().is_empty() {
            self.version = default_version();
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        let lower = self.url.trim().to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("api.url must start with http:// or https://"));
        }
        if self.timeout_ms == 0 {
            return Err(anyhow!("api.timeout_ms must be a positive number of milliseconds"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backend == StorageBackend::File && self.path.as_os_str().is_empty() {
            return Err(anyhow!("storage.path is required for the file backend"));
        }
        if self.quota_bytes == Some(0) {
            return Err(anyhow!("storage.quota_bytes must be > 0 when set"));
        }
        Ok(())
    }
}
