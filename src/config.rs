//! Configuration loading and validation.
//!
//! Settings come from a TOML file (default `~/.phone-recommender/config.toml`).
//! Precedence: env vars > config file > defaults. A missing file is not an
//! error; every section has defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::providers::gemini::{DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_URL};

/// Env var naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "PHONE_RECOMMENDER_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model gateway settings.
    pub model: ModelConfig,
    /// Catalog source.
    pub catalog: CatalogConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Model gateway settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Gemini model name.
    pub name: String,
    /// API base URL.
    pub base_url: String,
    /// Env var holding the API key.
    pub api_key_env: String,
    /// Output token cap.
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature, `0.0..=2.0`.
    pub temperature: Option<f32>,
    /// Whole-request HTTP timeout in seconds. Unset means no client timeout.
    pub timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_GEMINI_MODEL.to_owned(),
            base_url: DEFAULT_GEMINI_URL.to_owned(),
            api_key_env: default_api_key_env(),
            max_output_tokens: None,
            temperature: None,
            timeout_secs: None,
        }
    }
}

/// Catalog source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON catalog file. Unset means the built-in catalog.
    pub path: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for rotated JSON logs. Unset means stderr only.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            dir: None,
        }
    }
}

fn ignore_override(var: &str, value: &str) {
    tracing::warn!(var, value, "ignoring invalid env override");
}

fn is_valid_log_filter(filter: &str) -> bool {
    !filter.trim().is_empty() && tracing_subscriber::EnvFilter::try_new(filter).is_ok()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_owned()
}

impl Config {
    /// Parse and validate a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML or a failed [`Config::validate`].
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(toml_str).context("failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `env`.
    ///
    /// Takes a resolver so tests do not have to mutate the process env. A
    /// blank or unparseable value is ignored with a warning and the current
    /// setting stays.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("PHONE_RECOMMENDER_MODEL") {
            if v.trim().is_empty() {
                ignore_override("PHONE_RECOMMENDER_MODEL", &v);
            } else {
                self.model.name = v;
            }
        }
        if let Some(v) = env("PHONE_RECOMMENDER_BASE_URL") {
            match url::Url::parse(&v) {
                Ok(_) => self.model.base_url = v,
                Err(_) => ignore_override("PHONE_RECOMMENDER_BASE_URL", &v),
            }
        }
        if let Some(v) = env("PHONE_RECOMMENDER_CATALOG") {
            if v.trim().is_empty() {
                ignore_override("PHONE_RECOMMENDER_CATALOG", &v);
            } else {
                self.catalog.path = Some(PathBuf::from(v));
            }
        }
        if let Some(v) = env("PHONE_RECOMMENDER_LOG_LEVEL") {
            if is_valid_log_filter(&v) {
                self.logging.level = v;
            } else {
                ignore_override("PHONE_RECOMMENDER_LOG_LEVEL", &v);
            }
        }
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty model name or API key env var, an
    /// unparseable base URL or log filter, or a temperature outside
    /// `0.0..=2.0`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.model.name.trim().is_empty() {
            anyhow::bail!("model.name must not be empty");
        }
        if self.model.api_key_env.trim().is_empty() {
            anyhow::bail!("model.api_key_env must not be empty");
        }
        url::Url::parse(&self.model.base_url)
            .with_context(|| format!("model.base_url is not a valid URL: {}", self.model.base_url))?;
        if !is_valid_log_filter(&self.logging.level) {
            anyhow::bail!("logging.level is not a valid filter: {:?}", self.logging.level);
        }
        if let Some(t) = self.model.temperature {
            if !(0.0..=2.0).contains(&t) {
                anyhow::bail!("model.temperature must be between 0.0 and 2.0, got {t}");
            }
        }
        Ok(())
    }
}

/// Load a config file, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed or
/// validated.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            tracing::debug!(path = %path.display(), "loading config from file");
            Config::from_toml(&contents)
                .with_context(|| format!("invalid config at {}", path.display()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(anyhow::anyhow!(
            "failed to read config at {}: {e}",
            path.display()
        )),
    }
}

/// Load configuration with full precedence: env > file > defaults.
///
/// The file is `explicit` if given, else `$PHONE_RECOMMENDER_CONFIG`, else
/// `~/.phone-recommender/config.toml`.
///
/// # Errors
///
/// Returns an error when the path cannot be resolved, the file is invalid,
/// or the overridden config fails validation.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let env = |key: &str| std::env::var(key).ok();
    let path = resolve_config_path(explicit, env)?;
    let mut config = load_config(&path)?;
    config.apply_overrides(env);
    config.validate()?;
    Ok(config)
}

/// Resolve which config file to read.
///
/// # Errors
///
/// Returns an error only when falling back to the home directory and it
/// cannot be determined.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join("config.toml"))
}

/// Resolve the default config directory (`~/.phone-recommender/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".phone-recommender"))
}
