//! API key resolution from the environment and `.env` files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::config::config_dir;

/// Key-value pairs loaded from a `.env` file.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Returns a credential value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// A model API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Load credentials from a specific `.env` path.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be parsed.
pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "credentials file does not exist: {}",
            path.display()
        ));
    }

    warn_if_world_readable(path);

    let mut vars = BTreeMap::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read credentials at {}", path.display()))?;

    for item in iter {
        let (key, value) = item.with_context(|| {
            format!(
                "failed to parse key-value entry in credentials file {}",
                path.display()
            )
        })?;
        vars.insert(key, value);
    }

    Ok(Credentials { vars })
}

/// Path of the fallback credentials file (`~/.phone-recommender/.env`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_env_file() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join(".env"))
}

/// Find the API key stored under `var`.
///
/// Looks in `env` first, then in `fallback`. Blank values count as missing.
///
/// # Errors
///
/// Returns an error naming `var` when neither source has a non-blank value.
pub fn resolve_api_key(
    var: &str,
    env: impl Fn(&str) -> Option<String>,
    fallback: Option<&Credentials>,
) -> anyhow::Result<ApiKey> {
    if let Some(value) = env(var).filter(|v| !v.trim().is_empty()) {
        debug!(var, source = "environment", "api key resolved");
        return Ok(ApiKey::new(value));
    }
    if let Some(value) = fallback
        .and_then(|creds| creds.get(var))
        .filter(|v| !v.trim().is_empty())
    {
        debug!(var, source = "credentials file", "api key resolved");
        return Ok(ApiKey::new(value));
    }
    Err(anyhow::anyhow!(
        "missing API key: set {var} in the environment or in {}",
        default_env_file()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "~/.phone-recommender/.env".to_owned())
    ))
}

fn warn_if_world_readable(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if let Ok(metadata) = std::fs::metadata(path) {
            if metadata.permissions().mode() & 0o077 != 0 {
                warn!(
                    path = %path.display(),
                    "credentials file is readable by other users; consider chmod 600"
                );
            }
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}
