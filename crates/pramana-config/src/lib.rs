// crates/pramana-config/src/lib.rs
// ============================================================================
// Module: Pramana User Configuration
// Description: TOML user config with strict load guards and private storage.
// Purpose: Persist mode preference and submission credentials across runs.
// Dependencies: pramana-core, serde, toml
// ============================================================================

//! ## Overview
//! The user config lives at `$HOME/.pramana/pramana.toml` (overridable via
//! `PRAMANA_CONFIG` or an explicit path) and holds the preferred provider
//! mode, an optional submission token, and endpoint overrides. Loading is
//! strict and fail-closed: bounded path and file sizes, UTF-8 only, unknown
//! keys rejected, token length capped. A missing file is not an error; it
//! yields the defaults. Saving restricts permissions to the owner because
//! the file can hold a bearer token.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use pramana_core::ProviderMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable overriding the config file path.
pub const CONFIG_ENV_VAR: &str = "PRAMANA_CONFIG";

/// Directory under `$HOME` holding the config file.
pub const CONFIG_DIR_NAME: &str = ".pramana";

/// Config file name within the config directory.
pub const CONFIG_FILE_NAME: &str = "pramana.toml";

/// Default submission backend base URL.
pub const DEFAULT_SUBMISSION_URL: &str = "https://pramana-eval.vercel.app";

/// Maximum config file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: u64 = 65_536;

/// Maximum config path length in bytes.
const MAX_PATH_LENGTH: usize = 4_096;

/// Maximum length of one path component in bytes.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;

/// Maximum stored token length in bytes.
const MAX_TOKEN_LENGTH: usize = 4_096;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or saving the user config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config path exceeds the length bound.
    #[error("config path exceeds max length of {MAX_PATH_LENGTH} bytes")]
    PathTooLong,
    /// One path component exceeds the length bound.
    #[error("config path component too long (max {MAX_PATH_COMPONENT_LENGTH} bytes)")]
    PathComponentTooLong,
    /// The config file exceeds the size bound.
    #[error("config file exceeds size limit of {MAX_CONFIG_FILE_SIZE} bytes")]
    FileTooLarge,
    /// The config file is not valid UTF-8.
    #[error("config file must be utf-8")]
    NotUtf8,
    /// The config file failed TOML parsing or carried unknown keys.
    #[error("invalid config: {0}")]
    Parse(String),
    /// The stored token exceeds the length bound.
    #[error("token exceeds max length of {MAX_TOKEN_LENGTH} bytes")]
    TokenTooLong,
    /// No home directory is available to derive the default path.
    #[error("cannot determine config path: HOME is not set")]
    HomeNotSet,
    /// Filesystem failure other than a missing file.
    #[error("config io error at {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

// ============================================================================
// SECTION: User Config
// ============================================================================

/// Persisted user preferences and credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct UserConfig {
    /// Mode tried first during auto resolution.
    pub preferred_mode: ProviderMode,
    /// Bearer token for result submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Submission backend base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Local suite store root override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suites_dir: Option<PathBuf>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            preferred_mode: ProviderMode::Subscription,
            token: None,
            api_url: None,
            suites_dir: None,
        }
    }
}

impl UserConfig {
    /// Loads the config from the given path, the `PRAMANA_CONFIG` override,
    /// or the default location, in that order. A missing file yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on path bound violations, oversized or
    /// non-UTF-8 files, parse failures, unknown keys, or oversized tokens.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = match path {
            Some(explicit) => explicit.to_path_buf(),
            None => resolve_default_path()?,
        };
        validate_path(&resolved)?;

        let bytes = match fs::read(&resolved) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(ConfigError::Io {
                    path: resolved,
                    source: err,
                });
            }
        };
        if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::FileTooLarge);
        }
        let text = str::from_utf8(&bytes).map_err(|_| ConfigError::NotUtf8)?;
        let config: Self =
            toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the config, creating the parent directory with owner-only
    /// permissions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on validation or filesystem failures.
    pub fn save(&self, path: Option<&Path>) -> Result<(), ConfigError> {
        self.validate()?;
        let resolved = match path {
            Some(explicit) => explicit.to_path_buf(),
            None => resolve_default_path()?,
        };
        validate_path(&resolved)?;

        let text =
            toml::to_string_pretty(self).map_err(|err| ConfigError::Parse(err.to_string()))?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|err| ConfigError::Io {
                path: parent.to_path_buf(),
                source: err,
            })?;
            restrict_permissions(parent, 0o700)?;
        }
        fs::write(&resolved, text).map_err(|err| ConfigError::Io {
            path: resolved.clone(),
            source: err,
        })?;
        restrict_permissions(&resolved, 0o600)?;
        Ok(())
    }

    /// Returns the effective submission base URL.
    #[must_use]
    pub fn submission_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_SUBMISSION_URL)
    }

    /// Builds the submission auth context from this config.
    #[must_use]
    pub fn auth_context(&self) -> AuthContext {
        AuthContext {
            bearer_token: self.token.clone(),
            submission_url: self.submission_url().to_string(),
        }
    }

    /// Validates field bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(token) = self.token.as_deref()
            && token.len() > MAX_TOKEN_LENGTH
        {
            return Err(ConfigError::TokenTooLong);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Auth Context
// ============================================================================

/// Credentials and endpoint for the submission boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Bearer token, absent for anonymous submission.
    pub bearer_token: Option<String>,
    /// Submission backend base URL.
    pub submission_url: String,
}

// ============================================================================
// SECTION: Path Resolution
// ============================================================================

/// Resolves the default config path from the environment.
fn resolve_default_path() -> Result<PathBuf, ConfigError> {
    if let Ok(explicit) = env::var(CONFIG_ENV_VAR)
        && !explicit.is_empty()
    {
        return Ok(PathBuf::from(explicit));
    }
    let home = env::var("HOME").map_err(|_| ConfigError::HomeNotSet)?;
    if home.is_empty() {
        return Err(ConfigError::HomeNotSet);
    }
    Ok(PathBuf::from(home)
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

/// Enforces path length bounds.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_PATH_LENGTH {
        return Err(ConfigError::PathTooLong);
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::PathComponentTooLong);
        }
    }
    Ok(())
}

/// Restricts a filesystem entry to owner-only access on unix.
#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::Permissions::from_mode(mode);
    fs::set_permissions(path, permissions).map_err(|err| ConfigError::Io {
        path: path.to_path_buf(),
        source: err,
    })
}

/// No-op on non-unix targets.
#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) -> Result<(), ConfigError> {
    Ok(())
}
