//! Configuration loading
//!
//! Values are resolved in order, later sources winning:
//! built-in defaults, the TOML config file, environment variables, then
//! command-line overrides.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Server used when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/";

/// Environment variable overriding the server URL
pub const URL_ENV: &str = "BXT_URL";

/// Environment variable overriding the state directory
pub const STATE_DIR_ENV: &str = "BXT_STATE_DIR";

const APP_DIR: &str = "bxt-stage";
const CONFIG_FILE: &str = "config.toml";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    server_url: Option<String>,
    state_dir: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Explicit config file; must exist when set
    pub config_path: Option<PathBuf>,
    /// Server URL from `--url`
    pub server_url: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the bxt server
    pub server_url: Url,
    /// Directory holding the staging area and session
    pub state_dir: PathBuf,
    /// Timeout for metadata requests, in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from the file, the process environment and `overrides`
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::load_with(overrides, |key| env::var(key).ok())
    }

    /// Load configuration reading environment variables through `env`
    pub fn load_with(overrides: &Overrides, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = match &overrides.config_path {
            Some(path) => Self::read_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                _ => FileConfig::default(),
            },
        };

        let server_url = overrides
            .server_url
            .clone()
            .or_else(|| env(URL_ENV))
            .or(file.server_url)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let state_dir = env(STATE_DIR_ENV)
            .map(PathBuf::from)
            .or(file.state_dir)
            .map(|p| expand_tilde(&p))
            .unwrap_or_else(default_state_dir);

        Ok(Self {
            server_url: parse_server_url(&server_url)?,
            state_dir,
            timeout_secs: file
                .timeout_secs
                .unwrap_or(crate::backend::DEFAULT_TIMEOUT_SECS),
        })
    }

    /// `$XDG_CONFIG_HOME/bxt-stage/config.toml` (or the platform equivalent)
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Request timeout
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Ok(toml::from_str(&content)?)
    }
}

/// Parse a server URL, treating it as a directory so API paths resolve under it
fn parse_server_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("not a base URL: {raw}")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Expand a leading `~` to the home directory
fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}
