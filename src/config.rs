//! # Hub Configuration
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults ([`HubConfig::default`])
//! 2. an optional YAML file (`--config hub.yaml`)
//! 3. environment variables
//! 4. command-line flags (applied by the CLI)
//!
//! ## Environment Variables
//!
//! | Variable              | Field          |
//! |-----------------------|----------------|
//! | `APPHUB_ADDR`         | `addr`         |
//! | `APPHUB_APPS_DIR`     | `apps_dir`     |
//! | `APPHUB_FRONTEND_DIR` | `frontend_dir` (empty disables it) |
//! | `DATABASE_URL`        | `database_url` |
//! | `APPHUB_STACK_SIZE`   | `stack_size`, decimal or `0x` hex |
//! | `APPHUB_CORS_ORIGIN`  | `cors_origin`  |
//!
//! ## Example file
//!
//! ```yaml
//! addr: 127.0.0.1:5000
//! apps_dir: /srv/hub/tiny_Apps
//! database_url: sqlite:/var/lib/apphub/hub.db
//! ```
//!
//! Coroutine stacks hold the SQLite call chain, so the default stack is
//! larger than a plain HTTP service would need.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_APPS_DIR: &str = "tiny_Apps";
pub const DEFAULT_FRONTEND_DIR: &str = "frontend";
pub const DEFAULT_STACK_SIZE: usize = 0x20000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubConfig {
    /// Listen address
    pub addr: String,
    /// Root folder scanned for apps
    pub apps_dir: PathBuf,
    /// The hub's own front-end, served at `/`
    pub frontend_dir: Option<PathBuf>,
    /// Record store URL; `None` runs without persistence
    pub database_url: Option<String>,
    /// Coroutine stack size in bytes
    pub stack_size: usize,
    /// Value of `Access-Control-Allow-Origin`
    pub cors_origin: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            apps_dir: PathBuf::from(DEFAULT_APPS_DIR),
            frontend_dir: Some(PathBuf::from(DEFAULT_FRONTEND_DIR)),
            database_url: None,
            stack_size: DEFAULT_STACK_SIZE,
            cors_origin: "*".to_string(),
        }
    }
}

impl HubConfig {
    /// Defaults, then `file` if given, then the process environment.
    ///
    /// # Errors
    ///
    /// The file cannot be read or parsed, or an environment value is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a YAML file; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// The file cannot be read, is not valid YAML, or has unknown keys.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// # Errors
    ///
    /// Not valid YAML for this struct.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Overlay environment variables read through `get`.
    ///
    /// # Errors
    ///
    /// `APPHUB_STACK_SIZE` is not a number.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(addr) = get("APPHUB_ADDR").filter(|s| !s.is_empty()) {
            self.addr = addr;
        }
        if let Some(dir) = get("APPHUB_APPS_DIR").filter(|s| !s.is_empty()) {
            self.apps_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("APPHUB_FRONTEND_DIR") {
            self.frontend_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
        }
        if let Some(url) = get("DATABASE_URL").filter(|s| !s.trim().is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(raw) = get("APPHUB_STACK_SIZE") {
            self.stack_size = parse_stack_size(&raw)
                .with_context(|| format!("Invalid APPHUB_STACK_SIZE '{raw}'"))?;
        }
        if let Some(origin) = get("APPHUB_CORS_ORIGIN").filter(|s| !s.is_empty()) {
            self.cors_origin = origin;
        }
        Ok(())
    }
}

/// Parse a byte count written in decimal or `0x` hexadecimal.
pub fn parse_stack_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
    .filter(|n| *n > 0)
}
