use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::sink::DEFAULT_MAX_BYTES;

/// Global configuration loaded from `~/.config/cget/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CgetConfig {
    /// Ceiling for the response body sink, in bytes.
    pub max_body_bytes: usize,
    /// Ceiling for the forwarded response header sink, in bytes.
    pub max_header_bytes: usize,
    /// Overall transfer timeout in seconds (None = no timeout).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// User-Agent sent with every request (None = libcurl sends none).
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for CgetConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BYTES,
            max_header_bytes: 64 * 1024,
            timeout_secs: None,
            user_agent: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cget")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CgetConfig> {
    load_or_init_at(&config_path()?)
}

/// Like `load_or_init` with an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<CgetConfig> {
    if !path.exists() {
        let default_cfg = CgetConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CgetConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
