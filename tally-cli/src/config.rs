//! CLI configuration: extra transfer keywords and contribution entries,
//! stored in `tally.toml` next to the data directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use tally_core::Contribution;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Unioned with the built-in transfer-keyword set at classification
    /// time.
    #[serde(default)]
    pub transfer_keywords: Vec<String>,

    /// 401k/HSA/IRA entries feeding the savings-rate summary.
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

/// Load the config file, or defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
