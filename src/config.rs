// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::frequency::DEFAULT_VSG_GHZ;
use crate::serial_link::DEFAULT_BAUD_RATE;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Pattern loaded at startup; the built-in pattern is used if it is missing.
    pub pattern_path: PathBuf,
    pub baud_rate: u32,
    /// Sweep/spectrum refresh period.
    pub tick_ms: u64,
    pub initial_frequency_ghz: f64,
    pub last_port: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            pattern_path: PathBuf::from("Molex.csv"),
            baud_rate: DEFAULT_BAUD_RATE,
            tick_ms: 100,
            initial_frequency_ghz: DEFAULT_VSG_GHZ,
            last_port: None,
        }
    }
}

impl DashboardConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from("data/dashboard.json")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg)
    }

    /// Missing file means defaults; a broken file is logged and ignored.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("{e:#}; using default configuration");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}
