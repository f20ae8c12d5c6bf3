use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::autosave::DEFAULT_DEBOUNCE;
use crate::strategy::{RollStrategy, MAX_REROLLS};
use crate::Dice;

const DEFAULT_ENDPOINT: &str = "/api/encounters";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TrackerConfig {
    pub dice: DiceConfig,
    pub autosave: AutoSaveConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DiceConfig {
    /// Fixed seed for reproducible rolls; entropy when absent.
    pub seed: Option<u64>,
    pub max_rerolls: u32,
    pub default_strategy: RollStrategy,
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self { seed: None, max_rerolls: MAX_REROLLS, default_strategy: RollStrategy::Random }
    }
}

impl DiceConfig {
    /// The seed to roll with: `flag` if given, else the configured seed, else entropy.
    pub fn seed_or(&self, flag: Option<u64>) -> u64 {
        flag.or(self.seed).unwrap_or_else(rand::random)
    }

    pub fn dice(&self, flag: Option<u64>) -> Dice {
        Dice::from_optional_seed(flag.or(self.seed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AutoSaveConfig {
    pub debounce_ms: u64,
    pub endpoint: String,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self { debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64, endpoint: DEFAULT_ENDPOINT.to_string() }
    }
}

impl AutoSaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Where an encounter with `id` is PUT.
    pub fn url_for(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), id)
    }
}

impl TrackerConfig {
    /// Load from JSON, or YAML when the extension is `.yaml`/`.yml`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Self::from_text(&text, is_yaml(path))
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    pub fn from_text(text: &str, yaml: bool) -> Result<Self> {
        let cfg = if yaml { serde_yaml::from_str(text)? } else { serde_json::from_str(text)? };
        Ok(cfg)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}
