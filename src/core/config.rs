//! Configuration model: thresholds, label vocabulary, port backends, journal.
//!
//! Every section is `#[serde(default)]`, so a partial TOML file merges over
//! the built-in defaults. Loaded once at process start and never mutated
//! afterwards.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{BevError, Result};
use super::taxonomy::LabelTaxonomy;

/// Environment variable naming the config file when no explicit path is given.
pub const CONFIG_ENV: &str = "BEVID_CONFIG";
pub const HIGH_THRESHOLD_ENV: &str = "BEVID_HIGH_THRESHOLD";
pub const MEDIUM_THRESHOLD_ENV: &str = "BEVID_MEDIUM_THRESHOLD";
pub const TOP_N_ENV: &str = "BEVID_TOP_N";

const DEFAULT_ALCOHOL_LABELS: [&str; 12] = [
    "a bottle of whisky",
    "a glass of red wine",
    "a bottle of white wine",
    "a bottle of beer",
    "a can of beer",
    "a glass of sake",
    "a bottle of vodka",
    "a bottle of rum",
    "a glass of champagne",
    "a bottle of gin",
    "a glass of cocktail",
    "a bottle of tequila",
];

const DEFAULT_NON_ALCOHOL_LABELS: [&str; 2] =
    ["a non-alcoholic beverage", "a soft drink, juice, or water"];

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub thresholds: ThresholdConfig,
    pub labels: LabelConfig,
    pub model: ModelConfig,
    pub enrichment: EnrichmentConfig,
    pub journal: JournalConfig,
}

/// Tier boundaries and candidate list length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Scores at or above this are `high`.
    pub high: f64,
    /// Scores at or above this (and below `high`) are `medium`.
    pub medium: f64,
    /// Number of ranked candidates surfaced for review.
    pub top_n: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high: 0.85,
            medium: 0.60,
            top_n: 3,
        }
    }
}

/// Candidate vocabulary and its alcohol / non-alcohol partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub candidates: Vec<String>,
    pub alcohol: Vec<String>,
    pub non_alcohol: Vec<String>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        let alcohol: Vec<String> = DEFAULT_ALCOHOL_LABELS
            .iter()
            .map(ToString::to_string)
            .collect();
        let non_alcohol: Vec<String> = DEFAULT_NON_ALCOHOL_LABELS
            .iter()
            .map(ToString::to_string)
            .collect();
        let candidates = alcohol.iter().chain(non_alcohol.iter()).cloned().collect();
        Self {
            candidates,
            alcohol,
            non_alcohol,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierBackend {
    /// Canned scores looked up by image digest.
    #[default]
    Fixture,
    /// External program fed the image bytes on stdin.
    Command,
}

/// Classifier port wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: ClassifierBackend,
    /// Model identifier passed to command backends.
    pub model_id: String,
    pub fixture_path: Option<PathBuf>,
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Upper bound for one classify call; `None` waits indefinitely.
    pub classify_timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Fixture,
            model_id: "openai/clip-vit-large-patch14".to_string(),
            fixture_path: None,
            command: None,
            args: Vec::new(),
            classify_timeout_secs: Some(60),
        }
    }
}

impl ModelConfig {
    #[must_use]
    pub fn classify_timeout(&self) -> Option<Duration> {
        self.classify_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentBackend {
    /// Static text describing what a connected generator would provide.
    #[default]
    Placeholder,
    /// External program fed the enrichment prompt on stdin.
    Command,
}

/// Enrichment port wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub backend: EnrichmentBackend,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout_secs: Option<u64>,
    /// Generator model name forwarded to command backends.
    pub model: String,
    pub max_tokens: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            backend: EnrichmentBackend::Placeholder,
            command: None,
            args: Vec::new(),
            timeout_secs: Some(30),
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 512,
        }
    }
}

impl EnrichmentConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Append-only decision journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("bevid-journal.jsonl"),
        }
    }
}

impl Config {
    /// Resolve, parse, override, and validate the configuration.
    ///
    /// Resolution order: explicit `path`, then `BEVID_CONFIG`, then the
    /// built-in defaults. A path that was named but does not exist is an
    /// error rather than a silent fallback.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match resolved {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without applying overrides or validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BevError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| BevError::io(path, source))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply threshold overrides from the environment. `lookup` is injected so
    /// tests do not have to mutate the process environment.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(HIGH_THRESHOLD_ENV) {
            self.thresholds.high = parse_env(HIGH_THRESHOLD_ENV, &raw)?;
        }
        if let Some(raw) = lookup(MEDIUM_THRESHOLD_ENV) {
            self.thresholds.medium = parse_env(MEDIUM_THRESHOLD_ENV, &raw)?;
        }
        if let Some(raw) = lookup(TOP_N_ENV) {
            self.thresholds.top_n = parse_env(TOP_N_ENV, &raw)?;
        }
        Ok(())
    }

    /// Check every cross-field invariant.
    pub fn validate(&self) -> Result<()> {
        let ThresholdConfig { high, medium, top_n } = self.thresholds;
        if !(0.0..=1.0).contains(&high) || !(0.0..=1.0).contains(&medium) {
            return Err(BevError::InvalidConfig {
                details: format!("thresholds must lie in [0, 1] (high={high}, medium={medium})"),
            });
        }
        if medium > high {
            return Err(BevError::InvalidConfig {
                details: format!("thresholds.medium ({medium}) exceeds thresholds.high ({high})"),
            });
        }
        if top_n == 0 {
            return Err(BevError::InvalidConfig {
                details: "thresholds.top_n must be at least 1".to_string(),
            });
        }

        LabelTaxonomy::from_config(&self.labels)?;

        if self.model.backend == ClassifierBackend::Command && self.model.command.is_none() {
            return Err(BevError::InvalidConfig {
                details: "model.backend = \"command\" requires model.command".to_string(),
            });
        }
        if self.enrichment.backend == EnrichmentBackend::Command
            && self.enrichment.command.is_none()
        {
            return Err(BevError::InvalidConfig {
                details: "enrichment.backend = \"command\" requires enrichment.command"
                    .to_string(),
            });
        }
        if self.model.classify_timeout_secs == Some(0) || self.enrichment.timeout_secs == Some(0) {
            return Err(BevError::InvalidConfig {
                details: "port timeouts must be positive; omit the key to disable".to_string(),
            });
        }
        Ok(())
    }

    /// Render as TOML for `config show`.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| BevError::Serialization {
            context: "toml",
            details: err.to_string(),
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| BevError::ConfigParse {
        context: key,
        details: format!("{raw:?}: {err}"),
    })
}
