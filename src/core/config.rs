//! Configuration management for Specgate.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Quality analysis settings
    pub analysis: AnalysisConfig,

    /// Iteration tracker thresholds
    pub tracker: TrackerConfig,

    /// Per-phase gate overrides
    pub gates: GatesConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Workspace root holding one directory per project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Quality analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Documents longer than this are scored by the fallback scorer
    pub max_document_chars: usize,

    /// Multiplier applied to scores of synthesized documents (0.0 - 1.0)
    pub synthetic_confidence: f64,
}

/// Thresholds used to classify an iteration as meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Jaccard similarity above which a removed/added pair is a modification
    pub modification_similarity: f64,

    /// Fraction of a suggestion's key terms that must appear for it to count as implemented
    pub incorporation_threshold: f64,

    /// Absolute score gain that counts as significant
    pub significant_points: f64,

    /// Relative score gain (percent) that counts as significant
    pub significant_percentage: f64,

    /// Added words that make an iteration meaningful on their own
    pub substantial_added_words: usize,

    /// Net word growth that, with any score gain, makes an iteration meaningful
    pub net_growth_words: i64,

    /// Incorporation rate (percent) that makes an iteration meaningful
    pub meaningful_incorporation_rate: f64,
}

/// Gate overrides, one table per phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatesConfig {
    pub spec: GateOverride,
    pub plan: GateOverride,
    pub tasks: GateOverride,
    pub implement: GateOverride,
}

/// Optional replacement values for a built-in gate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_quality: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_iterations: Option<usize>,
}

impl GatesConfig {
    /// Override table for a phase.
    pub fn for_phase(&self, phase: Phase) -> &GateOverride {
        match phase {
            Phase::Spec => &self.spec,
            Phase::Plan => &self.plan,
            Phase::Tasks => &self.tasks,
            Phase::Implement => &self.implement,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.specgate.toml` in current directory
    /// 2. `~/.config/specgate/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".specgate.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = Self::config_dir() {
            let global_config = config_dir.join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make scoring meaningless.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.analysis.synthetic_confidence) {
            anyhow::bail!(
                "analysis.synthetic_confidence must be between 0.0 and 1.0 (got {})",
                self.analysis.synthetic_confidence
            );
        }
        if !(0.0..=1.0).contains(&self.tracker.modification_similarity) {
            anyhow::bail!("tracker.modification_similarity must be between 0.0 and 1.0");
        }
        if !(0.0..=1.0).contains(&self.tracker.incorporation_threshold) {
            anyhow::bail!("tracker.incorporation_threshold must be between 0.0 and 1.0");
        }
        if !(0.0..=100.0).contains(&self.tracker.meaningful_incorporation_rate) {
            anyhow::bail!(
                "tracker.meaningful_incorporation_rate must be between 0 and 100 (got {})",
                self.tracker.meaningful_incorporation_rate
            );
        }
        for phase in Phase::ALL {
            if let Some(quality) = self.gates.for_phase(phase).required_quality {
                if quality > 100 {
                    anyhow::bail!("gates.{phase}.required_quality must be at most 100");
                }
            }
        }
        Ok(())
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        std::fs::create_dir_all(&config_dir)?;

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_dir.join("config.toml"), content)?;

        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("specgate"))
    }

    /// Workspace root, falling back to the current directory.
    pub fn root(&self) -> PathBuf {
        self.general.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { max_document_chars: 1_000_000, synthetic_confidence: 0.8 }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            modification_similarity: 0.3,
            incorporation_threshold: 0.6,
            significant_points: 10.0,
            significant_percentage: 15.0,
            substantial_added_words: 50,
            net_growth_words: 20,
            meaningful_incorporation_rate: 60.0,
        }
    }
}
