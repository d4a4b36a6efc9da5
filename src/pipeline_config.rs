//! Pipeline configuration.
//!
//! Every tunable constant of the recovery pipeline lives here: catalog matching
//! thresholds, the raw-text preview bound used in failure diagnostics, the
//! fallback used to infer workouts per week, and the caller-side retry budget.
//! Defaults reproduce the behavior of the production pipeline exactly.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid pipeline configuration: {0}")]
    Invalid(String),

    #[error("Malformed pipeline configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tunable parameters for the whole recovery pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Best catalog score below this yields no match.
    pub match_threshold: f64,
    /// Score floor for names in a substring-containment relationship.
    pub containment_boost: f64,
    /// Matches at or above this are accepted without review.
    pub auto_accept_confidence: f64,
    /// Maximum characters of raw model text kept in failure diagnostics.
    pub preview_chars: usize,
    /// Program length assumed when a plan omits `mesocycle_info.total_weeks`.
    pub default_total_weeks: u32,
    /// Enables the backward-scanning truncation strategy after the four
    /// standard extraction strategies have failed.
    pub truncation_recovery: bool,
    /// Attempts made by `ProgramGenerator` before giving up.
    pub max_generation_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.5,
            containment_boost: 0.85,
            auto_accept_confidence: 0.9,
            preview_chars: 500,
            default_total_weeks: 4,
            truncation_recovery: false,
            max_generation_attempts: 1,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl PipelineConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&raw)?;
        tracing::info!(path = %path.display(), "Pipeline configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("match_threshold", self.match_threshold),
            ("containment_boost", self.containment_boost),
            ("auto_accept_confidence", self.auto_accept_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.preview_chars == 0 {
            return Err(ConfigError::Invalid("preview_chars must be at least 1".into()));
        }
        if self.default_total_weeks == 0 {
            return Err(ConfigError::Invalid(
                "default_total_weeks must be at least 1".into(),
            ));
        }
        if self.max_generation_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_generation_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
