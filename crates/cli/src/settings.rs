use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use facetally_core::aggregation::aggregate::GenderTiePolicy;
use facetally_core::shared::constants::DEFAULT_CONFIDENCE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// Hue/saturation histogram correlation; no model download.
    Histogram,
    /// ArcFace embeddings compared by cosine similarity.
    Embedding,
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverKind::Histogram => write!(f, "histogram"),
            ResolverKind::Embedding => write!(f, "embedding"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GenderTie {
    PreferWoman,
    PreferMan,
}

impl From<GenderTie> for GenderTiePolicy {
    fn from(tie: GenderTie) -> Self {
        match tie {
            GenderTie::PreferWoman => GenderTiePolicy::PreferWoman,
            GenderTie::PreferMan => GenderTiePolicy::PreferMan,
        }
    }
}

/// Defaults for a run, read from a JSON file. Missing keys take their
/// default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub confidence: f64,
    pub resolver: ResolverKind,
    /// Match threshold; `None` uses the resolver's own default.
    pub similarity: Option<f64>,
    pub gender_tie: GenderTie,
    pub font: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            resolver: ResolverKind::Histogram,
            similarity: None,
            gender_tie: GenderTie::PreferWoman,
            font: None,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceTally").join("settings.json"))
    }

    /// Loads `explicit` when given (it must exist), otherwise the default
    /// location if a file is there, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read settings {}: {e}", path.display()))?;
        let settings = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid settings {}: {e}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )
            .into());
        }
        if let Some(s) = self.similarity {
            if !(-1.0..=1.0).contains(&s) {
                return Err(format!("Similarity must be between -1.0 and 1.0, got {s}").into());
            }
        }
        if let Some(font) = &self.font {
            if !font.is_file() {
                return Err(format!("Font file not found: {}", font.display()).into());
            }
        }
        Ok(())
    }
}
