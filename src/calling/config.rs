use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::calling::window::ScoringMethod;
use crate::evidence::adapter::NormalizationConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },
}

/// Preset file version for compatibility checking
pub const PRESETS_VERSION: &str = "1.0.0";

/// Settings for the gene-density prefilter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Width in nucleotides of one counting bin
    pub bin_width: u64,

    /// Bins averaged into each density value
    pub window_bins: usize,

    /// Density threshold is `mean - std * floor_factor`
    pub floor_factor: f64,

    /// A dense run must peak at `mean + std * ceiling_factor` or above
    pub ceiling_factor: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            bin_width: 1000,
            window_bins: 10,
            floor_factor: -0.5,
            ceiling_factor: 2.0,
        }
    }
}

/// Immutable settings for one scan, shared by reference across genomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Genes per scoring window
    pub window_size: usize,

    /// Minimum window score to take part in a region (inclusive)
    pub score_cutoff: f64,

    /// Genes allowed between accepted windows of one region
    pub merge_gap: usize,

    /// Nucleotides searched on each side of a candidate edge
    pub search_radius: u64,

    pub min_region_genes: usize,

    pub min_region_length: u64,

    /// Minimum mean window score of an accepted region
    pub min_score: f64,

    /// Shortest repeat accepted as an attachment site
    pub min_att_length: usize,

    pub max_att_mismatches: u32,

    /// Also look for inverted repeats
    pub search_inverted: bool,

    /// Contigs shorter than this are skipped
    pub min_contig_length: u64,

    pub scoring: ScoringMethod,

    pub normalization: NormalizationConfig,

    /// Gene-density prefilter; disabled when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<DensityConfig>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            score_cutoff: 0.5,
            merge_gap: 2,
            search_radius: 10_000,
            min_region_genes: 8,
            min_region_length: 5000,
            min_score: 0.5,
            min_att_length: 12,
            max_att_mismatches: 1,
            search_inverted: false,
            min_contig_length: 20_000,
            scoring: ScoringMethod::default(),
            normalization: NormalizationConfig::default(),
            density: None,
        }
    }
}

impl ScanConfig {
    /// Parse a (possibly partial) configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build a configuration from defaults, then an optional named preset,
    /// then an optional JSON file. Later layers override earlier ones field
    /// by field.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the preset is unknown, the file cannot be
    /// read or parsed, or the result fails [`ScanConfig::validate`].
    pub fn layered(preset: Option<&str>, file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut value = serde_json::to_value(Self::default())?;

        if let Some(name) = preset {
            let presets = PresetCatalog::load_embedded()?;
            let preset = presets.get(name).ok_or_else(|| ConfigError::UnknownPreset {
                name: name.to_string(),
                available: presets.names().join(", "),
            })?;
            merge_json(&mut value, &preset.config);
        }

        if let Some(path) = file {
            let content = std::fs::read_to_string(path)?;
            let overlay: serde_json::Value = serde_json::from_str(&content)?;
            merge_json(&mut value, &overlay);
        }

        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a meaningful scan.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.window_size == 0 {
            return Err(invalid("window_size", "must be at least 1"));
        }
        if !self.score_cutoff.is_finite() {
            return Err(invalid("score_cutoff", "must be finite"));
        }
        if !self.min_score.is_finite() {
            return Err(invalid("min_score", "must be finite"));
        }
        if self.search_radius == 0 {
            return Err(invalid("search_radius", "must be at least 1"));
        }
        if self.min_att_length < 4 {
            return Err(invalid("min_att_length", "must be at least 4"));
        }
        if self.min_att_length as u64 > self.search_radius {
            return Err(invalid(
                "min_att_length",
                format!("exceeds search_radius ({})", self.search_radius),
            ));
        }

        let n = &self.normalization;
        for (field, ceiling) in [
            ("normalization.phage_ceiling", n.phage_ceiling),
            ("normalization.bacterial_ceiling", n.bacterial_ceiling),
            ("normalization.profile_ceiling", n.profile_ceiling),
        ] {
            if !(ceiling.is_finite() && ceiling > 0.0) {
                return Err(invalid(field, "must be a positive number"));
            }
        }

        if let Some(density) = &self.density {
            if density.bin_width == 0 {
                return Err(invalid("density.bin_width", "must be at least 1"));
            }
            if density.window_bins == 0 {
                return Err(invalid("density.window_bins", "must be at least 1"));
            }
            if !(density.floor_factor.is_finite() && density.ceiling_factor.is_finite()) {
                return Err(invalid("density", "factors must be finite"));
            }
        }

        Ok(())
    }
}

/// Recursively overlay `overlay` onto `base`. Objects merge key by key;
/// any other value replaces what was there.
fn merge_json(base: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_json(existing, value);
                    }
                    _ => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// A named, partial configuration shipped with the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPreset {
    pub name: String,
    pub description: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetCatalog {
    pub version: String,
    pub presets: Vec<ScanPreset>,
}

impl PresetCatalog {
    /// Load the presets embedded at compile time
    pub fn load_embedded() -> Result<Self, ConfigError> {
        // Validated by build.rs
        const EMBEDDED_PRESETS: &str = include_str!("../../presets/scan_presets.json");
        Self::from_json(EMBEDDED_PRESETS)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let catalog: Self = serde_json::from_str(json)?;
        if catalog.version != PRESETS_VERSION {
            tracing::warn!(
                expected = PRESETS_VERSION,
                found = %catalog.version,
                "preset version mismatch"
            );
        }
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&ScanPreset> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }
}
