//! Tunables for tracking, interaction, drawing and the vision scanner.
//!
//! Every section falls back to its defaults, so a config file only needs the
//! keys it changes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub drawing: DrawingConfig,
    #[serde(default)]
    pub vision: VisionConfig,
}

/// Cursor filter and pinch debouncing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// EMA weight of each new sample; lower is smoother but laggier
    pub smoothing_alpha: f32,
    /// Tip distance below which an open hand becomes pinched
    pub pinch_start: f32,
    /// Tip distance above which a pinched hand opens again
    pub pinch_end: f32,
    /// Fraction of the camera range dropped on each edge before remapping
    pub active_margin: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.22,
            pinch_start: 0.038,
            pinch_end: 0.058,
            // center 56% of the camera drives the whole screen
            active_margin: 0.22,
        }
    }
}

/// Hit-testing of pinch buttons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pixels added around every target rectangle
    pub hit_padding: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self { hit_padding: 15.0 }
    }
}

/// Drawing session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    pub stroke_width: u32,
    pub min_stroke_width: u32,
    pub max_stroke_width: u32,
    /// Increment used by the +/- toolbar buttons
    pub stroke_step: u32,
    /// 0xRRGGBB colors offered by the toolbar; the first is the initial color
    pub palette: Vec<u32>,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            stroke_width: 10,
            min_stroke_width: 2,
            max_stroke_width: 40,
            stroke_step: 4,
            palette: vec![0x3b82f6, 0xef4444, 0x10b981, 0xf59e0b, 0xffffff],
        }
    }
}

/// Periodic scene captioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub scan_interval_secs: u64,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub endpoint: String,
    pub instruction: String,
    pub jpeg_quality: u8,
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 5,
            model: "gemini-3-flash-preview".to_string(),
            api_key_env: "API_KEY".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            instruction: "Describe the primary objects in the scene concisely. \
                          Provide a 1-sentence summary of what you see."
                .to_string(),
            jpeg_quality: 60,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let t = &self.tracking;
        if !(t.smoothing_alpha > 0.0 && t.smoothing_alpha <= 1.0) {
            return Err(Error::Config(format!(
                "smoothing_alpha must be in (0, 1], got {}",
                t.smoothing_alpha
            )));
        }
        if !(t.pinch_start > 0.0 && t.pinch_start < t.pinch_end) {
            return Err(Error::Config(format!(
                "pinch thresholds need 0 < pinch_start < pinch_end, got {} / {}",
                t.pinch_start, t.pinch_end
            )));
        }
        if !(0.0..0.5).contains(&t.active_margin) {
            return Err(Error::Config(format!(
                "active_margin must be in [0, 0.5), got {}",
                t.active_margin
            )));
        }
        if !(self.interaction.hit_padding >= 0.0) {
            return Err(Error::Config(format!(
                "hit_padding must be >= 0, got {}",
                self.interaction.hit_padding
            )));
        }
        let d = &self.drawing;
        if d.min_stroke_width == 0 || d.min_stroke_width > d.max_stroke_width {
            return Err(Error::Config(format!(
                "stroke width bounds must satisfy 0 < min <= max, got {}..={}",
                d.min_stroke_width, d.max_stroke_width
            )));
        }
        if !(d.min_stroke_width..=d.max_stroke_width).contains(&d.stroke_width) {
            return Err(Error::Config(format!(
                "stroke_width {} outside {}..={}",
                d.stroke_width, d.min_stroke_width, d.max_stroke_width
            )));
        }
        if d.palette.is_empty() {
            return Err(Error::Config("palette must not be empty".to_string()));
        }
        if self.vision.scan_interval_secs == 0 {
            return Err(Error::Config("scan_interval_secs must be > 0".to_string()));
        }
        if self.vision.model.trim().is_empty() {
            return Err(Error::Config("vision model must not be empty".to_string()));
        }
        if !(1..=100).contains(&self.vision.jpeg_quality) {
            return Err(Error::Config(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.vision.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
