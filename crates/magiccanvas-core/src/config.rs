//! Editor configuration.
//!
//! Every field has a default so a partial JSON file only overrides what it names.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Io { path: String, message: String },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Stroke width presets for the S/M/L/XL size picker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizePresets {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
    pub extra_large: f64,
}

impl Default for SizePresets {
    fn default() -> Self {
        Self {
            small: 1.0,
            medium: 2.0,
            large: 4.0,
            extra_large: 8.0,
        }
    }
}

/// Tunables for the editor core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Stroke width presets.
    pub sizes: SizePresets,
    /// Eraser brush width relative to the selected stroke size.
    pub eraser_width_factor: f64,
    /// Delay between finishing a shape and returning to the select tool.
    pub shape_finalize_delay_ms: u64,
    /// Font size of inserted text relative to the stroke size.
    pub text_font_scale: f64,
    /// Initial content of inserted text.
    pub text_placeholder: String,
    /// Offset of inserted text from the viewport center, towards the top-left.
    pub text_center_offset: f64,
    /// Display width of inserted images.
    pub image_default_width: f64,
    /// Where new graph nodes are placed.
    pub node_default_position: Point,
    /// Hit-test tolerance in world units.
    pub hit_tolerance: f64,
    /// Viewport used until the host reports its container size.
    pub initial_viewport: Size,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            sizes: SizePresets::default(),
            eraser_width_factor: 2.0,
            shape_finalize_delay_ms: 100,
            text_font_scale: 5.0,
            text_placeholder: "Type here".to_string(),
            text_center_offset: 50.0,
            image_default_width: 200.0,
            node_default_position: Point::new(250.0, 250.0),
            hit_tolerance: 5.0,
            initial_viewport: Size::new(800.0, 600.0),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn shape_finalize_delay(&self) -> Duration {
        Duration::from_millis(self.shape_finalize_delay_ms)
    }
}
