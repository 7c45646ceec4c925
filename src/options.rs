//! Renderer configuration.
//!
//! Defaults cover preview use. A JSON file passed with `--config` can override
//! any subset of fields; CLI flags override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::document::Color;
use crate::error::LaurelError;
use crate::font::BUILTIN_FAMILY;
use crate::layout::DEFAULT_MIN_FONT_SIZE;

/// 8000×8000, about 256 MB of RGBA.
pub const DEFAULT_MAX_RENDER_PIXELS: u64 = 64_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Family used when an element's own family is not loaded.
    pub default_font_family: String,
    /// Directory of `.ttf`/`.otf` files registered at startup.
    pub fonts_dir: Option<PathBuf>,
    /// Resize-down never goes below this size.
    pub min_font_size: f32,
    /// Exports rendered above this scale are downsampled.
    pub downsample_threshold: f32,
    /// Maximum scale (relative to the logical canvas) of a downsampled export.
    pub export_scale_cap: f32,
    /// Prefix of the URL encoded into verification QR codes.
    pub verification_base_url: String,
    pub debug_border_color: Color,
    /// Debug border width in logical units.
    pub debug_border_width: f32,
    /// Largest surface (width × height in device pixels) a draw may allocate.
    pub max_render_pixels: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            default_font_family: BUILTIN_FAMILY.to_string(),
            fonts_dir: None,
            min_font_size: DEFAULT_MIN_FONT_SIZE,
            downsample_threshold: 2.0,
            export_scale_cap: 2.0,
            verification_base_url: "https://certificates.example.com/verify".to_string(),
            debug_border_color: Color::DEBUG_RED,
            debug_border_width: 1.0,
            max_render_pixels: DEFAULT_MAX_RENDER_PIXELS,
        }
    }
}

impl RenderOptions {
    /// Load options from a JSON file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, LaurelError> {
        let contents = std::fs::read_to_string(path)?;
        let options: RenderOptions = serde_json::from_str(&contents)?;
        Ok(options)
    }
}
