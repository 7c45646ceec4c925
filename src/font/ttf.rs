//! TrueType/OpenType faces backed by ab_glyph.
//!
//! Glyphs are laid out along a single baseline with pair kerning and drawn
//! as anti-aliased coverage.

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont};
use std::fmt;

use super::FontFace;
use crate::error::LaurelError;

pub struct TtfFace {
    family: String,
    font: FontArc,
}

impl fmt::Debug for TtfFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtfFace").field("family", &self.family).finish()
    }
}

impl TtfFace {
    /// Parse a font file's bytes.
    pub fn from_bytes(family: impl Into<String>, bytes: Vec<u8>) -> Result<Self, LaurelError> {
        let family = family.into();
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| LaurelError::Font(format!("failed to parse font '{}': {}", family, e)))?;
        Ok(Self { family, font })
    }

    /// Glyph ids with their pen x offsets, plus the total advance.
    fn layout(&self, text: &str, size: f32) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(size);
        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret_x = 0.0f32;
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            let glyph_id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret_x += scaled.kern(prev, glyph_id);
            }
            glyphs.push((glyph_id, caret_x));
            caret_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        (glyphs, caret_x)
    }
}

impl FontFace for TtfFace {
    fn family(&self) -> &str {
        &self.family
    }

    fn measure(&self, text: &str, size: f32) -> f32 {
        self.layout(text, size).1
    }

    fn ascent(&self, size: f32) -> f32 {
        self.font.as_scaled(size).ascent()
    }

    fn line_height(&self, size: f32) -> f32 {
        let scaled = self.font.as_scaled(size);
        scaled.ascent() - scaled.descent() + scaled.line_gap()
    }

    fn rasterize(&self, text: &str, size: f32, x: f32, baseline: f32, plot: &mut dyn FnMut(i32, i32, f32)) {
        if size <= 0.0 {
            return;
        }
        let (glyphs, _) = self.layout(text, size);
        for (glyph_id, glyph_x) in glyphs {
            let glyph = glyph_id.with_scale_and_position(size, ab_glyph::point(x + glyph_x, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let gx = px as i32 + bounds.min.x as i32;
                    let gy = py as i32 + bounds.min.y as i32;
                    plot(gx, gy, coverage.min(1.0));
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bytes_rejected() {
        let err = TtfFace::from_bytes("Broken", vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, LaurelError::Font(_)));
        assert!(err.to_string().contains("Broken"));
    }
}
