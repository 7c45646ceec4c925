//! Built-in monospace face on the Spleen 12x24 bitmap font.
//!
//! Always available, so text renders even when no font file was supplied.
//! Every glyph advances exactly half the font size and a line is exactly the
//! font size tall, which keeps measurement fully predictable.

use spleen_font::{FONT_12X24, PSF2Font};

use super::FontFace;

const GLYPH_W: usize = 12;
const GLYPH_H: usize = 24;
/// Baseline row of the 12x24 cell.
const BASELINE_ROW: f32 = 19.0;

/// Family name the built-in face answers to.
pub const BUILTIN_FAMILY: &str = "builtin-mono";

#[derive(Debug, Default)]
pub struct BitmapFace;

impl BitmapFace {
    pub fn new() -> Self {
        Self
    }

    /// Advance of one glyph at `size`.
    pub fn cell_width(size: f32) -> f32 {
        size * GLYPH_W as f32 / GLYPH_H as f32
    }
}

/// 12x24 on/off bitmap for a character; unknown glyphs get a hollow box.
fn glyph_bitmap(ch: char) -> Vec<bool> {
    let mut glyph = vec![false; GLYPH_W * GLYPH_H];
    let mut utf8 = [0u8; 4];
    let encoded = ch.encode_utf8(&mut utf8);

    let found = match PSF2Font::new(FONT_12X24) {
        Ok(mut spleen) => match spleen.glyph_for_utf8(encoded.as_bytes()) {
            Some(spleen_glyph) => {
                for (row_y, row) in spleen_glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        let idx = row_y * GLYPH_W + col_x;
                        if col_x < GLYPH_W && idx < glyph.len() {
                            glyph[idx] = on;
                        }
                    }
                }
                true
            }
            None => false,
        },
        Err(_) => false,
    };

    if !found && !ch.is_whitespace() {
        draw_box(&mut glyph);
    }
    glyph
}

fn draw_box(glyph: &mut [bool]) {
    for x in 1..GLYPH_W - 1 {
        glyph[4 * GLYPH_W + x] = true;
        glyph[(GLYPH_H - 3) * GLYPH_W + x] = true;
    }
    for y in 4..GLYPH_H - 2 {
        glyph[y * GLYPH_W + 1] = true;
        glyph[y * GLYPH_W + GLYPH_W - 2] = true;
    }
}

impl FontFace for BitmapFace {
    fn family(&self) -> &str {
        BUILTIN_FAMILY
    }

    fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * Self::cell_width(size)
    }

    fn ascent(&self, size: f32) -> f32 {
        size * BASELINE_ROW / GLYPH_H as f32
    }

    fn line_height(&self, size: f32) -> f32 {
        size
    }

    fn rasterize(&self, text: &str, size: f32, x: f32, baseline: f32, plot: &mut dyn FnMut(i32, i32, f32)) {
        if size <= 0.0 {
            return;
        }
        let cell_w = Self::cell_width(size);
        let cell_h = size;
        let top = baseline - self.ascent(size);

        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let glyph = glyph_bitmap(ch);
            let left = x + i as f32 * cell_w;

            // Nearest-neighbor sample of the 12x24 cell at every covered pixel.
            let px_start = left.floor() as i32;
            let px_end = (left + cell_w).ceil() as i32;
            let py_start = top.floor() as i32;
            let py_end = (top + cell_h).ceil() as i32;
            for py in py_start..py_end {
                let v = (py as f32 + 0.5 - top) / cell_h;
                if !(0.0..1.0).contains(&v) {
                    continue;
                }
                let sy = (v * GLYPH_H as f32) as usize;
                for px in px_start..px_end {
                    let u = (px as f32 + 0.5 - left) / cell_w;
                    if !(0.0..1.0).contains(&u) {
                        continue;
                    }
                    let sx = (u * GLYPH_W as f32) as usize;
                    if glyph[sy * GLYPH_W + sx] {
                        plot(px, py, 1.0);
                    }
                }
            }
        }
    }
}
