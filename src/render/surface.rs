//! Raster drawing surface.
//!
//! A small 2D context over an RGBA pixmap: a save/restore stack carrying a
//! uniform scale, rectangle fills and strokes, clipped image blits and text
//! drawn through a [`FontFace`]. Coordinates passed in are logical units;
//! the current scale maps them to device pixels.

use image::{Rgba, RgbaImage, imageops};

use crate::document::Color;
use crate::font::FontFace;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SurfaceState {
    scale: f32,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

/// Axis-aligned rectangle in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Device-pixel span `[x0, x1) × [y0, y1)`, already clamped to the pixmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelSpan {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelSpan {
    fn intersect(self, other: PixelSpan) -> PixelSpan {
        PixelSpan {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DrawContext {
    pixmap: RgbaImage,
    state: SurfaceState,
    stack: Vec<SurfaceState>,
}

impl DrawContext {
    /// Transparent surface of `width`×`height` device pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: RgbaImage::new(width.max(1), height.max(1)),
            state: SurfaceState::default(),
            stack: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &RgbaImage {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> RgbaImage {
        self.pixmap
    }

    /// Reallocate the pixmap when the device size changed, discarding its
    /// contents. Same-size calls keep the pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.pixmap.dimensions() != (width, height) {
            self.pixmap = RgbaImage::new(width, height);
        }
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    /// Pop the last saved state. Unbalanced restores are ignored.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    /// Multiply the current scale.
    pub fn scale(&mut self, factor: f32) {
        self.state.scale *= factor;
    }

    pub fn current_scale(&self) -> f32 {
        self.state.scale
    }

    /// Reset every pixel to transparent, ignoring the current scale.
    pub fn clear(&mut self) {
        for pixel in self.pixmap.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let span = self.device_span(rect);
        for y in span.y0..span.y1 {
            for x in span.x0..span.x1 {
                blend(self.pixmap.get_pixel_mut(x, y), color, 1.0);
            }
        }
    }

    /// Outline `rect` with a border `line_width` logical units wide, drawn
    /// inside the rectangle.
    pub fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        let w = line_width.max(0.0).min(rect.width / 2.0).min(rect.height / 2.0);
        if w <= 0.0 {
            return;
        }
        let Rect { x, y, width, height } = rect;
        self.fill_rect(Rect::new(x, y, width, w), color);
        self.fill_rect(Rect::new(x, y + height - w, width, w), color);
        self.fill_rect(Rect::new(x, y + w, w, height - 2.0 * w), color);
        self.fill_rect(Rect::new(x + width - w, y + w, w, height - 2.0 * w), color);
    }

    /// Draw `image` stretched to `dest`, keeping only pixels inside `clip`.
    pub fn draw_image(&mut self, image: &RgbaImage, dest: Rect, clip: Option<Rect>) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let s = self.state.scale;
        let left = (dest.x * s).round();
        let top = (dest.y * s).round();
        let target_w = ((dest.x + dest.width) * s).round() - left;
        let target_h = ((dest.y + dest.height) * s).round() - top;
        if target_w < 1.0 || target_h < 1.0 {
            return;
        }

        let mut visible = self.device_span(dest);
        if let Some(clip) = clip {
            visible = visible.intersect(self.device_span(clip));
        }
        if visible.x0 >= visible.x1 || visible.y0 >= visible.y1 {
            return;
        }

        let (target_w, target_h) = (target_w as u32, target_h as u32);
        let scaled;
        let source = if image.dimensions() == (target_w, target_h) {
            image
        } else {
            scaled = imageops::resize(image, target_w, target_h, imageops::FilterType::Triangle);
            &scaled
        };

        for y in visible.y0..visible.y1 {
            let sy = (y as f32 - top) as u32;
            for x in visible.x0..visible.x1 {
                let sx = (x as f32 - left) as u32;
                if sx >= source.width() || sy >= source.height() {
                    continue;
                }
                let src = source.get_pixel(sx, sy).0;
                blend(self.pixmap.get_pixel_mut(x, y), Color(src), 1.0);
            }
        }
    }

    /// Draw one line of text with its baseline at logical `baseline`.
    pub fn fill_text(&mut self, face: &dyn FontFace, text: &str, size: f32, x: f32, baseline: f32, color: Color) {
        let s = self.state.scale;
        let (width, height) = (self.pixmap.width() as i32, self.pixmap.height() as i32);
        let pixmap = &mut self.pixmap;
        face.rasterize(text, size * s, x * s, baseline * s, &mut |px, py, coverage| {
            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }
            blend(pixmap.get_pixel_mut(px as u32, py as u32), color, coverage);
        });
    }

    /// Device pixels covered by a logical rectangle, clamped to the pixmap.
    fn device_span(&self, rect: Rect) -> PixelSpan {
        let s = self.state.scale;
        let clamp_x = |v: f32| v.round().clamp(0.0, self.pixmap.width() as f32) as u32;
        let clamp_y = |v: f32| v.round().clamp(0.0, self.pixmap.height() as f32) as u32;
        let (x0, x1) = (rect.x * s, (rect.x + rect.width.max(0.0)) * s);
        let (y0, y1) = (rect.y * s, (rect.y + rect.height.max(0.0)) * s);
        PixelSpan {
            x0: clamp_x(x0),
            y0: clamp_y(y0),
            x1: clamp_x(x1),
            y1: clamp_y(y1),
        }
    }
}

/// Source-over compositing of a straight-alpha color.
fn blend(dst: &mut Rgba<u8>, src: Color, coverage: f32) {
    let sa = src.alpha() as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let sc = src.0[c] as f32;
        let dc = dst.0[c] as f32;
        dst.0[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BitmapFace;

    fn opaque(ctx: &DrawContext) -> usize {
        ctx.pixmap().pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn test_fill_rect_respects_scale() {
        let mut ctx = DrawContext::new(40, 40);
        ctx.scale(2.0);
        ctx.fill_rect(Rect::new(5.0, 5.0, 10.0, 10.0), Color::BLACK);
        assert_eq!(opaque(&ctx), 20 * 20);
        assert_eq!(ctx.pixmap().get_pixel(10, 10).0, [0, 0, 0, 255]);
        assert_eq!(ctx.pixmap().get_pixel(9, 9).0[3], 0);
    }

    #[test]
    fn test_save_restore_scale() {
        let mut ctx = DrawContext::new(10, 10);
        ctx.save();
        ctx.scale(3.0);
        ctx.scale(2.0);
        assert_eq!(ctx.current_scale(), 6.0);
        ctx.restore();
        assert_eq!(ctx.current_scale(), 1.0);
        ctx.restore();
        assert_eq!(ctx.current_scale(), 1.0);
    }

    #[test]
    fn test_fill_rect_clamps_to_pixmap() {
        let mut ctx = DrawContext::new(10, 10);
        ctx.fill_rect(Rect::new(-5.0, -5.0, 100.0, 100.0), Color::WHITE);
        assert_eq!(opaque(&ctx), 100);
    }

    #[test]
    fn test_stroke_rect_leaves_interior() {
        let mut ctx = DrawContext::new(20, 20);
        ctx.stroke_rect(Rect::new(0.0, 0.0, 20.0, 20.0), Color::DEBUG_RED, 1.0);
        assert_eq!(opaque(&ctx), 20 * 4 - 4);
        assert_eq!(ctx.pixmap().get_pixel(10, 10).0[3], 0);
    }

    #[test]
    fn test_blend_half_alpha_over_white() {
        let mut pixel = Rgba([255, 255, 255, 255]);
        blend(&mut pixel, Color([0, 0, 0, 128]), 1.0);
        assert_eq!(pixel.0[3], 255);
        assert!((126..=128).contains(&pixel.0[0]), "{:?}", pixel);
    }

    #[test]
    fn test_draw_image_is_clipped() {
        let mut ctx = DrawContext::new(30, 30);
        let image = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        ctx.draw_image(&image, Rect::new(0.0, 0.0, 30.0, 30.0), Some(Rect::new(10.0, 10.0, 10.0, 10.0)));
        assert_eq!(opaque(&ctx), 100);
        assert_eq!(ctx.pixmap().get_pixel(15, 15).0[2], 255);
    }

    #[test]
    fn test_fill_text_draws_inside_bounds() {
        let face = BitmapFace::new();
        let mut ctx = DrawContext::new(100, 40);
        ctx.fill_text(&face, "Hi", 24.0, 0.0, 19.0, Color::BLACK);
        assert!(opaque(&ctx) > 0);
        let beyond = ctx.pixmap().enumerate_pixels().filter(|(x, _, p)| *x >= 24 && p.0[3] > 0).count();
        assert_eq!(beyond, 0);
    }

    #[test]
    fn test_resize_discards_contents() {
        let mut ctx = DrawContext::new(10, 10);
        ctx.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK);
        ctx.resize(10, 10);
        assert_eq!(opaque(&ctx), 100);
        ctx.resize(20, 5);
        assert_eq!((ctx.width(), ctx.height()), (20, 5));
        assert_eq!(opaque(&ctx), 0);
    }
}
