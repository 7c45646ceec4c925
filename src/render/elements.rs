//! Per-kind element renderers.
//!
//! Each renderer draws one element into the surface in logical units; the
//! surface's scale takes care of device pixels. The dispatch in
//! [`render_element`] matches every element kind explicitly.

use log::{debug, warn};
use qrcode::{EcLevel, QrCode};

use super::geometry::{RenderBox, image_fit, render_box};
use super::surface::{DrawContext, Rect};
use crate::assets::ImageCache;
use crate::document::resolve::{
    country_content, date_content, gender_content, number_content, qr_payload, text_content,
};
use crate::document::{
    CertificateElement, ElementBase, HorizontalAlign, ImageElement, QrCodeElement, QrErrorCorrection,
    RenderData, TemplateConfig, TextProps, VerticalAlign,
};
use crate::font::{FontFace, FontRegistry, family_for};
use crate::layout::{LayoutRequest, TextLayout, layout_text};
use crate::options::RenderOptions;

/// Shared inputs for drawing the elements of one frame.
#[derive(Debug, Clone, Copy)]
pub struct ElementInputs<'a> {
    pub fonts: &'a FontRegistry,
    pub images: &'a ImageCache,
    pub data: &'a RenderData,
    pub config: &'a TemplateConfig,
    pub options: &'a RenderOptions,
    pub show_debug_borders: bool,
}

/// What happened to one element during a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementOutcome {
    Drawn,
    /// Nothing to draw: degenerate box, image not loaded, or an
    /// unencodable QR payload.
    Skipped,
}

/// Draw one visible element, then its debug border when enabled.
pub fn render_element(ctx: &mut DrawContext, element: &CertificateElement, inputs: &ElementInputs<'_>) -> ElementOutcome {
    let base = element.base();
    if !(base.width > 0.0 && base.height > 0.0) {
        debug!("element {} has an empty box, skipping", base.id);
        return ElementOutcome::Skipped;
    }

    let language = inputs.config.primary_language();
    let outcome = match element {
        CertificateElement::Text(e) => draw_text(ctx, &e.base, &e.text_props, &text_content(e, inputs.data), inputs),
        CertificateElement::Date(e) => draw_text(
            ctx,
            &e.base,
            &e.text_props,
            &date_content(e, inputs.data, language),
            inputs,
        ),
        CertificateElement::Number(e) => draw_text(
            ctx,
            &e.base,
            &e.text_props,
            &number_content(e, inputs.data, language),
            inputs,
        ),
        CertificateElement::Country(e) => draw_text(
            ctx,
            &e.base,
            &e.text_props,
            &country_content(e, inputs.data, language),
            inputs,
        ),
        CertificateElement::Gender(e) => draw_text(
            ctx,
            &e.base,
            &e.text_props,
            &gender_content(e, inputs.data, language),
            inputs,
        ),
        CertificateElement::Image(e) => draw_image(ctx, e, inputs.images),
        CertificateElement::QrCode(e) => draw_qr_code(ctx, e, inputs),
    };

    if inputs.show_debug_borders {
        let rbox = render_box(base, inputs.options.debug_border_color);
        ctx.stroke_rect(
            Rect::new(rbox.x, rbox.y, rbox.width, rbox.height),
            rbox.color,
            inputs.options.debug_border_width,
        );
    }
    outcome
}

fn draw_text(
    ctx: &mut DrawContext,
    base: &ElementBase,
    props: &TextProps,
    content: &str,
    inputs: &ElementInputs<'_>,
) -> ElementOutcome {
    let face = inputs.fonts.resolve(family_for(&props.font_ref));
    let layout = layout_text(
        face.as_ref(),
        &LayoutRequest {
            text: content,
            max_width: base.width,
            max_height: Some(base.height),
            font_size: props.font_size,
            overflow: props.overflow,
            min_font_size: inputs.options.min_font_size,
        },
    );
    if layout.font_size != props.font_size {
        debug!(
            "element {} resized from {} to {}",
            base.id, props.font_size, layout.font_size
        );
    }

    let rbox = render_box(base, props.color);
    draw_text_block(ctx, face.as_ref(), &layout, &rbox, inputs.config.is_rtl());
    ElementOutcome::Drawn
}

/// Horizontal offset of a line inside its box. Right-to-left templates
/// mirror start and end.
fn line_offset(align: HorizontalAlign, rtl: bool, box_width: f32, line_width: f32) -> f32 {
    match (align, rtl) {
        (HorizontalAlign::Start, false) | (HorizontalAlign::End, true) => 0.0,
        (HorizontalAlign::Center, _) => (box_width - line_width) / 2.0,
        (HorizontalAlign::End, false) | (HorizontalAlign::Start, true) => box_width - line_width,
    }
}

/// Draw laid-out lines, aligned as a block inside `rbox`.
pub fn draw_text_block(ctx: &mut DrawContext, face: &dyn FontFace, layout: &TextLayout, rbox: &RenderBox, rtl: bool) {
    let block_height = layout.height();
    let top = rbox.y
        + match rbox.alignment.vertical() {
            VerticalAlign::Top => 0.0,
            VerticalAlign::Middle => (rbox.height - block_height) / 2.0,
            VerticalAlign::Bottom => rbox.height - block_height,
        };
    let ascent = face.ascent(layout.font_size);

    for (i, line) in layout.lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let width = face.measure(line, layout.font_size);
        let x = rbox.x + line_offset(rbox.alignment.horizontal(), rtl, rbox.width, width);
        let baseline = top + i as f32 * layout.line_height + ascent;
        ctx.fill_text(face, line, layout.font_size, x, baseline, rbox.color);
    }
}

fn draw_image(ctx: &mut DrawContext, element: &ImageElement, images: &ImageCache) -> ElementOutcome {
    let url = element.data_source.image_url.as_str();
    let Some(image) = images.get_image(url) else {
        debug!("image {} not loaded, skipping element {}", url, element.base.id);
        return ElementOutcome::Skipped;
    };

    let base = &element.base;
    let Some(fit) = image_fit(
        image.width() as f32,
        image.height() as f32,
        base.width,
        base.height,
        element.image_props.fit,
    ) else {
        return ElementOutcome::Skipped;
    };

    ctx.draw_image(
        &image,
        Rect::new(base.position_x + fit.x, base.position_y + fit.y, fit.width, fit.height),
        Some(Rect::new(base.position_x, base.position_y, base.width, base.height)),
    );
    ElementOutcome::Drawn
}

fn ec_level(level: QrErrorCorrection) -> EcLevel {
    match level {
        QrErrorCorrection::L => EcLevel::L,
        QrErrorCorrection::M => EcLevel::M,
        QrErrorCorrection::Q => EcLevel::Q,
        QrErrorCorrection::H => EcLevel::H,
    }
}

/// Square QR code, as large as the box allows, centered in it.
fn draw_qr_code(ctx: &mut DrawContext, element: &QrCodeElement, inputs: &ElementInputs<'_>) -> ElementOutcome {
    let payload = qr_payload(element, inputs.data, &inputs.options.verification_base_url);
    let props = &element.qr_code_props;
    let code = match QrCode::with_error_correction_level(payload.as_bytes(), ec_level(props.error_correction)) {
        Ok(code) => code,
        Err(e) => {
            warn!("QR code for element {} failed: {}", element.base.id, e);
            return ElementOutcome::Skipped;
        }
    };

    let base = &element.base;
    let side = base.width.min(base.height);
    let modules = code.width();
    let module = side / modules as f32;
    let x0 = base.position_x + (base.width - side) / 2.0;
    let y0 = base.position_y + (base.height - side) / 2.0;

    ctx.fill_rect(Rect::new(x0, y0, side, side), props.background_color);
    for qy in 0..modules {
        for qx in 0..modules {
            if code[(qx, qy)] == qrcode::Color::Dark {
                ctx.fill_rect(
                    Rect::new(x0 + qx as f32 * module, y0 + qy as f32 * module, module, module),
                    props.foreground_color,
                );
            }
        }
    }
    ElementOutcome::Drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::FileImageSource;
    use crate::document::{
        Color, ElementAlignment, ElementOverflow, ImageDataSource, ImageProps, QrCodeDataSource,
        QrCodeProps, TextDataSource, TextElement,
    };
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    struct Frame {
        fonts: FontRegistry,
        images: ImageCache,
        data: RenderData,
        config: TemplateConfig,
        options: RenderOptions,
    }

    impl Frame {
        fn new() -> Self {
            Self {
                fonts: FontRegistry::default(),
                images: ImageCache::new(Arc::new(FileImageSource)),
                data: RenderData::default(),
                config: TemplateConfig::new(200, 100),
                options: RenderOptions::default(),
            }
        }

        fn inputs(&self, show_debug_borders: bool) -> ElementInputs<'_> {
            ElementInputs {
                fonts: &self.fonts,
                images: &self.images,
                data: &self.data,
                config: &self.config,
                options: &self.options,
                show_debug_borders,
            }
        }
    }

    fn text(value: &str, alignment: ElementAlignment) -> CertificateElement {
        let mut base = ElementBase::new(1, 0.0, 0.0, 200.0, 20.0);
        base.alignment = alignment;
        CertificateElement::Text(TextElement {
            base,
            data_source: TextDataSource::Static { value: value.into() },
            text_props: TextProps {
                font_size: 20.0,
                overflow: ElementOverflow::Truncate,
                ..Default::default()
            },
        })
    }

    /// Horizontal extent of non-transparent pixels.
    fn ink_columns(ctx: &DrawContext) -> Option<(u32, u32)> {
        let xs: Vec<u32> = ctx
            .pixmap()
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] > 0)
            .map(|(x, _, _)| x)
            .collect();
        Some((*xs.iter().min()?, *xs.iter().max()?))
    }

    #[test]
    fn test_line_offset_mirrors_for_rtl() {
        assert_eq!(line_offset(HorizontalAlign::Start, false, 100.0, 40.0), 0.0);
        assert_eq!(line_offset(HorizontalAlign::Start, true, 100.0, 40.0), 60.0);
        assert_eq!(line_offset(HorizontalAlign::End, true, 100.0, 40.0), 0.0);
        assert_eq!(line_offset(HorizontalAlign::Center, true, 100.0, 40.0), 30.0);
    }

    #[test]
    fn test_text_alignment_start_and_end() {
        let frame = Frame::new();

        let mut ctx = DrawContext::new(200, 100);
        render_element(&mut ctx, &text("AB", ElementAlignment::TopStart), &frame.inputs(false));
        let (min_x, max_x) = ink_columns(&ctx).unwrap();
        assert!(min_x < 20 && max_x < 20, "start-aligned ink at {min_x}..{max_x}");

        let mut ctx = DrawContext::new(200, 100);
        render_element(&mut ctx, &text("AB", ElementAlignment::TopEnd), &frame.inputs(false));
        let (min_x, _) = ink_columns(&ctx).unwrap();
        assert!(min_x >= 180, "end-aligned ink starts at {min_x}");
    }

    #[test]
    fn test_rtl_start_alignment_is_right_side() {
        let mut frame = Frame::new();
        frame.config.language = "ar".into();
        let mut ctx = DrawContext::new(200, 100);
        render_element(&mut ctx, &text("AB", ElementAlignment::TopStart), &frame.inputs(false));
        let (min_x, _) = ink_columns(&ctx).unwrap();
        assert!(min_x >= 180);
    }

    #[test]
    fn test_debug_border_drawn_over_content() {
        let frame = Frame::new();
        let mut ctx = DrawContext::new(200, 100);
        render_element(&mut ctx, &text("", ElementAlignment::Center), &frame.inputs(true));
        assert_eq!(ctx.pixmap().get_pixel(0, 0).0, Color::DEBUG_RED.0);
        assert_eq!(ctx.pixmap().get_pixel(199, 19).0, Color::DEBUG_RED.0);
        assert_eq!(ctx.pixmap().get_pixel(100, 50).0[3], 0);
    }

    #[test]
    fn test_missing_image_is_skipped() {
        let frame = Frame::new();
        let element = CertificateElement::Image(ImageElement {
            base: ElementBase::new(2, 0.0, 0.0, 50.0, 50.0),
            data_source: ImageDataSource { image_url: "never-loaded.png".into() },
            image_props: ImageProps::default(),
        });
        let mut ctx = DrawContext::new(100, 100);
        assert_eq!(render_element(&mut ctx, &element, &frame.inputs(false)), ElementOutcome::Skipped);
        assert!(ctx.pixmap().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_loaded_image_drawn_inside_box() {
        let frame = Frame::new();
        frame
            .images
            .set_image("logo.png", Arc::new(RgbaImage::from_pixel(10, 5, Rgba([0, 128, 0, 255]))));
        let element = CertificateElement::Image(ImageElement {
            base: ElementBase::new(2, 10.0, 10.0, 40.0, 40.0),
            data_source: ImageDataSource { image_url: "logo.png".into() },
            image_props: ImageProps::default(),
        });
        let mut ctx = DrawContext::new(100, 100);
        assert_eq!(render_element(&mut ctx, &element, &frame.inputs(false)), ElementOutcome::Drawn);
        // Contain: 40x20 centered vertically at y = 20..40.
        let inside = ctx.pixmap().get_pixel(30, 30).0;
        assert!(inside[1] > 100 && inside[0] == 0 && inside[3] == 255, "{inside:?}");
        assert_eq!(ctx.pixmap().get_pixel(30, 15).0[3], 0);
        assert_eq!(ctx.pixmap().get_pixel(5, 30).0[3], 0);
    }

    #[test]
    fn test_qr_code_is_centered_square() {
        let frame = Frame::new();
        let element = CertificateElement::QrCode(QrCodeElement {
            base: ElementBase::new(3, 0.0, 0.0, 100.0, 60.0),
            data_source: QrCodeDataSource::VerificationCode,
            qr_code_props: QrCodeProps::default(),
        });
        let mut ctx = DrawContext::new(100, 60);
        assert_eq!(render_element(&mut ctx, &element, &frame.inputs(false)), ElementOutcome::Drawn);

        let (min_x, max_x) = ink_columns(&ctx).unwrap();
        assert_eq!((min_x, max_x), (20, 79));
        // Top-left finder pattern corner is dark.
        assert_eq!(ctx.pixmap().get_pixel(20, 0).0, Color::BLACK.0);
    }
}
