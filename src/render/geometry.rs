//! Canvas dimensions, z-ordering and image-fit geometry.

use crate::document::{CertificateElement, Color, ElementAlignment, ElementBase, ElementImageFit, TemplateConfig};
use crate::error::LaurelError;

/// Pixel size of the surface for a given render scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasDimensions {
    pub render_width: u32,
    pub render_height: u32,
}

/// `config` size times `scale`, rounded to whole pixels (at least 1x1).
///
/// Fails when the surface would hold more than `max_pixels` pixels.
pub fn canvas_dimensions(
    config: &TemplateConfig,
    scale: f32,
    max_pixels: u64,
) -> Result<CanvasDimensions, LaurelError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(LaurelError::Design(format!(
            "render scale must be positive, got {}",
            scale
        )));
    }
    crate::document::validate_config(config)?;

    let width = (config.width as f64 * scale as f64).round().max(1.0);
    let height = (config.height as f64 * scale as f64).round().max(1.0);
    if width > u32::MAX as f64 || height > u32::MAX as f64 || width * height > max_pixels as f64 {
        return Err(LaurelError::Design(format!(
            "{}x{} at scale {} exceeds the {} pixel render limit",
            config.width, config.height, scale, max_pixels
        )));
    }
    Ok(CanvasDimensions {
        render_width: width as u32,
        render_height: height as u32,
    })
}

/// Elements ascending by z-index; equal z-indices keep their input order.
pub fn sort_by_z(elements: &[CertificateElement]) -> Vec<&CertificateElement> {
    let mut sorted: Vec<&CertificateElement> = elements.iter().collect();
    // `sort_by_key` is stable.
    sorted.sort_by_key(|element| element.base().z_index);
    sorted
}

/// Placement of an image relative to its element box origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageDimensions {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Where an `image_w`×`image_h` image lands inside a `box_w`×`box_h` box.
///
/// Returns `None` for degenerate images or boxes (any side ≤ 0), which the
/// caller treats as nothing to draw.
pub fn image_fit(
    image_w: f32,
    image_h: f32,
    box_w: f32,
    box_h: f32,
    mode: ElementImageFit,
) -> Option<ImageDimensions> {
    let positive = |v: f32| v.is_finite() && v > 0.0;
    if !(positive(image_w) && positive(image_h) && positive(box_w) && positive(box_h)) {
        return None;
    }

    let image_aspect = image_w / image_h;
    let box_aspect = box_w / box_h;

    let width_bound = |width: f32| {
        let height = width / image_aspect;
        ImageDimensions {
            x: 0.0,
            y: (box_h - height) / 2.0,
            width,
            height,
        }
    };
    let height_bound = |height: f32| {
        let width = height * image_aspect;
        ImageDimensions {
            x: (box_w - width) / 2.0,
            y: 0.0,
            width,
            height,
        }
    };

    Some(match mode {
        ElementImageFit::Fill => ImageDimensions {
            x: 0.0,
            y: 0.0,
            width: box_w,
            height: box_h,
        },
        ElementImageFit::Contain => {
            if image_aspect > box_aspect {
                width_bound(box_w)
            } else {
                height_bound(box_h)
            }
        }
        ElementImageFit::Cover => {
            if image_aspect > box_aspect {
                // Wider than the box: match heights, overflow left and right.
                let mut dims = height_bound(box_h);
                dims.width = dims.width.max(box_w);
                dims
            } else {
                let mut dims = width_bound(box_w);
                dims.height = dims.height.max(box_h);
                dims
            }
        }
    })
}

/// Geometry and style for drawing one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Color,
    pub alignment: ElementAlignment,
}

impl RenderBox {
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

pub fn render_box(base: &ElementBase, color: Color) -> RenderBox {
    RenderBox {
        x: base.position_x,
        y: base.position_y,
        width: base.width,
        height: base.height,
        color,
        alignment: base.alignment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementBase, TextDataSource, TextElement, TextProps};

    fn element(id: i64, z: i32) -> CertificateElement {
        let mut base = ElementBase::new(id, 0.0, 0.0, 10.0, 10.0);
        base.z_index = z;
        CertificateElement::Text(TextElement {
            base,
            data_source: TextDataSource::Static { value: String::new() },
            text_props: TextProps::default(),
        })
    }

    const LIMIT: u64 = 64_000_000;

    #[test]
    fn test_canvas_dimensions() {
        let config = TemplateConfig::new(800, 600);
        let dims = canvas_dimensions(&config, 2.0, LIMIT).unwrap();
        assert_eq!(dims, CanvasDimensions { render_width: 1600, render_height: 1200 });

        let half = canvas_dimensions(&config, 0.5, LIMIT).unwrap();
        assert_eq!((half.render_width, half.render_height), (400, 300));
    }

    #[test]
    fn test_canvas_dimensions_rejects_bad_scale() {
        let config = TemplateConfig::new(800, 600);
        assert!(canvas_dimensions(&config, 0.0, LIMIT).is_err());
        assert!(canvas_dimensions(&config, -1.0, LIMIT).is_err());
        assert!(canvas_dimensions(&config, f32::NAN, LIMIT).is_err());
    }

    #[test]
    fn test_canvas_dimensions_rejects_oversized_surface() {
        let config = TemplateConfig::new(800, 600);
        // Would saturate u32 if computed in f32 and cast.
        assert!(matches!(canvas_dimensions(&config, 1.0e7, LIMIT), Err(LaurelError::Design(_))));
        // 40000x30000 fits u32 but not the pixel budget.
        assert!(matches!(canvas_dimensions(&config, 50.0, LIMIT), Err(LaurelError::Design(_))));
        // Exactly at the limit is allowed.
        let dims = canvas_dimensions(&config, 1.0, 800 * 600).unwrap();
        assert_eq!((dims.render_width, dims.render_height), (800, 600));
        assert!(canvas_dimensions(&config, 1.0, 800 * 600 - 1).is_err());
    }

    #[test]
    fn test_sort_by_z_is_stable() {
        let elements = vec![element(1, 5), element(2, 5), element(3, 1)];
        let ids: Vec<_> = sort_by_z(&elements).iter().map(|e| e.base().id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_fill_ignores_aspect() {
        let dims = image_fit(400.0, 100.0, 50.0, 80.0, ElementImageFit::Fill).unwrap();
        assert_eq!(dims, ImageDimensions { x: 0.0, y: 0.0, width: 50.0, height: 80.0 });
    }

    #[test]
    fn test_contain_wide_image_is_width_bound() {
        let dims = image_fit(200.0, 100.0, 100.0, 100.0, ElementImageFit::Contain).unwrap();
        assert_eq!(dims, ImageDimensions { x: 0.0, y: 25.0, width: 100.0, height: 50.0 });
    }

    #[test]
    fn test_cover_wide_image_overflows_horizontally() {
        let dims = image_fit(200.0, 100.0, 100.0, 100.0, ElementImageFit::Cover).unwrap();
        assert_eq!(dims, ImageDimensions { x: -50.0, y: 0.0, width: 200.0, height: 100.0 });
    }

    #[test]
    fn test_cover_tall_image_overflows_vertically() {
        let dims = image_fit(100.0, 400.0, 100.0, 100.0, ElementImageFit::Cover).unwrap();
        assert_eq!(dims, ImageDimensions { x: 0.0, y: -150.0, width: 100.0, height: 400.0 });
    }

    #[test]
    fn test_fit_properties_over_grid() {
        let sizes = [1.0, 3.0, 17.0, 64.0, 100.0, 333.0, 1024.0];
        for &iw in &sizes {
            for &ih in &sizes {
                for &bw in &sizes {
                    for &bh in &sizes {
                        let cover = image_fit(iw, ih, bw, bh, ElementImageFit::Cover).unwrap();
                        assert!(cover.width >= bw && cover.height >= bh, "cover {iw}x{ih} in {bw}x{bh}: {cover:?}");

                        let contain = image_fit(iw, ih, bw, bh, ElementImageFit::Contain).unwrap();
                        let eps = 1e-3;
                        assert!(
                            contain.width <= bw + eps && contain.height <= bh + eps,
                            "contain {iw}x{ih} in {bw}x{bh}: {contain:?}"
                        );
                        assert!(contain.x >= -eps && contain.y >= -eps);
                    }
                }
            }
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(image_fit(0.0, 10.0, 10.0, 10.0, ElementImageFit::Cover).is_none());
        assert!(image_fit(10.0, 0.0, 10.0, 10.0, ElementImageFit::Contain).is_none());
        assert!(image_fit(10.0, 10.0, 10.0, 0.0, ElementImageFit::Fill).is_none());
        assert!(image_fit(10.0, 10.0, -5.0, 10.0, ElementImageFit::Fill).is_none());
    }
}
