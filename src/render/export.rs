//! Raster export: PNG bytes and `data:` URLs.
//!
//! Exports run off the draw path. The draw hands its pixmap to
//! [`schedule_export`] and returns; the callback fires once encoding is done.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ExtendedColorType, ImageEncoder, RgbaImage, imageops};
use log::debug;
use std::time::Instant;

use crate::document::TemplateConfig;
use crate::error::LaurelError;
use crate::options::RenderOptions;

/// An encoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedRaster {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ExportedRaster {
    /// `data:image/png;base64,...`
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

/// Receives the export of a finished draw.
pub type ExportCallback = Box<dyn FnOnce(Result<ExportedRaster, LaurelError>) + Send + 'static>;

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, LaurelError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
        .map_err(|e: image::ImageError| LaurelError::Encode(e.to_string()))?;
    Ok(png_bytes)
}

/// Pixel size of the exported raster.
///
/// Frames rendered above `downsample_threshold` are scaled down to
/// `export_scale_cap` times the logical canvas; anything else exports at
/// its rendered size.
pub fn export_size(
    config: &TemplateConfig,
    render_scale: f32,
    rendered: (u32, u32),
    options: &RenderOptions,
) -> (u32, u32) {
    if render_scale > options.downsample_threshold {
        let cap = options.export_scale_cap.max(f32::MIN_POSITIVE);
        (
            ((config.width as f32 * cap).round() as u32).max(1),
            ((config.height as f32 * cap).round() as u32).max(1),
        )
    } else {
        rendered
    }
}

/// Resize (when needed) and encode.
pub fn export_raster(image: &RgbaImage, target: (u32, u32)) -> Result<ExportedRaster, LaurelError> {
    let start = Instant::now();
    let resized;
    let source = if image.dimensions() == target {
        image
    } else {
        resized = imageops::resize(image, target.0, target.1, imageops::FilterType::Triangle);
        &resized
    };
    let png = encode_png(source)?;
    debug!(
        "exported {}x{} PNG ({} bytes) in {:?}",
        source.width(),
        source.height(),
        png.len(),
        start.elapsed()
    );
    Ok(ExportedRaster {
        png,
        width: source.width(),
        height: source.height(),
    })
}

/// Export `image` in the background and hand the result to `callback`.
///
/// Inside a tokio runtime the work goes to the blocking pool; otherwise a
/// plain thread runs it.
pub fn schedule_export(image: RgbaImage, target: (u32, u32), callback: ExportCallback) {
    let job = move || callback(export_raster(&image, target));
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(job);
        }
        Err(_) => {
            std::thread::spawn(job);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_png_signature_and_data_url() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        let raster = export_raster(&image, (3, 2)).unwrap();
        assert_eq!(&raster.png[..8], b"\x89PNG\r\n\x1a\n");
        assert!(raster.data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));

        let decoded = image::load_from_memory(&raster.png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(2, 1).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_export_size_downsamples_above_threshold() {
        let config = TemplateConfig::new(800, 600);
        let options = RenderOptions::default();
        assert_eq!(export_size(&config, 4.0, (3200, 2400), &options), (1600, 1200));
        assert_eq!(export_size(&config, 2.0, (1600, 1200), &options), (1600, 1200));
        assert_eq!(export_size(&config, 1.0, (800, 600), &options), (800, 600));
    }

    #[test]
    fn test_schedule_export_without_runtime() {
        let (tx, rx) = mpsc::channel();
        schedule_export(
            RgbaImage::new(8, 8),
            (4, 4),
            Box::new(move |result| {
                let _ = tx.send(result.map(|r| (r.width, r.height)));
            }),
        );
        let size = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(size, (4, 4));
    }
}
