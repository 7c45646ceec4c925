//! Draw orchestrator.
//!
//! A draw runs only when every readiness gate is open and a surface exists.
//! It sizes and clears the surface, draws visible elements in z-order under
//! the render scale, then optionally hands the pixels to a background export.

use log::{debug, error, info};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::elements::{ElementInputs, ElementOutcome, render_element};
use super::export::{ExportCallback, ExportedRaster, export_size, schedule_export};
use super::geometry::{canvas_dimensions, sort_by_z};
use super::hash::{ContentHash, HashInputs, content_hash};
use super::surface::DrawContext;
use crate::assets::{ImageCache, ImageLoader, ImagesLoaded};
use crate::document::{CertificateElement, RenderData, TemplateConfig};
use crate::error::LaurelError;
use crate::font::{FontRegistry, font_families};
use crate::options::RenderOptions;

/// Readiness gates checked before every draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadyState {
    pub fonts_loaded: bool,
    pub metrics_ready: bool,
    pub images_loaded: bool,
}

impl ReadyState {
    pub const READY: ReadyState = ReadyState {
        fonts_loaded: true,
        metrics_ready: true,
        images_loaded: true,
    };

    pub fn is_ready(&self) -> bool {
        self.fonts_loaded && self.metrics_ready && self.images_loaded
    }
}

/// Inputs of one frame.
#[derive(Debug, Clone, Copy)]
pub struct DrawRequest<'a> {
    pub elements: &'a [CertificateElement],
    pub config: &'a TemplateConfig,
    pub data: &'a RenderData,
    pub show_debug_borders: bool,
    /// Device pixels per logical unit; must be positive.
    pub render_scale: f32,
}

impl<'a> DrawRequest<'a> {
    /// Request at scale 1 without debug borders.
    pub fn new(elements: &'a [CertificateElement], config: &'a TemplateConfig, data: &'a RenderData) -> Self {
        Self {
            elements,
            config,
            data,
            show_debug_borders: false,
            render_scale: 1.0,
        }
    }

    pub fn hash_inputs(&self) -> HashInputs<'a> {
        HashInputs {
            elements: self.elements,
            config: self.config,
            show_debug_borders: self.show_debug_borders,
            render_scale: self.render_scale,
            data: Some(self.data),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    pub drawn: usize,
    /// Visible elements that had nothing to draw.
    pub skipped: usize,
    pub hidden: usize,
    pub render_width: u32,
    pub render_height: u32,
    pub duration: Duration,
}

/// A PNG export together with the image loads it was drawn from.
#[derive(Debug, Clone)]
pub struct PngFrame {
    pub raster: ExportedRaster,
    pub images: ImagesLoaded,
}

impl PngFrame {
    /// Every image the frame references was drawn.
    pub fn is_complete(&self) -> bool {
        self.images.all_succeeded()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A gate was closed; carries the gates as they were.
    Skipped(ReadyState),
    Drawn(DrawStats),
}

/// Draws certificate frames with shared fonts and images.
#[derive(Debug)]
pub struct Renderer {
    fonts: Arc<FontRegistry>,
    images: ImageCache,
    options: RenderOptions,
    last_draw: Mutex<Option<Duration>>,
}

impl Renderer {
    pub fn new(fonts: Arc<FontRegistry>, images: ImageCache, options: RenderOptions) -> Self {
        Self {
            fonts,
            images,
            options,
            last_draw: Mutex::new(None),
        }
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Duration of the most recent completed draw.
    pub fn last_draw_duration(&self) -> Option<Duration> {
        *self.last_draw.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load what `elements` need and report the resulting gates.
    ///
    /// Missing font families are not fatal (the registry falls back), and
    /// failed images leave their elements undrawn, so every gate opens once
    /// loading has settled.
    pub async fn prepare(&self, elements: &[CertificateElement]) -> ReadyState {
        self.load_assets(elements).await;
        ReadyState::READY
    }

    async fn load_assets(&self, elements: &[CertificateElement]) -> ImagesLoaded {
        let families = font_families(elements);
        let missing = self.fonts.missing(&families);
        if !missing.is_empty() {
            info!(
                "font families not loaded, drawing with fallbacks: {}",
                missing.join(", ")
            );
        }

        let images = ImageLoader::new(self.images.clone()).load(elements).await;
        debug!(
            "prepared {} element(s): {} image(s) loaded, {} failed",
            elements.len(),
            images.loaded.len(),
            images.failed.len()
        );
        images
    }

    /// Draw one frame into `surface`.
    ///
    /// Returns `MissingSurface` when there is no surface and
    /// `DrawOutcome::Skipped` when a gate is closed. When `on_complete` is
    /// given, the frame is exported in the background after the draw.
    pub fn draw(
        &self,
        surface: Option<&mut DrawContext>,
        gates: ReadyState,
        request: &DrawRequest<'_>,
        on_complete: Option<ExportCallback>,
    ) -> Result<DrawOutcome, LaurelError> {
        let Some(ctx) = surface else {
            let err = LaurelError::MissingSurface(format!("draw of {} element(s)", request.elements.len()));
            error!("{}", err);
            return Err(err);
        };
        if !gates.is_ready() {
            debug!("draw skipped, gates not open: {:?}", gates);
            return Ok(DrawOutcome::Skipped(gates));
        }

        let start = Instant::now();
        let dims = canvas_dimensions(request.config, request.render_scale, self.options.max_render_pixels)?;
        ctx.resize(dims.render_width, dims.render_height);
        ctx.clear();

        ctx.save();
        ctx.scale(request.render_scale);

        let inputs = ElementInputs {
            fonts: &self.fonts,
            images: &self.images,
            data: request.data,
            config: request.config,
            options: &self.options,
            show_debug_borders: request.show_debug_borders,
        };
        let mut stats = DrawStats {
            drawn: 0,
            skipped: 0,
            hidden: 0,
            render_width: dims.render_width,
            render_height: dims.render_height,
            duration: Duration::ZERO,
        };
        for element in sort_by_z(request.elements) {
            if element.is_hidden() {
                stats.hidden += 1;
                continue;
            }
            match render_element(ctx, element, &inputs) {
                ElementOutcome::Drawn => stats.drawn += 1,
                ElementOutcome::Skipped => stats.skipped += 1,
            }
        }

        ctx.restore();

        stats.duration = start.elapsed();
        *self.last_draw.lock().unwrap_or_else(PoisonError::into_inner) = Some(stats.duration);
        debug!(
            "drew {} element(s) at {}x{} in {:?} ({} skipped, {} hidden)",
            stats.drawn, stats.render_width, stats.render_height, stats.duration, stats.skipped, stats.hidden
        );

        if let Some(callback) = on_complete {
            let target = export_size(
                request.config,
                request.render_scale,
                (dims.render_width, dims.render_height),
                &self.options,
            );
            schedule_export(ctx.pixmap().clone(), target, callback);
        }

        Ok(DrawOutcome::Drawn(stats))
    }

    /// Draw onto a fresh surface with every gate open.
    pub fn render(&self, request: &DrawRequest<'_>) -> Result<(DrawContext, DrawStats), LaurelError> {
        let mut ctx = DrawContext::new(1, 1);
        match self.draw(Some(&mut ctx), ReadyState::READY, request, None)? {
            DrawOutcome::Drawn(stats) => Ok((ctx, stats)),
            DrawOutcome::Skipped(gates) => Err(LaurelError::Design(format!("draw skipped: {:?}", gates))),
        }
    }

    /// Prepare, draw and export one frame as PNG.
    ///
    /// Image failures do not fail the render; they are reported in
    /// [`PngFrame::images`].
    pub async fn render_png(&self, request: &DrawRequest<'_>) -> Result<PngFrame, LaurelError> {
        canvas_dimensions(request.config, request.render_scale, self.options.max_render_pixels)?;
        let images = self.load_assets(request.elements).await;
        let (tx, rx) = tokio::sync::oneshot::channel();
        let mut ctx = DrawContext::new(1, 1);
        let callback: ExportCallback = Box::new(move |result| {
            let _ = tx.send(result);
        });
        self.draw(Some(&mut ctx), ReadyState::READY, request, Some(callback))?;
        let raster = rx
            .await
            .map_err(|_| LaurelError::Encode("export finished without a result".to_string()))??;
        Ok(PngFrame { raster, images })
    }

    /// Content hash identifying the frame `request` would draw.
    pub fn cache_key(&self, request: &DrawRequest<'_>) -> Result<ContentHash, LaurelError> {
        let hash = content_hash(&request.hash_inputs())?;
        debug!("cache key {} computed in {:?}", hash.key, hash.elapsed);
        Ok(hash)
    }
}
