//! # Laurel - Certificate Design Renderer
//!
//! Laurel draws certificate templates: positioned text, dates, numbers,
//! countries, genders, images and QR codes on a fixed-size canvas. It
//! provides:
//!
//! - **Design model**: serde types for elements, data sources and preview data
//! - **Text layout**: wrap, truncate, ellipsis and resize-down fitting
//! - **Image assets**: a shared decode cache with in-flight deduplication
//! - **Rendering**: gated, z-ordered drawing with background PNG export
//! - **Content hashing**: SHA-256 keys for memoizing frames
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use laurel::{
//!     assets::{DefaultImageSource, ImageCache},
//!     document::{Design, RenderData},
//!     font::FontRegistry,
//!     options::RenderOptions,
//!     render::{DrawRequest, Renderer},
//! };
//!
//! # async fn example() -> Result<(), laurel::LaurelError> {
//! let design = Design::from_json(&std::fs::read_to_string("design.json")?)?;
//! let renderer = Renderer::new(
//!     Arc::new(FontRegistry::default()),
//!     ImageCache::new(Arc::new(DefaultImageSource::new()?)),
//!     RenderOptions::default(),
//! );
//!
//! let data = RenderData::default();
//! let mut request = DrawRequest::new(&design.elements, &design.config, &data);
//! request.render_scale = 2.0;
//!
//! let frame = renderer.render_png(&request).await?;
//! std::fs::write("certificate.png", &frame.raster.png)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`document`] | Design types, data resolution, localization |
//! | [`layout`] | Text fitting policies |
//! | [`font`] | Font faces and the family registry |
//! | [`assets`] | Image sources, cache and loader |
//! | [`render`] | Surface, element renderers, orchestrator, export, hashing |
//! | [`server`] | HTTP preview API |
//! | [`options`] | Renderer configuration |
//! | [`error`] | Error types |

pub mod assets;
pub mod document;
pub mod error;
pub mod font;
pub mod layout;
pub mod options;
pub mod render;
pub mod server;

// Re-exports for convenience
pub use error::{ImageLoadError, LaurelError};
pub use options::RenderOptions;
pub use render::Renderer;
