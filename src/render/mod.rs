//! # Rendering Module
//!
//! Turns a certificate design into pixels.
//!
//! ## Modules
//!
//! - [`geometry`]: canvas size, z-ordering, image fit
//! - [`surface`]: the RGBA drawing context
//! - [`elements`]: one renderer per element kind
//! - [`renderer`]: gates, draw loop and background export
//! - [`export`]: PNG and data URL encoding
//! - [`hash`]: content hash of a frame's inputs
//!
//! ## Usage Example
//!
//! ```
//! use std::sync::Arc;
//! use laurel::assets::{FileImageSource, ImageCache};
//! use laurel::document::{Design, RenderData};
//! use laurel::font::FontRegistry;
//! use laurel::options::RenderOptions;
//! use laurel::render::{DrawRequest, Renderer};
//!
//! let design = Design::from_json(r#"{
//!     "config": {"width": 320, "height": 120},
//!     "elements": [{
//!         "type": "text",
//!         "base": {"id": 1, "position_x": 10, "position_y": 10, "width": 300, "height": 40},
//!         "data_source": {"kind": "static", "value": "Jane Doe"}
//!     }]
//! }"#).unwrap();
//!
//! let renderer = Renderer::new(
//!     Arc::new(FontRegistry::default()),
//!     ImageCache::new(Arc::new(FileImageSource)),
//!     RenderOptions::default(),
//! );
//! let data = RenderData::default();
//! let (surface, stats) = renderer
//!     .render(&DrawRequest::new(&design.elements, &design.config, &data))
//!     .unwrap();
//! assert_eq!((surface.width(), surface.height()), (320, 120));
//! assert_eq!(stats.drawn, 1);
//! ```

pub mod elements;
pub mod export;
pub mod geometry;
pub mod hash;
pub mod renderer;
pub mod surface;

pub use export::{ExportCallback, ExportedRaster};
pub use geometry::{CanvasDimensions, ImageDimensions, RenderBox, canvas_dimensions, image_fit, sort_by_z};
pub use hash::{ContentHash, HashInputs, content_hash};
pub use renderer::{DrawOutcome, DrawRequest, DrawStats, PngFrame, ReadyState, Renderer};
pub use surface::{DrawContext, Rect};
