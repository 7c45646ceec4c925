//! # Image Assets
//!
//! Fetching, decoding and caching the bitmaps image elements draw.
//!
//! - [`source`]: where bytes come from (HTTP, local files)
//! - [`cache`]: decoded images keyed by URL, with in-flight deduplication
//! - [`loader`]: loads every image a design needs before a draw

pub mod cache;
pub mod loader;
pub mod source;

pub use cache::{CacheEntry, EvictionPolicy, Expiring, ImageCache, MaxEntries, Unbounded};
pub use loader::{ImageLoader, ImagesLoaded, image_urls};
pub use source::{DefaultImageSource, FileImageSource, HttpImageSource, ImageSource};
