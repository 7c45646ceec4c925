//! Loading every image a design references before a draw.

use futures::future::join_all;
use log::{info, warn};
use std::collections::BTreeSet;

use super::cache::ImageCache;
use crate::document::CertificateElement;
use crate::error::ImageLoadError;

/// Distinct image URLs used by visible elements, sorted.
pub fn image_urls(elements: &[CertificateElement]) -> Vec<String> {
    elements
        .iter()
        .filter(|e| !e.is_hidden())
        .filter_map(|e| e.image_url())
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Outcome of a load pass. Failures are reported but never block the draw;
/// elements whose image failed are simply skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagesLoaded {
    pub loaded: Vec<String>,
    pub failed: Vec<ImageLoadError>,
}

impl ImagesLoaded {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ImageLoader {
    cache: ImageCache,
}

impl ImageLoader {
    pub fn new(cache: ImageCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Load every image URL in `elements` concurrently and wait for all of
    /// them to settle.
    pub async fn load(&self, elements: &[CertificateElement]) -> ImagesLoaded {
        let urls = image_urls(elements);
        if urls.is_empty() {
            return ImagesLoaded::default();
        }

        let results = join_all(urls.iter().map(|url| self.cache.load_image_with_cache(url))).await;

        let mut outcome = ImagesLoaded::default();
        for (url, result) in urls.into_iter().zip(results) {
            match result {
                Ok(_) => outcome.loaded.push(url),
                Err(e) => {
                    warn!("image unavailable, element will be skipped: {}", e);
                    outcome.failed.push(e);
                }
            }
        }
        info!(
            "images ready: {} loaded, {} failed",
            outcome.loaded.len(),
            outcome.failed.len()
        );
        outcome
    }
}
