//! Decoded-image cache with in-flight deduplication.
//!
//! At most one fetch+decode runs per URL at a time; concurrent callers for
//! the same URL await the same shared future and receive the same outcome.
//! A settled decode is inserted into the cache before its in-flight entry is
//! removed, so a caller that finds no in-flight entry under the lock either
//! sees the cached image or starts the only decode.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use image::RgbaImage;
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::source::ImageSource;
use crate::error::ImageLoadError;

pub type LoadResult = Result<Arc<RgbaImage>, ImageLoadError>;
type InFlight = Shared<BoxFuture<'static, LoadResult>>;

/// Cached image with its last access time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    image: Arc<RgbaImage>,
    pub last_accessed: Instant,
}

impl CacheEntry {
    pub fn new(image: Arc<RgbaImage>) -> Self {
        Self {
            image,
            last_accessed: Instant::now(),
        }
    }

    /// Update last accessed time.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }

    pub fn image(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.image)
    }
}

/// Decides which cached URLs to drop. Runs after every insert.
pub trait EvictionPolicy: Send + Sync + fmt::Debug {
    fn victims(&self, entries: &HashMap<String, CacheEntry>, now: Instant) -> Vec<String>;
}

/// Never evicts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl EvictionPolicy for Unbounded {
    fn victims(&self, _entries: &HashMap<String, CacheEntry>, _now: Instant) -> Vec<String> {
        Vec::new()
    }
}

/// Keeps the `n` most recently used entries.
#[derive(Debug, Clone, Copy)]
pub struct MaxEntries(pub usize);

impl EvictionPolicy for MaxEntries {
    fn victims(&self, entries: &HashMap<String, CacheEntry>, _now: Instant) -> Vec<String> {
        if entries.len() <= self.0 {
            return Vec::new();
        }
        let mut by_age: Vec<(&String, Instant)> =
            entries.iter().map(|(url, entry)| (url, entry.last_accessed)).collect();
        by_age.sort_by_key(|(_, accessed)| *accessed);
        by_age
            .into_iter()
            .take(entries.len() - self.0)
            .map(|(url, _)| url.clone())
            .collect()
    }
}

/// Drops entries not accessed for longer than the given duration.
#[derive(Debug, Clone, Copy)]
pub struct Expiring(pub Duration);

impl EvictionPolicy for Expiring {
    fn victims(&self, entries: &HashMap<String, CacheEntry>, now: Instant) -> Vec<String> {
        entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_accessed) >= self.0)
            .map(|(url, _)| url.clone())
            .collect()
    }
}

struct Inner {
    images: RwLock<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    source: Arc<dyn ImageSource>,
    policy: Box<dyn EvictionPolicy>,
}

impl Inner {
    fn insert(&self, url: &str, image: Arc<RgbaImage>) {
        let mut images = self.images.write().unwrap_or_else(PoisonError::into_inner);
        images.insert(url.to_string(), CacheEntry::new(image));
        self.evict_locked(&mut images);
    }

    fn evict_locked(&self, images: &mut HashMap<String, CacheEntry>) -> usize {
        let victims = self.policy.victims(images, Instant::now());
        for victim in &victims {
            images.remove(victim);
        }
        if !victims.is_empty() {
            debug!("[cache] evicted {} image(s) ({} remaining)", victims.len(), images.len());
        }
        victims.len()
    }

    /// Record the outcome of a decode and release its in-flight slot.
    fn settle(&self, url: &str, result: &LoadResult) {
        match result {
            Ok(image) => self.insert(url, Arc::clone(image)),
            Err(e) => warn!("[cache] {}", e),
        }
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url);
    }
}

/// Shared, cloneable handle to the image cache.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("images", &self.len())
            .field("in_flight", &self.in_flight_count())
            .field("policy", &self.inner.policy)
            .finish()
    }
}

impl ImageCache {
    /// Cache that never evicts.
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        Self::with_policy(source, Box::new(Unbounded))
    }

    pub fn with_policy(source: Arc<dyn ImageSource>, policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            inner: Arc::new(Inner {
                images: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                source,
                policy,
            }),
        }
    }

    pub fn has_image(&self, url: &str) -> bool {
        self.inner
            .images
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(url)
    }

    /// Cached image for `url`, marking it as recently used.
    pub fn get_image(&self, url: &str) -> Option<Arc<RgbaImage>> {
        let mut images = self.inner.images.write().unwrap_or_else(PoisonError::into_inner);
        images.get_mut(url).map(|entry| {
            entry.touch();
            entry.image()
        })
    }

    pub fn set_image(&self, url: &str, image: Arc<RgbaImage>) {
        self.inner.insert(url, image);
    }

    pub fn len(&self) -> usize {
        self.inner.images.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the eviction policy now; returns how many images were dropped.
    pub fn evict(&self) -> usize {
        let mut images = self.inner.images.write().unwrap_or_else(PoisonError::into_inner);
        self.inner.evict_locked(&mut images)
    }

    /// Decodes currently running.
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Cached image for `url`, fetching and decoding it on a miss.
    ///
    /// Must be called from within a tokio runtime: the decode runs as its own
    /// task so it completes even if every waiter is dropped.
    pub async fn load_image_with_cache(&self, url: &str) -> LoadResult {
        if let Some(image) = self.get_image(url) {
            return Ok(image);
        }

        let flight = {
            let mut in_flight = self.inner.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            // A decode may have settled between the lookup above and taking the lock.
            if let Some(image) = self.get_image(url) {
                return Ok(image);
            }
            match in_flight.get(url) {
                Some(flight) => {
                    debug!("[cache] joining in-flight decode of {}", url);
                    flight.clone()
                }
                None => {
                    let flight = self.spawn_decode(url);
                    in_flight.insert(url.to_string(), flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    fn spawn_decode(&self, url: &str) -> InFlight {
        let inner = Arc::clone(&self.inner);
        let owned = url.to_string();
        let task = tokio::spawn(async move {
            let result = fetch_and_decode(inner.source.as_ref(), &owned).await;
            inner.settle(&owned, &result);
            result
        });

        let inner = Arc::clone(&self.inner);
        let owned = url.to_string();
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    // The task never reached `settle`.
                    inner
                        .in_flight
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .remove(&owned);
                    Err(ImageLoadError::Aborted {
                        url: owned,
                        reason: e.to_string(),
                    })
                }
            }
        }
        .boxed()
        .shared()
    }
}

async fn fetch_and_decode(source: &dyn ImageSource, url: &str) -> LoadResult {
    let start = Instant::now();
    let bytes = source.fetch(url).await?;
    let owned = url.to_string();
    let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| ImageLoadError::Aborted {
            url: owned.clone(),
            reason: e.to_string(),
        })?
        .map_err(|e| ImageLoadError::Decode {
            url: owned.clone(),
            reason: e.to_string(),
        })?;
    let image = decoded.to_rgba8();
    debug!(
        "[cache] decoded {} ({}x{}) in {:?}",
        url,
        image.width(),
        image.height(),
        start.elapsed()
    );
    Ok(Arc::new(image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Serves a fixed PNG, counting fetches, with a delay so concurrent
    /// callers overlap.
    struct CountingSource {
        fetches: AtomicUsize,
        body: Vec<u8>,
    }

    #[async_trait]
    impl ImageSource for CountingSource {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, ImageLoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(self.body.clone())
        }
    }

    fn counting(body: Vec<u8>) -> Arc<CountingSource> {
        Arc::new(CountingSource {
            fetches: AtomicUsize::new(0),
            body,
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_loads_decode_once() {
        let source = counting(png_bytes(3, 2));
        let cache = ImageCache::new(source.clone());

        let loads: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.load_image_with_cache("https://x/a.png").await })
            })
            .collect();
        let results = futures::future::join_all(loads).await;

        let first = results[0].as_ref().unwrap().as_ref().unwrap().clone();
        for result in &results {
            let image = result.as_ref().unwrap().as_ref().unwrap();
            assert!(Arc::ptr_eq(image, &first));
        }
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(cache.has_image("https://x/a.png"));
        assert_eq!(cache.in_flight_count(), 0);
        assert_eq!(first.dimensions(), (3, 2));
    }

    #[tokio::test]
    async fn test_cached_image_skips_fetch() {
        let source = counting(png_bytes(1, 1));
        let cache = ImageCache::new(source.clone());
        cache.load_image_with_cache("a").await.unwrap();
        cache.load_image_with_cache("a").await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decode_failure_is_shared_and_not_cached() {
        let source = counting(b"not an image".to_vec());
        let cache = ImageCache::new(source.clone());

        let (a, b) = tokio::join!(cache.load_image_with_cache("bad"), cache.load_image_with_cache("bad"));
        let (a, b) = (a.unwrap_err(), b.unwrap_err());
        assert!(matches!(a, ImageLoadError::Decode { .. }));
        assert_eq!(a, b);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(!cache.has_image("bad"));
        assert_eq!(cache.in_flight_count(), 0);

        // A later call retries.
        let _ = cache.load_image_with_cache("bad").await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_max_entries_evicts_least_recently_used() {
        let cache = ImageCache::with_policy(counting(Vec::new()), Box::new(MaxEntries(2)));
        let image = Arc::new(RgbaImage::new(1, 1));
        cache.set_image("a", image.clone());
        std::thread::sleep(Duration::from_millis(2));
        cache.set_image("b", image.clone());
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.get_image("a").is_some());
        std::thread::sleep(Duration::from_millis(2));
        cache.set_image("c", image);

        assert!(cache.has_image("a"));
        assert!(!cache.has_image("b"));
        assert!(cache.has_image("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_expiring_policy() {
        let policy = Expiring(Duration::from_secs(60));
        let mut entries = HashMap::new();
        entries.insert("fresh".to_string(), CacheEntry::new(Arc::new(RgbaImage::new(1, 1))));
        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(policy.victims(&entries, later), vec!["fresh".to_string()]);
        assert!(policy.victims(&entries, Instant::now()).is_empty());
    }

    #[test]
    fn test_evict_on_demand() {
        let cache = ImageCache::with_policy(counting(Vec::new()), Box::new(Expiring(Duration::ZERO)));
        cache.set_image("a", Arc::new(RgbaImage::new(1, 1)));
        // Zero ttl: the insert itself already evicted.
        assert!(cache.is_empty());
        assert_eq!(cache.evict(), 0);
    }
}
