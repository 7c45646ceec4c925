//! Server state and configuration.

use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::render::Renderer;

/// Rendered frames not requested for this long are dropped.
pub const FRAME_EXPIRATION_SECS: u64 = 30 * 60;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
}

/// A rendered PNG keyed by its content hash.
#[derive(Debug, Clone)]
pub struct CachedFrame {
    png: Arc<Vec<u8>>,
    pub last_accessed: Instant,
}

impl CachedFrame {
    pub fn new(png: Vec<u8>) -> Self {
        Self {
            png: Arc::new(png),
            last_accessed: Instant::now(),
        }
    }

    /// Update last accessed time.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }

    pub fn png(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.png)
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub renderer: Renderer,
    /// Content hash → rendered frame.
    pub frames: RwLock<HashMap<String, CachedFrame>>,
}

impl AppState {
    pub fn new(config: ServerConfig, renderer: Renderer) -> Self {
        Self {
            config,
            renderer,
            frames: RwLock::new(HashMap::new()),
        }
    }

    pub async fn cached_frame(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        let mut frames = self.frames.write().await;
        frames.get_mut(key).map(|frame| {
            frame.touch();
            frame.png()
        })
    }

    pub async fn store_frame(&self, key: String, png: Vec<u8>) -> Arc<Vec<u8>> {
        let frame = CachedFrame::new(png);
        let png = frame.png();
        self.frames.write().await.insert(key, frame);
        png
    }

    /// Drop frames idle for `expiration` or longer; returns how many went.
    pub async fn expire_frames(&self, expiration: Duration) -> usize {
        let now = Instant::now();
        let mut frames = self.frames.write().await;
        let before = frames.len();
        frames.retain(|_, v| now.duration_since(v.last_accessed) < expiration);
        let removed = before - frames.len();
        if removed > 0 {
            debug!(
                "[cache] cleaned up {} expired frame(s) ({} remaining)",
                removed,
                frames.len()
            );
        }
        removed
    }
}
