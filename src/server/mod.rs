//! # HTTP Server for Certificate Previews
//!
//! Renders designs posted as JSON and returns PNG previews, memoized by
//! content hash.
//!
//! ## Usage
//!
//! ```bash
//! laurel serve --listen 0.0.0.0:8080 --fonts ./fonts
//! ```
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/render/preview` | PNG of the design; `x-cache-key` header carries its hash |
//! | `POST /api/render/key` | `{"key", "elapsed_us"}` without drawing |

mod handlers;
mod state;

pub use handlers::render::{CACHE_KEY_HEADER, RenderRequest};
pub use state::{AppState, ServerConfig};

use axum::{Router, extract::DefaultBodyLimit, routing::post};
use log::info;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LaurelError;
use crate::render::Renderer;
use state::FRAME_EXPIRATION_SECS;

/// Routes with their shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/render/preview", post(handlers::render::preview))
        .route("/api/render/key", post(handlers::render::key))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use laurel::assets::{DefaultImageSource, ImageCache};
/// use laurel::font::FontRegistry;
/// use laurel::options::RenderOptions;
/// use laurel::render::Renderer;
/// use laurel::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), laurel::error::LaurelError> {
/// let renderer = Renderer::new(
///     Arc::new(FontRegistry::default()),
///     ImageCache::new(Arc::new(DefaultImageSource::new()?)),
///     RenderOptions::default(),
/// );
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
/// };
///
/// serve(config, renderer).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig, renderer: Renderer) -> Result<(), LaurelError> {
    let app_state = Arc::new(AppState::new(config.clone(), renderer));

    // Spawn background cache cleanup task
    tokio::spawn(cleanup_caches(app_state.clone()));

    let app = router(app_state);

    info!("laurel HTTP server listening on {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            LaurelError::Transport(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| LaurelError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task to clean up expired frames and images.
async fn cleanup_caches(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(FRAME_EXPIRATION_SECS);

    loop {
        interval.tick().await;
        state.expire_frames(expiration).await;
        state.renderer.images().evict();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{FileImageSource, ImageCache};
    use crate::font::FontRegistry;
    use crate::options::RenderOptions;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const BODY: &str = r#"{
        "config": {"width": 200, "height": 100},
        "elements": [{
            "type": "text",
            "base": {"id": 1, "position_x": 10, "position_y": 10, "width": 180, "height": 30},
            "data_source": {"kind": "static", "value": "Preview"}
        }],
        "render_scale": 2
    }"#;

    fn state() -> Arc<AppState> {
        let renderer = Renderer::new(
            Arc::new(FontRegistry::default()),
            ImageCache::new(Arc::new(FileImageSource)),
            RenderOptions::default(),
        );
        Arc::new(AppState::new(
            ServerConfig {
                listen_addr: "127.0.0.1:0".to_string(),
            },
            renderer,
        ))
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_preview_returns_png_and_memoizes() {
        let state = state();
        let app = router(state.clone());

        let response = app.clone().oneshot(post("/api/render/preview", BODY)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
        let key = response.headers()[CACHE_KEY_HEADER].to_str().unwrap().to_string();
        assert_eq!(key.len(), 64);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (400, 200));
        assert_eq!(state.frames.read().await.len(), 1);

        let again = app.oneshot(post("/api/render/preview", BODY)).await.unwrap();
        assert_eq!(again.headers()[CACHE_KEY_HEADER], key.as_str());
        assert_eq!(state.frames.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_key_matches_preview_header() {
        let state = state();
        let app = router(state);

        let response = app.clone().oneshot(post("/api/render/key", BODY)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let preview = app.oneshot(post("/api/render/preview", BODY)).await.unwrap();
        assert_eq!(json["key"], preview.headers()[CACHE_KEY_HEADER].to_str().unwrap());
    }

    #[tokio::test]
    async fn test_invalid_design_is_bad_request() {
        let app = router(state());
        let body = r#"{"config": {"width": 0, "height": 100}, "elements": []}"#;
        let response = app.oneshot(post("/api/render/preview", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_preview_with_failed_image_is_not_memoized() {
        let path = std::env::temp_dir().join(format!("laurel-late-{}.png", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let body = format!(
            r#"{{
                "config": {{"width": 20, "height": 20}},
                "elements": [{{
                    "type": "image",
                    "base": {{"id": 1, "position_x": 0, "position_y": 0, "width": 20, "height": 20}},
                    "data_source": {{"image_url": "{}"}},
                    "image_props": {{"fit": "fill"}}
                }}]
            }}"#,
            path.to_string_lossy()
        );
        let state = state();
        let app = router(state.clone());

        let first = app.clone().oneshot(post("/api/render/preview", &body)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let bytes = to_bytes(first.into_body(), usize::MAX).await.unwrap();
        let image = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(image.get_pixel(10, 10).0[3], 0);
        assert_eq!(state.frames.read().await.len(), 0);

        image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 200, 0, 255]))
            .save(&path)
            .unwrap();

        let second = app.oneshot(post("/api/render/preview", &body)).await.unwrap();
        let bytes = to_bytes(second.into_body(), usize::MAX).await.unwrap();
        let image = image::load_from_memory(&bytes).unwrap().to_rgba8();
        let [r, g, _, a] = image.get_pixel(10, 10).0;
        assert!(r == 0 && g > 190 && a == 255, "got {:?}", image.get_pixel(10, 10).0);
        assert_eq!(state.frames.read().await.len(), 1);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_oversized_scale_is_bad_request() {
        let app = router(state());
        let body = r#"{"config": {"width": 800, "height": 600}, "elements": [], "render_scale": 10000000}"#;
        let response = app.oneshot(post("/api/render/preview", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_expire_frames() {
        let state = state();
        state.store_frame("k".to_string(), vec![1, 2, 3]).await;
        assert_eq!(state.expire_frames(Duration::from_secs(60)).await, 0);
        assert_eq!(state.expire_frames(Duration::ZERO).await, 1);
        assert!(state.cached_frame("k").await.is_none());
    }
}
