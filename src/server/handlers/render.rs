//! Render API handlers: PNG previews and cache keys.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::document::{Design, RenderData};
use crate::error::LaurelError;
use crate::render::DrawRequest;

use super::super::state::AppState;

/// Response header carrying the content hash of a preview.
pub const CACHE_KEY_HEADER: &str = "x-cache-key";

fn default_render_scale() -> f32 {
    1.0
}

/// Body of the render endpoints: a design plus how to draw it.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    #[serde(flatten)]
    pub design: Design,
    #[serde(default)]
    pub data: RenderData,
    #[serde(default)]
    pub show_debug_borders: bool,
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,
}

impl RenderRequest {
    fn draw_request(&self) -> DrawRequest<'_> {
        DrawRequest {
            elements: &self.design.elements,
            config: &self.design.config,
            data: &self.data,
            show_debug_borders: self.show_debug_borders,
            render_scale: self.render_scale,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    pub key: String,
    pub elapsed_us: u128,
}

/// Caller mistakes are 400s; everything else is a 500.
fn error_response(e: LaurelError) -> (StatusCode, String) {
    match e {
        LaurelError::Design(_) | LaurelError::Json(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Render failed: {}", other),
        ),
    }
}

/// Handle POST /api/render/preview - render a design as PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<RenderRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    req.design.normalize().map_err(error_response)?;
    let request = req.draw_request();
    let key = state.renderer.cache_key(&request).map_err(error_response)?.key;

    let png = match state.cached_frame(&key).await {
        Some(png) => {
            debug!("[cache] frame hit {}", key);
            png
        }
        None => {
            let frame = state.renderer.render_png(&request).await.map_err(error_response)?;
            info!(
                "rendered {}x{} preview ({} element(s))",
                frame.raster.width,
                frame.raster.height,
                req.design.elements.len()
            );
            if frame.is_complete() {
                state.store_frame(key.clone(), frame.raster.png).await
            } else {
                // Frames with failed images are never memoized.
                debug!(
                    "[cache] not storing frame {}: {} image(s) failed",
                    key,
                    frame.images.failed.len()
                );
                Arc::new(frame.raster.png)
            }
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::HeaderName::from_static(CACHE_KEY_HEADER), key),
        ],
        png.as_ref().clone(),
    ))
}

/// Handle POST /api/render/key - content hash of a design without drawing it.
pub async fn key(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<RenderRequest>,
) -> Result<Json<KeyResponse>, (StatusCode, String)> {
    req.design.normalize().map_err(error_response)?;
    let hash = state.renderer.cache_key(&req.draw_request()).map_err(error_response)?;
    Ok(Json(KeyResponse {
        key: hash.key,
        elapsed_us: hash.elapsed.as_micros(),
    }))
}
