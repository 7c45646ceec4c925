//! # Error Types
//!
//! This module defines error types used throughout the laurel library.

use thiserror::Error;

/// Main error type for laurel operations
#[derive(Debug, Error)]
pub enum LaurelError {
    /// The draw was invoked without a drawing surface
    #[error("No drawing surface available for {0}")]
    MissingSurface(String),

    /// Malformed design input (canvas size, render scale, element data)
    #[error("Invalid design: {0}")]
    Design(String),

    /// Font loading or parsing error
    #[error("Font error: {0}")]
    Font(String),

    /// Image fetching or decoding error
    #[error("Image error: {0}")]
    Image(#[from] ImageLoadError),

    /// Raster encoding error (PNG, data URL)
    #[error("Encoding error: {0}")]
    Encode(String),

    /// Server-level errors (bind, serve)
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single image load.
///
/// Cloneable because every waiter on an in-flight decode receives the same
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageLoadError {
    /// The bytes could not be fetched
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The bytes were fetched but are not a decodable image
    #[error("failed to decode {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The decode task died before reporting a result
    #[error("decode task for {url} did not complete: {reason}")]
    Aborted { url: String, reason: String },
}

impl ImageLoadError {
    /// URL of the image that failed.
    pub fn url(&self) -> &str {
        match self {
            Self::Fetch { url, .. } | Self::Decode { url, .. } | Self::Aborted { url, .. } => url,
        }
    }
}
