//! Where image bytes come from.

use async_trait::async_trait;
use log::debug;

use crate::error::{ImageLoadError, LaurelError};

/// Fetches the raw bytes behind an image URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageLoadError>;
}

fn fetch_error(url: &str, reason: impl ToString) -> ImageLoadError {
    ImageLoadError::Fetch {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// `http://` and `https://` URLs.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self, LaurelError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("laurel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LaurelError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageLoadError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| fetch_error(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(url, format!("HTTP {}", status)));
        }
        let bytes = response.bytes().await.map_err(|e| fetch_error(url, e))?;
        Ok(bytes.to_vec())
    }
}

/// Local paths, with or without a `file://` prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageSource;

#[async_trait]
impl ImageSource for FileImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageLoadError> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path).await.map_err(|e| fetch_error(url, e))
    }
}

/// Dispatches on the URL scheme: HTTP(S) goes to the network, anything else
/// is read from disk.
#[derive(Debug, Clone)]
pub struct DefaultImageSource {
    http: HttpImageSource,
    file: FileImageSource,
}

impl DefaultImageSource {
    pub fn new() -> Result<Self, LaurelError> {
        Ok(Self {
            http: HttpImageSource::new()?,
            file: FileImageSource,
        })
    }
}

#[async_trait]
impl ImageSource for DefaultImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageLoadError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.http.fetch(url).await
        } else {
            self.file.fetch(url).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_source_reads_with_and_without_scheme() {
        let path = std::env::temp_dir().join(format!("laurel-source-{}.bin", std::process::id()));
        std::fs::write(&path, b"bytes").unwrap();
        let plain = path.to_string_lossy().to_string();

        assert_eq!(FileImageSource.fetch(&plain).await.unwrap(), b"bytes");
        assert_eq!(FileImageSource.fetch(&format!("file://{}", plain)).await.unwrap(), b"bytes");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let err = FileImageSource.fetch("/definitely/not/here.png").await.unwrap_err();
        assert!(matches!(err, ImageLoadError::Fetch { .. }));
        assert_eq!(err.url(), "/definitely/not/here.png");
    }
}
