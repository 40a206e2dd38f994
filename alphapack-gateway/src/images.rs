//! Attachment image download and decode.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use tokio::sync::Semaphore;

/// Errors while turning an attachment URL into pixels.
///
/// These are always per-message: the pipeline records `Unknown` and moves on.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Image download failed: {0}")]
    Download(String),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Fetches raw image bytes for an attachment URL.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Vec<u8>, ImageError>;
}

/// HTTP image loader bounded by the process-wide download semaphore.
///
/// The semaphore caps simultaneous downloads across every in-flight user
/// task so a large request burst cannot saturate the network.
pub struct HttpImageLoader {
    client: reqwest::Client,
    limiter: Arc<Semaphore>,
}

impl HttpImageLoader {
    pub fn new(limiter: Arc<Semaphore>) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ImageError::Download(e.to_string()))?;

        Ok(Self { client, limiter })
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|_| ImageError::InvalidUrl(url.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            _ => return Err(ImageError::InvalidUrl(url.to_string())),
        }

        // Closed only on shutdown; a closed limiter reads as a failed
        // download for the one message being processed.
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ImageError::Download("download limiter closed".to_string()))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ImageError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageError::Download(format!(
                "status {} for {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Decode downloaded bytes into an image.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    Ok(image::load_from_memory(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"definitely not an image").is_err());
    }

    #[test]
    fn decode_accepts_png() {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .expect("encode");
        assert!(decode(&bytes).is_ok());
    }
}
