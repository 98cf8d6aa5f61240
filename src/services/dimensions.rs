use crate::config::ClientConfig;
use crate::models::ImageSize;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::io::Cursor;
use std::time::Duration;

/// Reads the pixel dimensions of a remote asset
#[async_trait]
pub trait DimensionProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ImageSize>;
}

/// Upper bound on the bytes fetched before giving up on an asset
const MAX_PROBE_BYTES: usize = 4 * 1024 * 1024;

/// Fetches the asset over HTTP and reads just enough of it to size it
pub struct HttpImageProbe {
    client: reqwest::Client,
}

impl HttpImageProbe {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.probe_timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DimensionProbe for HttpImageProbe {
    async fn probe(&self, url: &str) -> Result<ImageSize> {
        tracing::debug!("Probing image dimensions of {}", url);

        let mut response = self.client.get(url).send().await?.error_for_status()?;
        let mut head = Vec::new();

        while let Some(chunk) = response.chunk().await? {
            head.extend_from_slice(&chunk);
            if let Ok(size) = image_size(&head) {
                return Ok(size);
            }
            if head.len() >= MAX_PROBE_BYTES {
                return Err(anyhow!("No image header within the first {} bytes", head.len()));
            }
        }

        image_size(&head)
    }
}

/// Dimensions from encoded image bytes, without decoding the pixels
pub fn image_size(bytes: &[u8]) -> Result<ImageSize> {
    let (width, height) = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| anyhow!("Not a readable image: {}", e))?;

    Ok(ImageSize { width, height })
}
