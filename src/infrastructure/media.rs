use crate::config::ClientConfig;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left as-is in a preset path segment
const PRESET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Builds public URLs for stored asset paths
pub trait MediaUrlResolver: Send + Sync {
    /// Canonical, unprocessed URL of the asset
    fn cdn_url(&self, path: &str) -> String;

    /// URL of the asset rendered through a named preset
    fn media_url(&self, path: &str, preset: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct CdnUrlBuilder {
    cdn_url: String,
    media_url: String,
}

impl CdnUrlBuilder {
    pub fn new(cdn_url: &str, media_url: &str) -> Self {
        Self {
            cdn_url: cdn_url.trim_end_matches('/').to_string(),
            media_url: media_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.cdn_url, &config.media_url)
    }
}

impl MediaUrlResolver for CdnUrlBuilder {
    fn cdn_url(&self, path: &str) -> String {
        format!("{}/{}", self.cdn_url, path.trim_start_matches('/'))
    }

    fn media_url(&self, path: &str, preset: &str) -> String {
        format!(
            "{}/{}/{}",
            self.media_url,
            utf8_percent_encode(preset, PRESET),
            path.trim_start_matches('/')
        )
    }
}
