use std::env;

/// Connection settings for the content-management API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API (default: "https://api.netflexapp.com/v1/")
    pub api_url: String,

    /// Public API key, sent as the basic auth user
    pub public_key: Option<String>,

    /// Private API key, sent as the basic auth password
    pub private_key: Option<String>,

    /// Base URL assets are served from
    pub cdn_url: String,

    /// Base URL for preset-rendered media (default: `{cdn_url}/media`)
    pub media_url: String,

    /// Request timeout for API calls in seconds (default: 30)
    pub timeout_secs: u64,

    /// Timeout for fetching an asset to read its dimensions (default: 10)
    pub probe_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.netflexapp.com/v1/".to_string(),
            public_key: None,
            private_key: None,
            cdn_url: "https://cdn.netflexapp.com".to_string(),
            media_url: "https://cdn.netflexapp.com/media".to_string(),
            timeout_secs: 30,
            probe_timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();
        let cdn_url = env::var("CMS_CDN_URL").unwrap_or(default.cdn_url);

        Self {
            api_url: env::var("CMS_API_URL").unwrap_or(default.api_url),

            public_key: env::var("CMS_PUBLIC_KEY").ok().filter(|v| !v.is_empty()),

            private_key: env::var("CMS_PRIVATE_KEY").ok().filter(|v| !v.is_empty()),

            media_url: env::var("CMS_MEDIA_URL")
                .unwrap_or_else(|_| format!("{}/media", cdn_url.trim_end_matches('/'))),

            cdn_url,

            timeout_secs: env::var("CMS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.timeout_secs),

            probe_timeout_secs: env::var("CMS_PROBE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.probe_timeout_secs),
        }
    }

    /// Config for a locally running API (no credentials, short timeouts)
    pub fn development() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/v1/".to_string(),
            public_key: None,
            private_key: None,
            cdn_url: "http://127.0.0.1:8080/cdn".to_string(),
            media_url: "http://127.0.0.1:8080/cdn/media".to_string(),
            timeout_secs: 5,
            probe_timeout_secs: 5,
        }
    }

    /// Basic auth credentials, when both keys are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.public_key, &self.private_key) {
            (Some(public), Some(private)) => Some((public.as_str(), private.as_str())),
            _ => None,
        }
    }
}
