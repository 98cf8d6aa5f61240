pub mod media;

use crate::api::client::ApiClient;
use crate::config::ClientConfig;
use crate::services::dimensions::HttpImageProbe;
use crate::services::file_service::FileService;
use media::CdnUrlBuilder;
use std::sync::Arc;
use tracing::info;

/// Wires the HTTP client, image probe and URL builder into a `FileService`
pub fn setup_files(config: &ClientConfig) -> anyhow::Result<FileService> {
    info!(
        "API: {} (authenticated: {})",
        config.api_url,
        config.credentials().is_some()
    );

    let connection = Arc::new(ApiClient::new(config)?);
    let probe = Arc::new(HttpImageProbe::new(config)?);
    let media = Arc::new(CdnUrlBuilder::from_config(config));

    Ok(FileService::new(connection, probe, media))
}
