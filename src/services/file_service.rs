use crate::api::client::Connection;
use crate::api::error::{AppError, Result};
use crate::infrastructure::media::MediaUrlResolver;
use crate::models::{Attributes, FileRecord, ImageSize, MODEL_NAME, RESOLVABLE_FIELD};
use crate::services::dimensions::DimensionProbe;
use crate::services::persistence::{FileEndpoints, PersistenceAdapter};
use crate::services::query::FileQuery;
use crate::services::upload::{UploadSource, plan_upload};
use std::sync::Arc;

/// Reads, writes and uploads file records.
///
/// Every call is awaited to completion before the next one starts; records are
/// borrowed mutably for the duration of any call that may change them.
pub struct FileService {
    connection: Arc<dyn Connection>,
    persistence: Arc<dyn PersistenceAdapter>,
    probe: Arc<dyn DimensionProbe>,
    media: Arc<dyn MediaUrlResolver>,
    query: FileQuery,
}

impl FileService {
    pub fn new(
        connection: Arc<dyn Connection>,
        probe: Arc<dyn DimensionProbe>,
        media: Arc<dyn MediaUrlResolver>,
    ) -> Self {
        Self {
            persistence: Arc::new(FileEndpoints::new(connection.clone())),
            query: FileQuery::new(connection.clone()),
            connection,
            probe,
            media,
        }
    }

    pub fn url(&self, record: &FileRecord, preset: Option<&str>) -> Option<String> {
        record.url(self.media.as_ref(), preset)
    }

    /// `Ok(None)` when the backend reports the record missing
    pub async fn find(&self, id: u64) -> Result<Option<FileRecord>> {
        match self.persistence.retrieve(None, id).await {
            Ok(attributes) => FileRecord::from_attributes(attributes).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn find_or_fail(&self, id: u64) -> Result<FileRecord> {
        self.find(id).await?.ok_or_else(|| AppError::NotFound {
            model: MODEL_NAME,
            values: vec![id.to_string()],
        })
    }

    pub async fn where_first(&self, field: &str, value: &str) -> Result<Option<FileRecord>> {
        self.query
            .first_where(field, value)
            .await?
            .map(FileRecord::from_attributes)
            .transpose()
    }

    /// Binds a raw route value to a record, looking it up by `field`
    /// (the resolvable field, `id`, when not given)
    pub async fn resolve_route_binding(
        &self,
        raw_value: &str,
        field: Option<&str>,
    ) -> Result<FileRecord> {
        let field = field.unwrap_or(RESOLVABLE_FIELD);

        self.where_first(field, raw_value)
            .await?
            .ok_or_else(|| AppError::NotFound {
                model: MODEL_NAME,
                values: vec![raw_value.to_string()],
            })
    }

    /// Inserts or updates the record.
    ///
    /// A fresh insert also resolves the record's resolution, which may probe
    /// the asset and issue a follow-up update.
    pub async fn save(&self, record: &mut FileRecord) -> Result<()> {
        let inserted = self.store(record).await?;
        if inserted {
            self.resolve_resolution(record).await?;
        }
        Ok(())
    }

    /// Persists pending changes. Returns true when the record was inserted.
    async fn store(&self, record: &mut FileRecord) -> Result<bool> {
        let changes = record.changes();

        match record.id() {
            Some(id) => {
                if changes.is_empty() {
                    return Ok(false);
                }
                tracing::debug!("Updating file {} ({} changed attributes)", id, changes.len());
                self.persistence.update(None, id, &changes).await?;
                record.sync_original();
                Ok(false)
            }
            None => {
                let response = self.persistence.insert(None, &changes).await?;
                record.absorb(response)?;
                tracing::info!("Created file {:?}", record.id());
                Ok(true)
            }
        }
    }

    /// Deletes the record backend-side. Unsaved records are left alone.
    pub async fn delete(&self, record: &FileRecord) -> Result<bool> {
        match record.id() {
            Some(id) => {
                tracing::info!("Deleting file {}", id);
                self.persistence.delete(None, id).await
            }
            None => Ok(false),
        }
    }

    /// Reloads the record's attributes from the backend
    pub async fn refresh(&self, record: &mut FileRecord) -> Result<()> {
        let id = record.id().ok_or_else(|| {
            AppError::invalid_argument("Cannot refresh a file that has not been saved")
        })?;

        let attributes = self.persistence.retrieve(None, id).await?;
        record.absorb(attributes)
    }

    /// Stored image width, probing the asset and saving the record when unknown
    pub async fn resolve_image_width(&self, record: &mut FileRecord) -> Result<Option<u32>> {
        if let Some(width) = record.image_width() {
            return Ok(Some(width));
        }

        let Some(size) = self.resolve_dimensions(record).await else {
            return Ok(None);
        };

        record.set_image_width(Some(size.width));
        self.store(record).await?;
        Ok(Some(size.width))
    }

    /// Stored image height, probing the asset and saving the record when unknown
    pub async fn resolve_image_height(&self, record: &mut FileRecord) -> Result<Option<u32>> {
        if let Some(height) = record.image_height() {
            return Ok(Some(height));
        }

        let Some(size) = self.resolve_dimensions(record).await else {
            return Ok(None);
        };

        record.set_image_height(Some(size.height));
        self.store(record).await?;
        Ok(Some(size.height))
    }

    /// Like [`FileRecord::resolution`], resolving missing dimensions first
    pub async fn resolve_resolution(&self, record: &mut FileRecord) -> Result<String> {
        if record.img_res.is_none() {
            self.resolve_image_width(record).await?;
            self.resolve_image_height(record).await?;
        }
        Ok(record.resolution())
    }

    /// Probes the asset once per record instance. Failures are logged and
    /// remembered as "no dimensions".
    async fn resolve_dimensions(&self, record: &mut FileRecord) -> Option<ImageSize> {
        if let Some(cached) = record.cached_dimensions() {
            return cached;
        }

        let url = self.url(record, None)?;
        let resolved = match self.probe.probe(&url).await {
            Ok(size) => Some(size),
            Err(e) => {
                tracing::warn!("Could not resolve dimensions of {}: {}", url, e);
                None
            }
        };

        record.remember_dimensions(resolved);
        resolved
    }

    /// Uploads `source` as a new file in `folder` (or the folder named by
    /// `attributes`, or the source record's folder, or the root folder)
    pub async fn upload(
        &self,
        source: impl Into<UploadSource>,
        attributes: Attributes,
        folder: Option<u64>,
    ) -> Result<FileRecord> {
        let plan = plan_upload(source.into(), attributes, folder, self.media.as_ref())?;

        tracing::info!(
            "Uploading to folder {} via {} endpoint",
            plan.folder,
            plan.strategy()
        );

        plan.execute(self.connection.as_ref()).await
    }
}
