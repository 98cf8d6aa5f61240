use crate::api::client::Connection;
use crate::api::error::Result;
use crate::models::Attributes;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// CRUD transport for one resource type.
///
/// `relation_id` scopes nested resources; flat resources ignore it.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn retrieve(&self, relation_id: Option<u64>, key: u64) -> Result<Value>;

    async fn insert(&self, relation_id: Option<u64>, attributes: &Attributes) -> Result<Value>;

    async fn update(&self, relation_id: Option<u64>, key: u64, attributes: &Attributes)
    -> Result<()>;

    async fn delete(&self, relation_id: Option<u64>, key: u64) -> Result<bool>;
}

/// `files/file` endpoints
pub struct FileEndpoints {
    connection: Arc<dyn Connection>,
}

impl FileEndpoints {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self { connection }
    }

    fn record_path(key: u64) -> String {
        format!("files/file/{}", key)
    }
}

#[async_trait]
impl PersistenceAdapter for FileEndpoints {
    async fn retrieve(&self, _relation_id: Option<u64>, key: u64) -> Result<Value> {
        self.connection.get(&Self::record_path(key), true).await
    }

    async fn insert(&self, _relation_id: Option<u64>, attributes: &Attributes) -> Result<Value> {
        self.connection
            .post("files/file/", &Value::Object(attributes.clone()), true)
            .await
    }

    async fn update(
        &self,
        _relation_id: Option<u64>,
        key: u64,
        attributes: &Attributes,
    ) -> Result<()> {
        self.connection
            .put(&Self::record_path(key), &Value::Object(attributes.clone()))
            .await
    }

    async fn delete(&self, _relation_id: Option<u64>, key: u64) -> Result<bool> {
        self.connection.delete(&Self::record_path(key)).await?;
        Ok(true)
    }
}
