use crate::api::client::Connection;
use crate::api::error::{AppError, Result};
use serde_json::Value;
use std::sync::Arc;

/// Field lookups through the search endpoint, scoped to one relation
pub struct FileQuery {
    connection: Arc<dyn Connection>,
    relation: &'static str,
}

impl FileQuery {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            relation: "file",
        }
    }

    pub fn search_path(&self, field: &str, value: &str, size: usize) -> Result<String> {
        let query = format!("{}:\"{}\"", field, value.replace('"', "\\\""));
        let size = size.to_string();
        let params = serde_urlencoded::to_string([
            ("relation", self.relation),
            ("q", query.as_str()),
            ("size", size.as_str()),
        ])
        .map_err(|e| AppError::Internal(format!("Failed to encode query: {}", e)))?;

        Ok(format!("search?{}", params))
    }

    /// Raw attributes of the first record whose `field` equals `value`
    pub async fn first_where(&self, field: &str, value: &str) -> Result<Option<Value>> {
        let path = self.search_path(field, value, 1)?;
        let response = self.connection.get(&path, false).await?;

        let hits = match response {
            Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
            other => other,
        };

        match hits {
            Value::Array(items) => Ok(items.into_iter().next()),
            Value::Null => Ok(None),
            other => Err(AppError::Internal(format!(
                "Unexpected search response: {}",
                other
            ))),
        }
    }
}
