use crate::api::error::{AppError, Result};
use crate::api::multipart::MultipartPayload;
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

/// Authenticated transport to the content-management REST API.
///
/// `unwrap` asks for the response envelope to be stripped down to its `data`
/// payload when the backend wraps one.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn get(&self, path: &str, unwrap: bool) -> Result<Value>;

    async fn post(&self, path: &str, body: &Value, unwrap: bool) -> Result<Value>;

    async fn put(&self, path: &str, body: &Value) -> Result<()>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Raw multipart POST. The decoded body is returned as-is.
    async fn post_multipart(&self, path: &str, payload: MultipartPayload) -> Result<Value>;
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            credentials: config
                .credentials()
                .map(|(public, private)| (public.to_string(), private.to_string())),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        tracing::debug!("{} {}", method, url);

        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, mime::APPLICATION_JSON.as_ref());

        match &self.credentials {
            Some((public, private)) => builder.basic_auth(public, Some(private)),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        tracing::warn!("API responded {}: {}", status, message);
        Err(AppError::Api { status, message })
    }

    async fn decode(response: Response, unwrap: bool) -> Result<Value> {
        let body = Self::check(response).await?.bytes().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }

        let value: Value = serde_json::from_slice(&body)?;
        Ok(if unwrap { unwrap_envelope(value) } else { value })
    }
}

#[async_trait]
impl Connection for ApiClient {
    async fn get(&self, path: &str, unwrap: bool) -> Result<Value> {
        let response = self.request(Method::GET, path).send().await?;
        Self::decode(response, unwrap).await
    }

    async fn post(&self, path: &str, body: &Value, unwrap: bool) -> Result<Value> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::decode(response, unwrap).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<()> {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn post_multipart(&self, path: &str, payload: MultipartPayload) -> Result<Value> {
        let form = payload.into_form()?;
        let response = self
            .request(Method::POST, path)
            .multipart(form)
            .send()
            .await?;
        Self::decode(response, false).await
    }
}

/// Strips a `{"data": ...}` envelope; anything else passes through
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
