#![allow(dead_code)]

use async_trait::async_trait;
use cms_files::AppError;
use cms_files::api::client::{Connection, unwrap_envelope};
use cms_files::api::error::Result;
use cms_files::api::multipart::{FileContent, MultipartPayload, Part};
use cms_files::infrastructure::media::CdnUrlBuilder;
use cms_files::models::ImageSize;
use cms_files::services::dimensions::DimensionProbe;
use cms_files::services::file_service::FileService;
use bytes::Bytes;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CDN: &str = "https://cdn.example.com";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get { path: String, unwrap: bool },
    Post { path: String, body: Value, unwrap: bool },
    Put { path: String, body: Value },
    Delete { path: String },
    Multipart {
        path: String,
        files: Vec<SentFile>,
        fields: Vec<(String, String)>,
    },
}

/// A binary part as it went over the wire
#[derive(Debug, Clone, PartialEq)]
pub struct SentFile {
    pub name: String,
    pub filename: String,
    pub mime: String,
    pub content: Bytes,
    pub streamed: bool,
}

pub fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Records every request and answers from canned responses.
/// Unknown GETs answer 404; unknown POSTs echo the body with an id.
pub struct MockConnection {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, StatusCode>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Makes `method path` answer with an error status
    pub fn fail(&self, method: &str, path: &str, status: StatusCode) {
        self.failures
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, path), status);
    }

    pub fn respond(&self, method: &str, path: &str, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, path), body);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Put { path, body } => Some((path, body)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, method: &str, path: &str) -> Result<()> {
        match self.failures.lock().unwrap().get(&format!("{} {}", method, path)) {
            Some(status) => Err(AppError::Api {
                status: *status,
                message: format!("{} {} failed", method, path),
            }),
            None => Ok(()),
        }
    }

    fn canned(&self, method: &str, path: &str) -> Option<Value> {
        self.responses
            .lock()
            .unwrap()
            .get(&format!("{} {}", method, path))
            .cloned()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn get(&self, path: &str, unwrap: bool) -> Result<Value> {
        self.record(Call::Get {
            path: path.to_string(),
            unwrap,
        });
        self.check("GET", path)?;

        match self.canned("GET", path) {
            Some(body) if unwrap => Ok(unwrap_envelope(body)),
            Some(body) => Ok(body),
            None => Err(AppError::Api {
                status: StatusCode::NOT_FOUND,
                message: "Not found".to_string(),
            }),
        }
    }

    async fn post(&self, path: &str, body: &Value, unwrap: bool) -> Result<Value> {
        self.record(Call::Post {
            path: path.to_string(),
            body: body.clone(),
            unwrap,
        });
        self.check("POST", path)?;

        let response = self.canned("POST", path).unwrap_or_else(|| {
            let mut echo = body.clone();
            echo["id"] = json!(100);
            echo
        });
        Ok(if unwrap { unwrap_envelope(response) } else { response })
    }

    async fn put(&self, path: &str, body: &Value) -> Result<()> {
        self.record(Call::Put {
            path: path.to_string(),
            body: body.clone(),
        });
        self.check("PUT", path)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.record(Call::Delete {
            path: path.to_string(),
        });
        self.check("DELETE", path)
    }

    async fn post_multipart(&self, path: &str, payload: MultipartPayload) -> Result<Value> {
        let mut files = Vec::new();
        let mut fields = Vec::new();
        for part in payload.into_parts() {
            match part {
                Part::File {
                    name,
                    filename,
                    content,
                    mime,
                } => {
                    let streamed = matches!(content, FileContent::Stream { .. });
                    files.push(SentFile {
                        name,
                        filename,
                        mime,
                        content: content.into_bytes().await?,
                        streamed,
                    });
                }
                Part::Text { name, value } => fields.push((name, value)),
            }
        }

        self.record(Call::Multipart {
            path: path.to_string(),
            files,
            fields,
        });
        self.check("POST", path)?;

        Ok(self
            .canned("POST", path)
            .unwrap_or_else(|| json!({"id": 101, "path": "uploads/file.bin"})))
    }
}

/// Counts probes and answers with a fixed size, or fails when none is set
pub struct MockProbe {
    size: Option<ImageSize>,
    calls: AtomicUsize,
}

impl MockProbe {
    pub fn returning(width: u32, height: u32) -> Self {
        Self {
            size: Some(ImageSize { width, height }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            size: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DimensionProbe for MockProbe {
    async fn probe(&self, url: &str) -> anyhow::Result<ImageSize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(url.starts_with(CDN), "probe should use the cdn url, got {}", url);
        self.size
            .ok_or_else(|| anyhow::anyhow!("not an image: {}", url))
    }
}

pub fn setup_service(probe: MockProbe) -> (FileService, Arc<MockConnection>, Arc<MockProbe>) {
    let connection = Arc::new(MockConnection::new());
    let probe = Arc::new(probe);
    let media = Arc::new(CdnUrlBuilder::new(CDN, &format!("{}/media", CDN)));

    let service = FileService::new(connection.clone(), probe.clone(), media);
    (service, connection, probe)
}
