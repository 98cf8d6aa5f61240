use crate::api::client::Connection;
use crate::api::error::{AppError, Result};
use crate::api::multipart::MultipartPayload;
use crate::infrastructure::media::MediaUrlResolver;
use crate::models::{Attributes, FileRecord, Tags};
use crate::utils::validation::{is_absolute_url, url_basename};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Metadata copied from a source record unless the caller overrides it
const INHERITED: &[&str] = &[
    "tags",
    "description",
    "title",
    "size",
    "img_width",
    "img_height",
    "img_artist",
    "img_o_date",
    "img_desc",
];

/// A file on local disk, uploaded as a multipart stream
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFile {
    path: PathBuf,
    client_name: String,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let client_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, client_name }
    }

    /// Overrides the name the file was originally submitted under
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }
}

/// What to upload
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Copy of an already stored file, fetched by the backend from its URL
    Existing(Box<FileRecord>),
    Local(LocalFile),
    /// Remote asset the backend should fetch
    Url(String),
    /// Base64 encoded file content
    Raw(String),
    /// Input of a kind no endpoint accepts
    Unsupported(String),
}

impl UploadSource {
    /// URL when the text is an absolute URL, raw content otherwise
    pub fn from_string(input: impl Into<String>) -> Self {
        let input = input.into();
        if is_absolute_url(&input) {
            UploadSource::Url(input)
        } else {
            UploadSource::Raw(input)
        }
    }

    /// Classifies dynamic input; only strings are uploadable
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Self::from_string(s),
            Value::Null => UploadSource::Unsupported("null".to_string()),
            Value::Bool(_) => UploadSource::Unsupported("boolean".to_string()),
            Value::Number(_) => UploadSource::Unsupported("number".to_string()),
            Value::Array(_) => UploadSource::Unsupported("array".to_string()),
            Value::Object(_) => UploadSource::Unsupported("object".to_string()),
        }
    }

    pub fn base64(bytes: impl AsRef<[u8]>) -> Self {
        UploadSource::Raw(STANDARD.encode(bytes))
    }
}

impl From<FileRecord> for UploadSource {
    fn from(record: FileRecord) -> Self {
        UploadSource::Existing(Box::new(record))
    }
}

impl From<LocalFile> for UploadSource {
    fn from(file: LocalFile) -> Self {
        UploadSource::Local(file)
    }
}

impl From<&str> for UploadSource {
    fn from(input: &str) -> Self {
        UploadSource::from_string(input)
    }
}

impl From<String> for UploadSource {
    fn from(input: String) -> Self {
        UploadSource::from_string(input)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadBody {
    /// Fields sent next to the streamed file part
    Multipart {
        file: LocalFile,
        filename: String,
        fields: Attributes,
    },
    Json(Attributes),
}

/// Endpoint and payload chosen for an upload, before any I/O happens
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPlan {
    pub folder: u64,
    pub endpoint: String,
    pub body: UploadBody,
}

impl UploadPlan {
    pub fn strategy(&self) -> &'static str {
        match &self.body {
            UploadBody::Multipart { .. } => "file",
            UploadBody::Json(attributes) if attributes.contains_key("link") => "link",
            UploadBody::Json(_) => "base64",
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match &self.body {
            UploadBody::Multipart { fields, .. } => fields,
            UploadBody::Json(attributes) => attributes,
        }
    }

    /// Performs the single request the plan describes and hydrates the result
    pub async fn execute(self, connection: &dyn Connection) -> Result<FileRecord> {
        let response = match self.body {
            UploadBody::Multipart {
                file,
                filename,
                fields,
            } => {
                let handle = tokio::fs::File::open(file.path()).await?;
                let payload = MultipartPayload::new()
                    .stream("file", &filename, handle)
                    .await?;
                let payload = fields
                    .iter()
                    .fold(payload, |payload, (key, value)| payload.field(key, value));
                connection.post_multipart(&self.endpoint, payload).await?
            }
            UploadBody::Json(attributes) => {
                connection
                    .post(&self.endpoint, &Value::Object(attributes), true)
                    .await?
            }
        };

        FileRecord::from_attributes(response)
    }
}

/// Picks the upload endpoint and shapes its payload.
///
/// Fails with `InvalidArgument` for unsupported sources and for base64
/// content without a `filename`; nothing is sent in either case.
pub fn plan_upload(
    source: UploadSource,
    mut attributes: Attributes,
    folder: Option<u64>,
    media: &dyn MediaUrlResolver,
) -> Result<UploadPlan> {
    let mut folder = match folder {
        Some(folder) => Some(folder),
        None => folder_from(&attributes)?,
    };

    let source = match source {
        UploadSource::Existing(record) => {
            folder = folder.or(record.folder_id);
            inherit_metadata(&mut attributes, &record);

            match record.url(media, None) {
                Some(url) => UploadSource::Url(url),
                None => UploadSource::Unsupported("file without a path".to_string()),
            }
        }
        other => other,
    };

    let folder = folder.unwrap_or(0);
    let base = format!("files/folder/{}", folder);

    // Creation payloads carry the display name under this key
    if let Some(name) = attributes.remove("name") {
        attributes.insert("filenamename".to_string(), name);
    }

    let (endpoint, body) = match source {
        UploadSource::Local(file) => {
            let filename = string_attribute(&attributes, "filename")
                .unwrap_or_else(|| file.client_name().to_string());
            (
                format!("{}/file", base),
                UploadBody::Multipart {
                    file,
                    filename,
                    fields: attributes,
                },
            )
        }
        UploadSource::Url(link) => {
            if !attributes.contains_key("filename") {
                if let Some(basename) = url_basename(&link) {
                    attributes.insert("filename".to_string(), Value::String(basename));
                }
            }
            attributes.insert("link".to_string(), Value::String(link));
            (format!("{}/link", base), UploadBody::Json(attributes))
        }
        UploadSource::Raw(content) => {
            attributes.insert("file".to_string(), Value::String(content));
            if !attributes.contains_key("filename") {
                return Err(AppError::invalid_argument(
                    "Name is required when uploading a base64 encoded file",
                ));
            }
            (format!("{}/base64", base), UploadBody::Json(attributes))
        }
        UploadSource::Existing(_) | UploadSource::Unsupported(_) => {
            return Err(AppError::invalid_argument("Invalid file type"));
        }
    };

    Ok(UploadPlan {
        folder,
        endpoint,
        body,
    })
}

fn folder_from(attributes: &Attributes) -> Result<Option<u64>> {
    match attributes.get("folder_id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| AppError::invalid_argument(format!("Invalid folder id: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::invalid_argument(format!("Invalid folder id: {}", s))),
        Some(other) => Err(AppError::invalid_argument(format!(
            "Invalid folder id: {}",
            other
        ))),
    }
}

/// Fills inherited keys from the source record where the caller left them unset
fn inherit_metadata(attributes: &mut Attributes, record: &FileRecord) {
    let stored = record.to_attributes();

    for key in INHERITED {
        let explicit = attributes.get(*key).filter(|v| !v.is_null()).cloned();
        let value = match (*key, explicit) {
            ("tags", Some(tags)) => Value::String(Tags::from_value(&tags).joined()),
            ("tags", None) => Value::String(record.tags.joined()),
            (_, Some(value)) => value,
            (_, None) => stored.get(*key).cloned().unwrap_or(Value::Null),
        };
        attributes.insert(key.to_string(), value);
    }
}

fn string_attribute(attributes: &Attributes, key: &str) -> Option<String> {
    match attributes.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
