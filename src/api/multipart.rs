use bytes::Bytes;
use serde_json::Value;
use std::io::{self, SeekFrom};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Bytes read from the start of a file to sniff its mime type
const SNIFF_LEN: u64 = 8192;

/// Body of a binary part
#[derive(Debug)]
pub enum FileContent {
    Bytes(Bytes),
    /// Open handle, read while the request is being sent
    Stream { file: File, len: u64 },
}

impl FileContent {
    pub(crate) fn len(&self) -> u64 {
        match self {
            FileContent::Bytes(bytes) => bytes.len() as u64,
            FileContent::Stream { len, .. } => *len,
        }
    }

    /// Reads the whole content into memory
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        match self {
            FileContent::Bytes(bytes) => Ok(bytes),
            FileContent::Stream { mut file, len } => {
                let mut buf = Vec::with_capacity(len as usize);
                file.read_to_end(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
        }
    }

    fn into_body(self) -> reqwest::Body {
        match self {
            FileContent::Bytes(bytes) => reqwest::Body::from(bytes),
            FileContent::Stream { file, .. } => reqwest::Body::wrap_stream(ReaderStream::new(file)),
        }
    }
}

/// One field of a multipart/form-data request
#[derive(Debug)]
pub enum Part {
    File {
        name: String,
        filename: String,
        content: FileContent,
        mime: String,
    },
    Text {
        name: String,
        value: String,
    },
}

impl Part {
    pub fn name(&self) -> &str {
        match self {
            Part::File { name, .. } | Part::Text { name, .. } => name,
        }
    }
}

/// Ordered multipart body, independent of the HTTP client that sends it
#[derive(Debug, Default)]
pub struct MultipartPayload {
    parts: Vec<Part>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an in-memory binary part. The mime type is sniffed from the content.
    pub fn file(mut self, name: &str, filename: &str, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let mime = sniff_mime(&content);

        self.parts.push(Part::File {
            name: name.to_string(),
            filename: filename.to_string(),
            content: FileContent::Bytes(content),
            mime,
        });
        self
    }

    /// Adds an open file as a streamed part. Only the first bytes are read
    /// here, to sniff the mime type; the handle is rewound afterwards.
    pub async fn stream(mut self, name: &str, filename: &str, mut file: File) -> io::Result<Self> {
        let len = file.metadata().await?.len();

        let mut head = Vec::with_capacity(SNIFF_LEN as usize);
        (&mut file).take(SNIFF_LEN).read_to_end(&mut head).await?;
        file.seek(SeekFrom::Start(0)).await?;

        self.parts.push(Part::File {
            name: name.to_string(),
            filename: filename.to_string(),
            content: FileContent::Stream { file, len },
            mime: sniff_mime(&head),
        });
        Ok(self)
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// Adds an attribute value as its own text field
    pub fn field(self, name: &str, value: &Value) -> Self {
        self.text(name, scalar_encode(value))
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    pub fn get(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name() == name)
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Part::Text { value, .. } => Some(value),
            Part::File { .. } => None,
        }
    }

    pub fn into_form(self) -> reqwest::Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part {
                Part::File {
                    name,
                    filename,
                    content,
                    mime,
                } => {
                    let len = content.len();
                    let part = reqwest::multipart::Part::stream_with_length(content.into_body(), len)
                        .file_name(filename)
                        .mime_str(&mime)?;
                    form.part(name, part)
                }
                Part::Text { name, value } => form.text(name, value),
            };
        }
        Ok(form)
    }
}

fn sniff_mime(head: &[u8]) -> String {
    infer::get(head)
        .map(|k| k.mime_type().to_string())
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
}

/// Encodes an attribute value the way form fields carry scalars
pub fn scalar_encode(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        other => other.to_string(),
    }
}
