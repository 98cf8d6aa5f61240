pub mod casts;
pub mod tags;

pub use tags::Tags;

use crate::api::error::Result;
use crate::infrastructure::media::MediaUrlResolver;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Attributes = Map<String, Value>;

/// Model name reported in lookup failures
pub const MODEL_NAME: &str = "File";

/// Field used to bind a raw route value to a record
pub const RESOLVABLE_FIELD: &str = "id";

/// Attributes the backend owns; never sent in insert or update payloads
const READ_ONLY: &[&str] = &["id", "path"];

/// Pixel dimensions of an image asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// A stored asset and its metadata, keyed by the backend's wire names
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(
        default,
        deserialize_with = "casts::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<u64>,

    #[serde(default, deserialize_with = "casts::opt_number")]
    pub folder_id: Option<u64>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    path: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub tags: Tags,

    #[serde(default, deserialize_with = "casts::number")]
    pub size: u64,

    #[serde(rename = "type", default)]
    pub mime_type: String,

    #[serde(default, with = "casts::datetime")]
    pub created: Option<NaiveDateTime>,

    #[serde(rename = "userid", default, deserialize_with = "casts::number")]
    pub user_id: i64,

    #[serde(default, deserialize_with = "casts::flag")]
    pub public: bool,

    #[serde(default, deserialize_with = "casts::number_list")]
    pub related_entries: Vec<u64>,

    #[serde(default, deserialize_with = "casts::number_list")]
    pub related_customers: Vec<u64>,

    #[serde(default, deserialize_with = "casts::opt_number")]
    img_width: Option<u32>,

    #[serde(default, deserialize_with = "casts::opt_number")]
    img_height: Option<u32>,

    #[serde(default)]
    pub img_res: Option<String>,

    #[serde(default, deserialize_with = "casts::opt_number")]
    pub img_lat: Option<f64>,

    #[serde(default, deserialize_with = "casts::opt_number")]
    pub img_lon: Option<f64>,

    #[serde(default)]
    pub img_artist: Option<String>,

    #[serde(default)]
    pub img_desc: Option<String>,

    #[serde(default)]
    pub img_alt: Option<String>,

    #[serde(default, with = "casts::datetime")]
    pub img_o_date: Option<NaiveDateTime>,

    #[serde(default)]
    pub foldercode: String,

    /// Attributes this model has no field for, kept for round-trips
    #[serde(flatten)]
    extra: Attributes,

    #[serde(skip)]
    original: Option<Attributes>,

    #[serde(skip)]
    resolved_dimensions: Option<Option<ImageSize>>,
}

type Accessor = fn(&FileRecord) -> Value;

/// Virtual attributes, computed on read
const DERIVED: &[(&str, Accessor)] = &[
    ("extension", |r: &FileRecord| r.extension().map(Value::from).unwrap_or(Value::Null)),
    ("resolution", |r: &FileRecord| Value::from(r.resolution())),
    ("width", |r: &FileRecord| r.width().map(Value::from).unwrap_or(Value::Null)),
    ("height", |r: &FileRecord| r.height().map(Value::from).unwrap_or(Value::Null)),
];

impl FileRecord {
    /// An unsaved record
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Hydrates a record from a raw attribute mapping returned by the API
    pub fn from_attributes(attributes: Value) -> Result<Self> {
        let mut record: FileRecord = serde_json::from_value(attributes)?;
        record.sync_original();
        Ok(record)
    }

    pub fn to_attributes(&self) -> Attributes {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Attributes::new(),
        }
    }

    /// Backend-assigned identifier, absent until the first insert
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Server-relative asset path
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Everything after the last dot of the path's basename, with a leading
    /// dot: `.jpg`, and `.htaccess` for a dotfile. `None` without a suffix
    /// or when the suffix is `0`.
    pub fn extension(&self) -> Option<String> {
        let basename = self.path()?.trim_end_matches('/').rsplit('/').next()?;
        let (_, ext) = basename.rsplit_once('.')?;

        match ext {
            "" | "0" => None,
            ext => Some(format!(".{}", ext)),
        }
    }

    pub fn image_width(&self) -> Option<u32> {
        self.img_width
    }

    pub fn image_height(&self) -> Option<u32> {
        self.img_height
    }

    pub fn set_image_width(&mut self, width: Option<u32>) {
        self.img_width = width;
    }

    pub fn set_image_height(&mut self, height: Option<u32>) {
        self.img_height = height;
    }

    pub fn width(&self) -> Option<u32> {
        self.image_width()
    }

    pub fn height(&self) -> Option<u32> {
        self.image_height()
    }

    pub fn set_width(&mut self, width: Option<u32>) {
        self.set_image_width(width);
    }

    pub fn set_height(&mut self, height: Option<u32>) {
        self.set_image_height(height);
    }

    /// `img_res` when present, else `{width}x{height}` from the stored values.
    /// Unknown dimensions render as empty strings.
    pub fn resolution(&self) -> String {
        if let Some(res) = &self.img_res {
            return res.clone();
        }

        let show = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_default();
        format!("{}x{}", show(self.img_width), show(self.img_height))
    }

    pub fn set_tags(&mut self, tags: impl Into<Tags>) {
        self.tags = tags.into();
    }

    /// Reads an attribute by wire name, answering virtual attributes too
    pub fn attribute(&self, key: &str) -> Value {
        if let Some((_, accessor)) = DERIVED.iter().find(|(name, _)| *name == key) {
            return accessor(self);
        }

        self.to_attributes().remove(key).unwrap_or(Value::Null)
    }

    /// Canonical asset URL, or a preset rendering of it
    pub fn url(&self, media: &dyn MediaUrlResolver, preset: Option<&str>) -> Option<String> {
        let path = self.path().filter(|p| !p.is_empty())?;
        Some(match preset {
            Some(preset) => media.media_url(path, preset),
            None => media.cdn_url(path),
        })
    }

    /// Attributes changed since hydration or the last save.
    /// For an unsaved record: everything set away from its default.
    pub fn changes(&self) -> Attributes {
        let baseline = match &self.original {
            Some(original) => original.clone(),
            None => FileRecord::default().to_attributes(),
        };

        self.to_attributes()
            .into_iter()
            .filter(|(key, _)| !READ_ONLY.contains(&key.as_str()))
            .filter(|(key, value)| baseline.get(key) != Some(value))
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        !self.changes().is_empty()
    }

    /// Marks the current state as persisted
    pub fn sync_original(&mut self) {
        self.original = Some(self.to_attributes());
    }

    pub(crate) fn cached_dimensions(&self) -> Option<Option<ImageSize>> {
        self.resolved_dimensions
    }

    pub(crate) fn remember_dimensions(&mut self, size: Option<ImageSize>) {
        self.resolved_dimensions = Some(size);
    }

    /// Overlays an API response onto the current attributes, keeping the probe memo
    pub(crate) fn absorb(&mut self, response: Value) -> Result<()> {
        let mut attributes = self.to_attributes();
        if let Value::Object(map) = response {
            attributes.extend(map);
        }

        let memo = self.resolved_dimensions;
        *self = FileRecord::from_attributes(Value::Object(attributes))?;
        self.resolved_dimensions = memo;
        Ok(())
    }
}
