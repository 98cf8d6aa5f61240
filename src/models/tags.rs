use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Ordered, de-duplicated set of non-empty tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits a comma separated list, dropping empty segments
    pub fn parse(input: &str) -> Self {
        input.split(',').collect()
    }

    pub fn push(&mut self, tag: impl AsRef<str>) {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !self.contains(tag) {
            self.0.push(tag.to_string());
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma joined form, as the upload endpoints expect it
    pub fn joined(&self) -> String {
        self.0.join(",")
    }

    /// Accepts either a comma separated string or an array of scalars
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Self::new(),
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for tag in iter {
            tags.push(tag);
        }
        tags
    }
}

impl From<&str> for Tags {
    fn from(input: &str) -> Self {
        Tags::parse(input)
    }
}

impl From<String> for Tags {
    fn from(input: String) -> Self {
        Tags::parse(&input)
    }
}

impl From<Vec<String>> for Tags {
    fn from(input: Vec<String>) -> Self {
        input.into_iter().collect()
    }
}

impl From<Vec<&str>> for Tags {
    fn from(input: Vec<&str>) -> Self {
        input.into_iter().collect()
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Tags::from_value(&value))
    }
}
