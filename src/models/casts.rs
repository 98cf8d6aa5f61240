//! Lenient attribute casts for values coming back from the API.
//!
//! The backend is loose about scalar types: ids and flags may arrive as
//! strings, dates use a space separated format.

use chrono::{DateTime, NaiveDateTime};
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt::Display;
use std::str::FromStr;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number or numeric string, `null`/`""` as `None`
pub fn opt_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromStr,
    <T as FromStr>::Err: Display,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse().map(Some).map_err(D::Error::custom),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(D::Error::custom),
    }
}

/// Like [`opt_number`], falling back to the type's default
pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromStr + Default,
    <T as FromStr>::Err: Display,
{
    Ok(opt_number(deserializer)?.unwrap_or_default())
}

/// Sequence of ids, tolerating a comma separated string and numeric strings
/// inside arrays. Empty elements are skipped.
pub fn number_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromStr,
    <T as FromStr>::Err: Display,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::String(s) => s.split(',').map(|s| Value::String(s.to_string())).collect(),
        Value::Array(items) => items,
        other => vec![other],
    };

    items
        .into_iter()
        .filter_map(|item| opt_number::<_, T>(item).map_err(D::Error::custom).transpose())
        .collect()
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !matches!(s.trim().to_lowercase().as_str(), "" | "0" | "false"),
        _ => false,
    })
}

/// `None` for blank input, the `0000-00-00 00:00:00` placeholder and anything
/// else that is not a timestamp
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() || input.starts_with("0000-00-00") {
        return None;
    }

    NaiveDateTime::parse_from_str(input, DATETIME_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(input).ok().map(|d| d.naive_utc()))
}

/// Optional timestamp in `YYYY-MM-DD HH:MM:SS`, also reading RFC 3339
pub mod datetime {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(DATETIME_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => {
                let parsed = parse_datetime(&s);
                if parsed.is_none() && !s.trim().is_empty() {
                    tracing::debug!("Ignoring unreadable timestamp {:?}", s);
                }
                parsed
            }
            _ => None,
        })
    }
}
