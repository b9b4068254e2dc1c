//! Dotted property paths resolved against serialized rows.

use std::fmt;

use horizon_trellis_core::{TrellisError, TrellisResult};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed property path such as `id`, `customer.address.city` or
/// `lines.0.sku`.
///
/// Rows are reflected through `serde_json`: the row is serialized to a JSON
/// value and the path walks object keys and array indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    source: String,
    segments: Vec<Segment>,
}

impl PropertyPath {
    /// Parse a dotted path.
    ///
    /// # Errors
    ///
    /// An empty path or an empty segment is [`TrellisError::InvalidArgument`].
    pub fn parse(path: &str) -> TrellisResult<Self> {
        if path.trim().is_empty() {
            return Err(TrellisError::invalid_argument("property path is empty"));
        }
        let segments = path
            .split('.')
            .map(|segment| {
                let segment = segment.trim();
                if segment.is_empty() {
                    Err(TrellisError::invalid_argument(format!("property path '{path}' has an empty segment")))
                } else if let Ok(index) = segment.parse::<usize>() {
                    Ok(Segment::Index(index))
                } else {
                    Ok(Segment::Key(segment.to_string()))
                }
            })
            .collect::<TrellisResult<Vec<_>>>()?;
        Ok(Self {
            source: path.to_string(),
            segments,
        })
    }

    /// The path as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Walk the path through `value`.
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.segments.iter().try_fold(value, |current, segment| match segment {
            Segment::Key(key) => current.get(key.as_str()),
            Segment::Index(index) => match current {
                Value::Array(items) => items.get(*index),
                Value::Object(map) => map.get(&index.to_string()),
                _ => None,
            },
        })
    }

    /// Extract the property of `row` as display text.
    ///
    /// Missing properties and `null` give `None`; strings are returned as is
    /// and other values use their JSON text.
    pub fn extract<T: Serialize>(&self, row: &T) -> TrellisResult<Option<String>> {
        let value = serde_json::to_value(row)
            .map_err(|e| TrellisError::invalid_argument(format!("row could not be reflected: {e}")))?;
        Ok(self.resolve(&value).and_then(display_value))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Display text of a JSON value; `None` for `null`.
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
