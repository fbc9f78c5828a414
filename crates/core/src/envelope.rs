//! Response envelope decoding.
//!
//! The backend does not wrap its responses consistently: the same logical
//! value can arrive as a bare number, a numeric string, or an object with
//! one of several field names, and collections arrive either bare or under
//! a resource-specific key. Each envelope kind is modelled as a sum type
//! with exactly one decode function, and every decode reports which shape
//! it matched so callers (and logs) can see when the fallback default was
//! used instead of real data.
//!
//! A shape mismatch is never an error here. The decoders substitute the
//! default (`0`, empty list, empty object) and emit a `warn` log.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Field names probed, in order, when a numeric value arrives wrapped in
/// an object. Different backend versions emit different names.
pub const NUMERIC_FIELDS: [&str; 5] = ["volatility", "health", "health_score", "score", "value"];

/// Fallback collection key used after the endpoint-specific key.
pub const DATA_FIELD: &str = "data";

/// Which envelope shape a decoder matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// The payload itself was the value (bare number, bare array, object).
    Bare,
    /// A numeric string that had to be parsed.
    Text,
    /// The value was found under the named field.
    Field(&'static str),
    /// Nothing usable was found; the default was substituted.
    Missing,
}

/// A decoded value together with the shape it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub shape: EnvelopeShape,
}

impl<T> Decoded<T> {
    fn new(value: T, shape: EnvelopeShape) -> Self {
        Self { value, shape }
    }

    /// True when the default was substituted for a missing value.
    pub fn is_fallback(&self) -> bool {
        self.shape == EnvelopeShape::Missing
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

// ---------------------------------------------------------------------------
// Numeric envelope
// ---------------------------------------------------------------------------

/// Every shape a numeric response has been observed in.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericEnvelope {
    Number(f64),
    Text(String),
    Fields(Map<String, Value>),
    /// `null` or no body at all.
    Absent,
    /// Arrays and booleans.
    Unexpected(Value),
}

impl From<Value> for NumericEnvelope {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(NumericEnvelope::Number)
                .unwrap_or(NumericEnvelope::Unexpected(Value::Number(n))),
            Value::String(s) => NumericEnvelope::Text(s),
            Value::Object(map) => NumericEnvelope::Fields(map),
            Value::Null => NumericEnvelope::Absent,
            other => NumericEnvelope::Unexpected(other),
        }
    }
}

impl From<Option<Value>> for NumericEnvelope {
    fn from(value: Option<Value>) -> Self {
        value.map(Into::into).unwrap_or(NumericEnvelope::Absent)
    }
}

impl NumericEnvelope {
    /// Resolve to a number, defaulting to `0.0`.
    ///
    /// Wrapped objects are probed in [`NUMERIC_FIELDS`] order and only
    /// fields holding a JSON number count. Strings use `parseFloat`
    /// semantics: the longest leading numeric prefix, `0` when none.
    pub fn decode(&self) -> Decoded<f64> {
        match self {
            NumericEnvelope::Number(n) => Decoded::new(*n, EnvelopeShape::Bare),
            NumericEnvelope::Fields(map) => {
                for field in NUMERIC_FIELDS {
                    if let Some(n) = map.get(field).and_then(Value::as_f64) {
                        return Decoded::new(n, EnvelopeShape::Field(field));
                    }
                }
                tracing::warn!(
                    keys = ?map.keys().collect::<Vec<_>>(),
                    "Numeric response has no known field, substituting 0",
                );
                Decoded::new(0.0, EnvelopeShape::Missing)
            }
            NumericEnvelope::Text(s) => match parse_float_prefix(s) {
                Some(n) => Decoded::new(n, EnvelopeShape::Text),
                None => Decoded::new(0.0, EnvelopeShape::Missing),
            },
            NumericEnvelope::Absent => {
                tracing::debug!("Numeric response was empty, substituting 0");
                Decoded::new(0.0, EnvelopeShape::Missing)
            }
            NumericEnvelope::Unexpected(value) => {
                tracing::warn!(%value, "Unexpected numeric response shape, substituting 0");
                Decoded::new(0.0, EnvelopeShape::Missing)
            }
        }
    }
}

/// Decode a numeric response body.
pub fn unwrap_number(body: Value) -> Decoded<f64> {
    NumericEnvelope::from(body).decode()
}

/// Parse the longest leading float literal of `s`, ignoring leading
/// whitespace. Returns `None` when no digits lead the string.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

// ---------------------------------------------------------------------------
// Collection envelope
// ---------------------------------------------------------------------------

/// Every shape a collection response has been observed in.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEnvelope {
    Bare(Vec<Value>),
    Keyed(Map<String, Value>),
    Absent,
    Unexpected(Value),
}

impl From<Value> for CollectionEnvelope {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => CollectionEnvelope::Bare(items),
            Value::Object(map) => CollectionEnvelope::Keyed(map),
            Value::Null => CollectionEnvelope::Absent,
            other => CollectionEnvelope::Unexpected(other),
        }
    }
}

impl CollectionEnvelope {
    /// Resolve to the raw item list: the bare array, else the array under
    /// `key`, else the array under [`DATA_FIELD`], else empty.
    pub fn decode(self, key: &'static str) -> Decoded<Vec<Value>> {
        match self {
            CollectionEnvelope::Bare(items) => Decoded::new(items, EnvelopeShape::Bare),
            CollectionEnvelope::Keyed(mut map) => {
                for field in [key, DATA_FIELD] {
                    if let Some(Value::Array(items)) = map.remove(field) {
                        return Decoded::new(items, EnvelopeShape::Field(field));
                    }
                }
                tracing::warn!(
                    expected = key,
                    keys = ?map.keys().collect::<Vec<_>>(),
                    "Collection response has no known field, substituting empty list",
                );
                Decoded::new(Vec::new(), EnvelopeShape::Missing)
            }
            CollectionEnvelope::Absent => {
                tracing::debug!(expected = key, "Collection response was empty");
                Decoded::new(Vec::new(), EnvelopeShape::Missing)
            }
            CollectionEnvelope::Unexpected(value) => {
                tracing::warn!(
                    expected = key,
                    %value,
                    "Unexpected collection response shape, substituting empty list",
                );
                Decoded::new(Vec::new(), EnvelopeShape::Missing)
            }
        }
    }
}

/// A collection endpoint: the key its items may be wrapped under and the
/// item type they decode into.
pub trait CollectionResponse {
    const KEY: &'static str;
    type Item: DeserializeOwned;
}

/// Decode a collection response body for endpoint `R`.
///
/// Items that do not match `R::Item` are dropped with a warning rather
/// than failing the whole collection.
pub fn unwrap_collection<R: CollectionResponse>(body: Value) -> Decoded<Vec<R::Item>> {
    let Decoded { value, shape } = CollectionEnvelope::from(body).decode(R::KEY);
    let total = value.len();
    let items: Vec<R::Item> = value
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if items.len() < total {
        tracing::warn!(
            key = R::KEY,
            dropped = total - items.len(),
            "Dropped collection items that did not match the expected shape",
        );
    }

    Decoded::new(items, shape)
}

// ---------------------------------------------------------------------------
// Object envelope
// ---------------------------------------------------------------------------

/// Decode a free-form document response, defaulting to an empty object.
pub fn unwrap_object(body: Value) -> Decoded<Map<String, Value>> {
    match body {
        Value::Object(map) => Decoded::new(map, EnvelopeShape::Bare),
        Value::Null => Decoded::new(Map::new(), EnvelopeShape::Missing),
        other => {
            tracing::warn!(value = %other, "Expected an object response, substituting {{}}");
            Decoded::new(Map::new(), EnvelopeShape::Missing)
        }
    }
}
