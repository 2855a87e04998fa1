use super::error::LogError;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reserved key carrying the event timestamp.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// A key/value log message.
///
/// Keys are kept in a `BTreeMap`, so the serialized line always lists them in
/// lexicographic order and identical messages produce identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    fields: BTreeMap<String, Value>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets the reserved `timestamp` key as RFC 3339 with millisecond precision.
    pub fn with_timestamp(self, at: DateTime<Utc>) -> Self {
        self.with(TIMESTAMP_KEY, at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.fields.get(TIMESTAMP_KEY).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_line(&self) -> Result<Bytes, LogError> {
        serialize_line(self)
    }
}

impl From<BTreeMap<String, Value>> for Message {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Message {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl TryFrom<Value> for Message {
    type Error = LogError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(LogError::Serialization(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

/// Encodes any serializable message as one compact JSON line.
///
/// Compact JSON never contains a raw newline, so the result is safe to join
/// into a bulk payload.
pub fn serialize_line<M: Serialize + ?Sized>(message: &M) -> Result<Bytes, LogError> {
    let encoded = serde_json::to_vec(message)?;
    Ok(Bytes::from(encoded))
}
