//! The record flowing through pipelines
//!
//! A [`Record`] is a JSON-shaped payload. Sources produce records, buffers
//! queue them, processors rewrite them and sinks deliver them. Route
//! conditions address fields with dotted paths (`"log.level"`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single unit of data moving through a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    data: Value,
}

impl Record {
    /// Create a record from a JSON value
    #[inline]
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Create a record holding a plain string payload
    #[inline]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self {
            data: Value::String(s.into()),
        }
    }

    /// Borrow the record payload
    #[inline]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Mutably borrow the record payload
    #[inline]
    pub fn data_mut(&mut self) -> &mut Value {
        &mut self.data
    }

    /// Consume the record, returning its payload
    #[inline]
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Look up a field by dotted path (`"log.level"`)
    ///
    /// Returns `None` when any path segment is missing or the value on the
    /// way is not an object.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.data;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl From<Value> for Record {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}
