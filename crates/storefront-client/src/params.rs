//! Caller-supplied parameter values.

use serde_json::Value;
use storefront_api_models::ProductPriceType;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Scalar text.
    Text(String),
    /// Scalar integer.
    Integer(i64),
    /// Ordered list; repeated as `key=value` pairs in query strings.
    List(Vec<String>),
    /// Arbitrary JSON, only meaningful for body parameters.
    Json(Value),
}

impl ParamValue {
    /// Whether the value carries nothing usable for a required parameter.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Integer(_) => false,
            Self::List(items) => items.is_empty(),
            Self::Json(value) => value.is_null(),
        }
    }

    /// Whether the value is JSON `null`, which is treated as absent.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Json(Value::Null))
    }

    /// Rendered values for a query key, one entry per repetition. `null`
    /// renders nothing.
    #[must_use]
    pub fn query_values(&self) -> Vec<String> {
        match self {
            Self::Json(Value::Null) => Vec::new(),
            Self::Text(text) => vec![text.clone()],
            Self::Integer(value) => vec![value.to_string()],
            Self::List(items) => items.clone(),
            Self::Json(Value::String(text)) => vec![text.clone()],
            Self::Json(value) => vec![value.to_string()],
        }
    }

    /// Rendered value for a path segment, before percent-encoding.
    #[must_use]
    pub fn path_segment(&self) -> String {
        match self {
            Self::List(items) => items.join(","),
            other => other.query_values().concat(),
        }
    }

    pub(crate) fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Integer(value) => Value::from(*value),
            Self::List(items) => Value::from(items.clone()),
            Self::Json(value) => value.clone(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<ProductPriceType> for ParamValue {
    fn from(value: ProductPriceType) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Ordered name/value mapping handed to the request builder.
///
/// A parameter that was never inserted is absent; absent optional parameters
/// never reach the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    entries: Vec<(String, ParamValue)>,
}

impl RequestParams {
    /// Empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set a value, replacing any previous value for the same name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a value only when one is present.
    #[must_use]
    pub fn with_opt<V: Into<ParamValue>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    /// Set a value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Value for the given name, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Whether no parameters were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Supplied names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}
