//! Request builder: descriptor + parameters into a wire request.
//!
//! # Design
//! - Pure and synchronous so missing parameters fail before any future exists.
//! - Absent optional parameters are omitted; list values repeat their key.
//! - A fresh request is built for every call; nothing is cached.

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Map, Value};

use crate::descriptor::{HttpMethod, OperationDescriptor, ParamLocation};
use crate::error::{ClientError, ClientResult};
use crate::params::RequestParams;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Fully resolved request, ready for a transport.
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path with placeholders substituted and percent-encoded.
    pub path: String,
    /// Query pairs in emission order; keys repeat for list values.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: HeaderMap,
    /// JSON body, when the operation declares body parameters.
    pub body: Option<Value>,
}

impl WireRequest {
    /// Form-encoded query string without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    /// Path plus query string, as it appears on the request line.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string())
        }
    }

    /// Values sent for a query key, in order.
    #[must_use]
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Header value as text, when present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }
}

/// Check that every required parameter is present and non-blank.
///
/// # Errors
///
/// Returns [`ClientError::MissingParameter`] for the first missing parameter
/// in declaration order.
pub fn validate(descriptor: &OperationDescriptor, params: &RequestParams) -> ClientResult<()> {
    for spec in descriptor.params.iter().filter(|spec| spec.required) {
        let present = params.get(spec.name).is_some_and(|value| !value.is_blank());
        if !present {
            return Err(ClientError::MissingParameter {
                name: spec.name,
                operation: descriptor.id,
            });
        }
    }
    Ok(())
}

/// Build the wire request for `descriptor` from `params`.
///
/// Parameters not declared by the descriptor are ignored.
///
/// # Errors
///
/// Returns [`ClientError::MissingParameter`] when a required parameter is
/// absent or blank.
pub fn build(descriptor: &OperationDescriptor, params: &RequestParams) -> ClientResult<WireRequest> {
    validate(descriptor, params)?;

    let mut path = descriptor.path.to_string();
    for spec in descriptor.params_at(ParamLocation::Path) {
        let placeholder = format!("{{{}}}", spec.wire_name);
        let value = params
            .get(spec.name)
            .ok_or(ClientError::MissingParameter {
                name: spec.name,
                operation: descriptor.id,
            })?
            .path_segment();
        path = path.replace(&placeholder, &urlencoding::encode(&value));
    }

    let mut query = Vec::new();
    for spec in descriptor.params_at(ParamLocation::Query) {
        if let Some(value) = params.get(spec.name).filter(|value| !value.is_null()) {
            for rendered in value.query_values() {
                query.push((spec.wire_name.to_string(), rendered));
            }
        }
    }

    let mut body_fields = Map::new();
    for spec in descriptor.params_at(ParamLocation::Body) {
        if let Some(value) = params.get(spec.name).filter(|value| !value.is_null()) {
            body_fields.insert(spec.wire_name.to_string(), value.to_json());
        }
    }
    let has_body_params = descriptor.params_at(ParamLocation::Body).next().is_some();
    let body = has_body_params.then(|| Value::Object(body_fields));

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
    if body.is_some() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));
    }

    Ok(WireRequest {
        method: descriptor.method,
        path,
        query,
        headers,
        body,
    })
}
