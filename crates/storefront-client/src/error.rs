//! # Design
//!
//! - One error type for every façade call so callers branch on [`ErrorKind`]
//!   instead of matching on messages.
//! - Decoded HTTP error responses and transport failures are separate variants;
//!   only the latter is ever a candidate for a caller-side retry.
//! - Keep messages short and carry the operation id plus raw status/body for logs.

use storefront_api_models::{HttpValidationError, ResourceNotFound};
use thiserror::Error;

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required parameter was absent; detected before any I/O.
    MissingParameter,
    /// The API rejected the request content.
    Validation,
    /// The addressed resource does not exist.
    NotFound,
    /// Any other non-2xx response.
    OtherHttp,
    /// The request never produced a response.
    Transport,
    /// A 2xx body did not match the expected shape.
    Decode,
    /// The request could not be assembled (bad header value).
    InvalidRequest,
}

/// Errors surfaced by the client runtime.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required parameter was absent or blank.
    #[error("required parameter `{name}` missing for {operation}")]
    MissingParameter {
        /// Parameter name as declared by the operation.
        name: &'static str,
        /// Operation identifier.
        operation: &'static str,
    },
    /// The API returned a structured validation failure.
    #[error("request rejected by validation")]
    Validation {
        /// Operation identifier.
        operation: &'static str,
        /// Field-level failures.
        details: HttpValidationError,
    },
    /// The API reported the resource as missing.
    #[error("resource not found")]
    NotFound {
        /// Operation identifier.
        operation: &'static str,
        /// Decoded payload when the body matched the not-found shape.
        details: Option<ResourceNotFound>,
        /// Raw response body.
        body: String,
    },
    /// Any other non-success response.
    #[error("unexpected http status {status}")]
    OtherHttp {
        /// Operation identifier.
        operation: &'static str,
        /// Raw HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// No response was received.
    #[error("transport failure")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying transport error.
        source: TransportError,
    },
    /// A success body could not be decoded.
    #[error("response decoding failed")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status of the undecodable response.
        status: u16,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// A header value could not be encoded.
    #[error("invalid header value")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
    },
}

impl ClientError {
    /// Classify the error for branching.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::OtherHttp { .. } => ErrorKind::OtherHttp,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::InvalidHeader { .. } => ErrorKind::InvalidRequest,
        }
    }

    /// Whether the failure happened below HTTP, so a caller may retry.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// HTTP status carried by the error, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Validation { .. } => Some(422),
            Self::NotFound { .. } => Some(404),
            Self::OtherHttp { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::MissingParameter { .. } | Self::Transport { .. } | Self::InvalidHeader { .. } => {
                None
            }
        }
    }
}

/// Failures that prevented a response from being received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed")]
    Connect {
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The request exceeded its deadline.
    #[error("request timed out")]
    Timeout {
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The caller cancelled the request before it completed.
    #[error("request aborted")]
    Aborted,
    /// The request URL could not be assembled.
    #[error("invalid request url")]
    InvalidUrl {
        /// URL text that failed to parse.
        url: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// Any other HTTP client failure.
    #[error("http client failure")]
    Client {
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// A non-reqwest transport reported a failure.
    #[error("transport unavailable: {reason}")]
    Unavailable {
        /// Description supplied by the transport.
        reason: String,
    },
}

impl From<reqwest::Error> for TransportError {
    fn from(source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { source }
        } else if source.is_connect() {
            Self::Connect { source }
        } else {
            Self::Client { source }
        }
    }
}
