//! Static endpoint definitions.
//!
//! # Design
//! - Descriptors are `'static` data so each resource family is a table, not code.
//! - Parameter placement (path, query, body) is declared once and drives the
//!   request builder; nothing resource-specific lives in the runtime.

use std::fmt::{self, Display, Formatter};

/// HTTP verbs used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Canonical upper-case verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Where a parameter is placed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    /// Substituted into a `{placeholder}` of the path template.
    Path,
    /// Appended to the query string.
    Query,
    /// Serialised as a field of the JSON body.
    Body,
}

/// Declaration of a single operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Caller-facing parameter name.
    pub name: &'static str,
    /// Name used on the wire (placeholder, query key, or body field).
    pub wire_name: &'static str,
    /// Placement on the wire.
    pub location: ParamLocation,
    /// Whether the call fails before I/O when the parameter is absent.
    pub required: bool,
}

impl ParamSpec {
    /// Required path segment; path parameters are always required.
    #[must_use]
    pub const fn path(name: &'static str) -> Self {
        Self {
            name,
            wire_name: name,
            location: ParamLocation::Path,
            required: true,
        }
    }

    /// Optional query parameter sent under the same key.
    #[must_use]
    pub const fn query(name: &'static str) -> Self {
        Self {
            name,
            wire_name: name,
            location: ParamLocation::Query,
            required: false,
        }
    }

    /// Optional body field sent under the same key.
    #[must_use]
    pub const fn body(name: &'static str) -> Self {
        Self {
            name,
            wire_name: name,
            location: ParamLocation::Body,
            required: false,
        }
    }

    /// Override the wire name.
    #[must_use]
    pub const fn wire(mut self, wire_name: &'static str) -> Self {
        self.wire_name = wire_name;
        self
    }

    /// Mark the parameter as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Security scheme and scopes an operation needs a credential for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityRequirement {
    /// Scheme name as declared by the API.
    pub scheme: &'static str,
    /// Scopes requested from the token provider.
    pub scopes: &'static [&'static str],
}

/// Bearer token scheme used by every authenticated endpoint.
pub const HTTP_BEARER: SecurityRequirement = SecurityRequirement {
    scheme: "HTTPBearer",
    scopes: &[],
};

/// Immutable description of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Stable identifier used in errors and logs (`family:operation`).
    pub id: &'static str,
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path template with `{name}` placeholders.
    pub path: &'static str,
    /// Declared parameters.
    pub params: &'static [ParamSpec],
    /// Credential requirement, if any.
    pub security: Option<SecurityRequirement>,
}

impl OperationDescriptor {
    /// Look up a declared parameter by caller-facing name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|spec| spec.name == name)
    }

    /// Parameters declared for the given location, in declaration order.
    pub fn params_at(&self, location: ParamLocation) -> impl Iterator<Item = &ParamSpec> {
        self.params
            .iter()
            .filter(move |spec| spec.location == location)
    }
}
