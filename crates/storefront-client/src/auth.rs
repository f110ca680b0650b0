//! Bearer token resolution.
//!
//! # Design
//! - The token source is injected; the runtime never stores credentials itself.
//! - "No token" is a normal outcome: the request goes out without `Authorization`.
//! - Empty strings from a provider are treated the same as no token.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use async_trait::async_trait;

use crate::descriptor::SecurityRequirement;

/// Source of access tokens for a security scheme.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Produce a token for `scheme` and `scopes`, or `None` when unavailable.
    async fn token(&self, scheme: &str, scopes: &[&str]) -> Option<String>;
}

/// Provider returning the same token for every scheme.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Wrap a fixed token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Debug for StaticTokenProvider {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self, _scheme: &str, _scopes: &[&str]) -> Option<String> {
        Some(self.token.clone())
    }
}

/// Resolves the credential for an operation's security requirement.
#[derive(Clone, Default)]
pub struct TokenResolver {
    provider: Option<Arc<dyn TokenProvider>>,
}

impl TokenResolver {
    /// Resolver backed by `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Resolver that never yields a token.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { provider: None }
    }

    /// Resolver for an optional static token; blank tokens yield an anonymous resolver.
    #[must_use]
    pub fn from_static(token: Option<String>) -> Self {
        match token.filter(|token| !token.trim().is_empty()) {
            Some(token) => Self::new(Arc::new(StaticTokenProvider::new(token))),
            None => Self::anonymous(),
        }
    }

    /// Resolve a token for `requirement`.
    ///
    /// Returns `None` immediately when the operation declares no requirement or
    /// no provider is configured.
    pub async fn resolve(&self, requirement: Option<&SecurityRequirement>) -> Option<String> {
        let requirement = requirement?;
        let provider = self.provider.as_ref()?;
        let token = provider
            .token(requirement.scheme, requirement.scopes)
            .await
            .filter(|token| !token.is_empty());
        if token.is_none() {
            tracing::debug!(scheme = requirement.scheme, "token provider yielded no token");
        }
        token
    }
}

impl Debug for TokenResolver {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TokenResolver")
            .field("configured", &self.provider.is_some())
            .finish()
    }
}
