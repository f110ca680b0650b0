//! Façade construction, CLI error types, and API error classification.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use storefront_client::{
    ApiFacade, ClientError, HttpExecutor, ReqwestTransport, TokenResolver,
};
use storefront_config::{ClientConfig, ConfigError};

use crate::cli::OutputFormat;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::validation(err.to_string())
    }
}

/// Application context passed to command handlers.
#[derive(Debug, Clone)]
pub(crate) struct AppContext {
    pub(crate) api: ApiFacade,
    pub(crate) format: OutputFormat,
}

impl AppContext {
    /// Wire transport, credentials, and executor from `config`.
    pub(crate) fn from_config(config: &ClientConfig, format: OutputFormat) -> CliResult<Self> {
        let transport = ReqwestTransport::with_options(
            config.api_url.clone(),
            config.timeout,
            &config.user_agent,
        )
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
        let tokens = TokenResolver::from_static(config.access_token.clone());
        let executor = HttpExecutor::new(Arc::new(transport), tokens);
        Ok(Self {
            api: ApiFacade::new(executor),
            format,
        })
    }
}

/// Classify a client error into a CLI error.
///
/// Caller mistakes and request rejections are validation errors (exit 2);
/// everything else is an operational failure (exit 3).
pub(crate) fn classify_client_error(err: ClientError) -> CliError {
    match err {
        ClientError::MissingParameter { .. } => CliError::validation(err.to_string()),
        ClientError::Validation { ref details, .. } => {
            let fields = details
                .detail
                .iter()
                .map(|issue| format!("{}: {}", issue.field(), issue.msg))
                .collect::<Vec<_>>()
                .join("; ");
            CliError::validation(format!("request rejected ({fields})"))
        }
        ClientError::NotFound {
            operation,
            ref details,
            ref body,
        } => {
            let message = match (details, body.trim()) {
                (Some(details), _) => details.detail.clone(),
                (None, "") => format!("{operation}: resource not found"),
                (None, raw) => format!("{operation}: {raw}"),
            };
            CliError::failure(anyhow!("{message} (status 404)"))
        }
        ClientError::OtherHttp {
            status, ref body, ..
        } => {
            let body = body.trim();
            if body.is_empty() {
                CliError::failure(anyhow!("request failed with status {status}"))
            } else {
                CliError::failure(anyhow!("{body} (status {status})"))
            }
        }
        other => CliError::failure(other),
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<String, String> {
    input
        .parse::<url::Url>()
        .map(|_| input.to_string())
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}
