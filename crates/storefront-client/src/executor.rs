//! HTTP executor: build, authorise, transmit, classify.
//!
//! # Design
//! - Classification is total: every received response maps to exactly one
//!   [`ResponseClassification`]; only "no response" is an `Err`.
//! - Error payloads are decoded independently of the success shape.
//! - No retries happen here unless a caller installs a [`RetryPolicy`], and
//!   even then only transport failures are retried.
//! - Cancellation drops the in-flight transport future and reports
//!   [`TransportError::Aborted`]; nothing else is mutated.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use storefront_api_models::{HttpValidationError, ResourceNotFound};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::TokenResolver;
use crate::descriptor::OperationDescriptor;
use crate::error::{ClientError, ClientResult, TransportError};
use crate::params::RequestParams;
use crate::request::{WireRequest, build};
use crate::transport::{RawResponse, Transport};

/// Correlation header attached to every request.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

const STATUS_NOT_FOUND: u16 = 404;
const STATUS_UNPROCESSABLE: u16 = 422;

/// Outcome of a request that produced a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseClassification<T> {
    /// 2xx with a body matching the expected shape.
    Success(T),
    /// 422 with a structured field-level error payload.
    ValidationError(HttpValidationError),
    /// 404; the payload is kept when it matched the not-found shape, the raw
    /// body always.
    NotFound {
        /// Decoded not-found payload.
        details: Option<ResourceNotFound>,
        /// Raw response body.
        body: String,
    },
    /// Anything else, with the raw status and body.
    OtherError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl<T> ResponseClassification<T> {
    /// Short label used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::ValidationError(_) => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::OtherError { .. } => "other_error",
        }
    }

    /// Convert into the façade result for `operation`.
    ///
    /// # Errors
    ///
    /// Every non-success classification becomes the matching [`ClientError`].
    pub fn into_result(self, operation: &'static str) -> ClientResult<T> {
        match self {
            Self::Success(value) => Ok(value),
            Self::ValidationError(details) => Err(ClientError::Validation { operation, details }),
            Self::NotFound { details, body } => Err(ClientError::NotFound {
                operation,
                details,
                body,
            }),
            Self::OtherError { status, body } => Err(ClientError::OtherHttp {
                operation,
                status,
                body,
            }),
        }
    }
}

/// Caller-supplied policy for retrying transport failures.
pub trait RetryPolicy: Send + Sync {
    /// Delay before attempt `attempt + 1`, or `None` to give up.
    ///
    /// `attempt` counts completed attempts, starting at 1.
    fn retry_after(&self, attempt: u32, error: &TransportError) -> Option<Duration>;
}

/// Default policy: never retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn retry_after(&self, _attempt: u32, _error: &TransportError) -> Option<Duration> {
        None
    }
}

/// Executes operation descriptors against a [`Transport`].
#[derive(Clone)]
pub struct HttpExecutor {
    transport: Arc<dyn Transport>,
    tokens: TokenResolver,
    retry: Arc<dyn RetryPolicy>,
}

impl Debug for HttpExecutor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpExecutor")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl HttpExecutor {
    /// Executor over `transport` with credentials from `tokens`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, tokens: TokenResolver) -> Self {
        Self {
            transport,
            tokens,
            retry: Arc::new(NoRetry),
        }
    }

    /// Install a retry policy for transport failures.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    /// Build and send `descriptor` with `params`, then classify the response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingParameter`] before any I/O when a required
    /// parameter is absent, [`ClientError::Transport`] when no response was
    /// received, and [`ClientError::Decode`] when a 2xx body has the wrong shape.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        descriptor: &'static OperationDescriptor,
        params: &RequestParams,
    ) -> ClientResult<ResponseClassification<T>> {
        let wire = build(descriptor, params)?;
        self.dispatch(descriptor, wire).await
    }

    /// Like [`Self::execute`], aborting when `cancel` fires first.
    ///
    /// # Errors
    ///
    /// As [`Self::execute`]; cancellation yields [`TransportError::Aborted`].
    pub async fn execute_cancellable<T: DeserializeOwned>(
        &self,
        descriptor: &'static OperationDescriptor,
        params: &RequestParams,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseClassification<T>> {
        let wire = build(descriptor, params)?;
        self.dispatch_cancellable(descriptor, wire, cancel).await
    }

    /// Send an already built request and classify the response.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn dispatch<T: DeserializeOwned>(
        &self,
        descriptor: &'static OperationDescriptor,
        mut wire: WireRequest,
    ) -> ClientResult<ResponseClassification<T>> {
        if let Some(token) = self.tokens.resolve(descriptor.security.as_ref()).await {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::InvalidHeader { name: "authorization" })?;
            wire.headers.insert(AUTHORIZATION, value);
        }
        let request_id = HeaderValue::from_str(&Uuid::new_v4().to_string())
            .map_err(|_| ClientError::InvalidHeader {
                name: HEADER_REQUEST_ID,
            })?;
        wire.headers
            .insert(HeaderName::from_static(HEADER_REQUEST_ID), request_id);

        let response = self.transmit(descriptor, wire).await?;
        let classification = classify(descriptor.id, &response)?;
        debug!(
            operation = descriptor.id,
            status = response.status,
            classification = classification.label(),
            "request completed"
        );
        Ok(classification)
    }

    /// Like [`Self::dispatch`], aborting when `cancel` fires first.
    ///
    /// # Errors
    ///
    /// See [`Self::execute_cancellable`].
    pub async fn dispatch_cancellable<T: DeserializeOwned>(
        &self,
        descriptor: &'static OperationDescriptor,
        wire: WireRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseClassification<T>> {
        let aborted = || ClientError::Transport {
            operation: descriptor.id,
            source: TransportError::Aborted,
        };
        if cancel.is_cancelled() {
            return Err(aborted());
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(operation = descriptor.id, "request cancelled");
                Err(aborted())
            }
            result = self.dispatch(descriptor, wire) => result,
        }
    }

    async fn transmit(
        &self,
        descriptor: &'static OperationDescriptor,
        wire: WireRequest,
    ) -> ClientResult<RawResponse> {
        let mut attempt = 0_u32;
        loop {
            attempt += 1;
            debug!(
                operation = descriptor.id,
                method = %wire.method,
                path = %wire.path,
                attempt,
                "sending request"
            );
            match self.transport.send(wire.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    warn!(operation = descriptor.id, attempt, error = %error, "transport failure");
                    match self.retry.retry_after(attempt, &error) {
                        Some(delay) => tokio::time::sleep(delay).await,
                        None => {
                            return Err(ClientError::Transport {
                                operation: descriptor.id,
                                source: error,
                            });
                        }
                    }
                }
            }
        }
    }
}

/// Map a received response onto a classification.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] when a 2xx body does not match `T`.
pub fn classify<T: DeserializeOwned>(
    operation: &'static str,
    response: &RawResponse,
) -> ClientResult<ResponseClassification<T>> {
    if response.is_success() {
        let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &response.body
        };
        return serde_json::from_slice(body)
            .map(ResponseClassification::Success)
            .map_err(|source| ClientError::Decode {
                operation,
                status: response.status,
                source,
            });
    }

    match response.status {
        STATUS_NOT_FOUND => Ok(ResponseClassification::NotFound {
            details: serde_json::from_slice(&response.body).ok(),
            body: response.body_text(),
        }),
        STATUS_UNPROCESSABLE => Ok(
            match serde_json::from_slice::<HttpValidationError>(&response.body) {
                Ok(details) if !details.detail.is_empty() => {
                    ResponseClassification::ValidationError(details)
                }
                _ => ResponseClassification::OtherError {
                    status: response.status,
                    body: response.body_text(),
                },
            },
        ),
        status => Ok(ResponseClassification::OtherError {
            status,
            body: response.body_text(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{HTTP_BEARER, HttpMethod, ParamSpec};
    use crate::error::ErrorKind;
    use crate::transport::ReqwestTransport;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};
    use storefront_test_support::fixtures;
    use url::Url;

    static GET_THING: OperationDescriptor = OperationDescriptor {
        id: "things:get",
        method: HttpMethod::Get,
        path: "/api/v1/things/{id}",
        params: &[ParamSpec::path("id")],
        security: Some(HTTP_BEARER),
    };

    static PUBLIC_THING: OperationDescriptor = OperationDescriptor {
        id: "things:public",
        method: HttpMethod::Get,
        path: "/api/v1/public",
        params: &[],
        security: None,
    };

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    fn executor_for(server: &MockServer, token: Option<&str>) -> anyhow::Result<HttpExecutor> {
        let transport = ReqwestTransport::new(reqwest::Client::new(), Url::parse(&server.base_url())?);
        Ok(HttpExecutor::new(
            Arc::new(transport),
            TokenResolver::from_static(token.map(ToString::to_string)),
        ))
    }

    struct FailingTransport {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _request: WireRequest) -> Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Unavailable {
                reason: "offline".into(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        seen: std::sync::Mutex<Vec<WireRequest>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: WireRequest) -> Result<RawResponse, TransportError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request);
            }
            Ok(RawResponse {
                status: 200,
                body: b"[]".to_vec(),
            })
        }
    }

    struct PendingTransport;

    #[async_trait]
    impl Transport for PendingTransport {
        async fn send(&self, _request: WireRequest) -> Result<RawResponse, TransportError> {
            std::future::pending::<()>().await;
            Err(TransportError::Aborted)
        }
    }

    struct RetryTwice;

    impl RetryPolicy for RetryTwice {
        fn retry_after(&self, attempt: u32, _error: &TransportError) -> Option<Duration> {
            (attempt < 3).then_some(Duration::from_millis(1))
        }
    }

    #[test]
    fn classify_decodes_success_and_empty_bodies() -> ClientResult<()> {
        let ok: ResponseClassification<Value> = classify("op", &response(200, r#"{"a":1}"#))?;
        assert_eq!(ok, ResponseClassification::Success(serde_json::json!({"a": 1})));
        let empty: ResponseClassification<()> = classify("op", &response(204, ""))?;
        assert_eq!(empty, ResponseClassification::Success(()));
        Ok(())
    }

    #[test]
    fn classify_reports_malformed_success_as_decode_error() {
        let err = classify::<Vec<u8>>("op", &response(200, "{")).err();
        assert_eq!(err.map(|err| err.kind()), Some(ErrorKind::Decode));
    }

    #[test]
    fn classify_not_found_with_and_without_payload() -> ClientResult<()> {
        let body = fixtures::not_found_json("Order not found").to_string();
        let decoded: ResponseClassification<Value> = classify("op", &response(404, &body))?;
        assert!(matches!(
            decoded,
            ResponseClassification::NotFound { details: Some(ref payload), .. }
                if payload.detail == "Order not found"
        ));
        let bare: ResponseClassification<Value> = classify("op", &response(404, "nope"))?;
        assert_eq!(
            bare,
            ResponseClassification::NotFound {
                details: None,
                body: "nope".into()
            }
        );
        let err = bare.into_result("op").err();
        assert!(matches!(
            err,
            Some(ClientError::NotFound { details: None, ref body, .. }) if body == "nope"
        ));
        Ok(())
    }

    #[test]
    fn classify_unprocessable_requires_field_errors() -> ClientResult<()> {
        let body = fixtures::validation_error_json(&[("query.limit", "too large")]).to_string();
        let decoded: ResponseClassification<Value> = classify("op", &response(422, &body))?;
        assert!(matches!(
            decoded,
            ResponseClassification::ValidationError(ref details)
                if details.fields() == vec!["query.limit".to_string()]
        ));
        let opaque: ResponseClassification<Value> = classify("op", &response(422, "bad"))?;
        assert_eq!(
            opaque,
            ResponseClassification::OtherError {
                status: 422,
                body: "bad".into()
            }
        );
        Ok(())
    }

    #[test]
    fn classify_other_statuses_keep_raw_body() -> ClientResult<()> {
        let decoded: ResponseClassification<Value> = classify("op", &response(503, "maintenance"))?;
        assert_eq!(decoded.label(), "other_error");
        let err = decoded.into_result("op").err();
        assert!(matches!(
            err,
            Some(ClientError::OtherHttp { status: 503, ref body, .. }) if body == "maintenance"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn bearer_header_is_attached_when_a_token_resolves() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/things/abc")
                .header("authorization", "Bearer tok")
                .header_exists(HEADER_REQUEST_ID);
            then.status(200).json_body(serde_json::json!({ "id": "abc" }));
        });

        let executor = executor_for(&server, Some("tok"))?;
        let params = RequestParams::new().with("id", "abc");
        let outcome: ResponseClassification<Value> = executor.execute(&GET_THING, &params).await?;

        mock.assert();
        assert_eq!(
            outcome,
            ResponseClassification::Success(serde_json::json!({ "id": "abc" }))
        );
        Ok(())
    }

    #[tokio::test]
    async fn operations_without_security_never_send_authorization() -> anyhow::Result<()> {
        let transport = Arc::new(RecordingTransport::default());
        let executor = HttpExecutor::new(
            transport.clone(),
            TokenResolver::from_static(Some("tok".into())),
        );
        let outcome: ResponseClassification<Value> =
            executor.execute(&PUBLIC_THING, &RequestParams::new()).await?;

        assert_eq!(outcome.label(), "success");
        let seen = transport.seen.lock().map(|seen| seen.clone()).unwrap_or_default();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].header("authorization").is_none());
        assert!(seen[0].header(HEADER_REQUEST_ID).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn transport_failures_are_not_retried_by_default() {
        let transport = Arc::new(FailingTransport {
            calls: AtomicU32::new(0),
        });
        let executor = HttpExecutor::new(transport.clone(), TokenResolver::anonymous());
        let params = RequestParams::new().with("id", "abc");
        let result = executor.execute::<Value>(&GET_THING, &params).await;

        assert!(matches!(
            result,
            Err(ClientError::Transport {
                source: TransportError::Unavailable { .. },
                ..
            })
        ));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_policy_is_consulted_for_transport_failures() {
        let transport = Arc::new(FailingTransport {
            calls: AtomicU32::new(0),
        });
        let executor = HttpExecutor::new(transport.clone(), TokenResolver::anonymous())
            .with_retry_policy(Arc::new(RetryTwice));
        let params = RequestParams::new().with("id", "abc");
        let result = executor.execute::<Value>(&GET_THING, &params).await;

        assert!(result.is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_parameters_fail_before_transport() {
        let transport = Arc::new(FailingTransport {
            calls: AtomicU32::new(0),
        });
        let executor = HttpExecutor::new(transport.clone(), TokenResolver::anonymous());
        let result = executor.execute::<Value>(&GET_THING, &RequestParams::new()).await;

        assert_eq!(
            result.err().map(|err| err.kind()),
            Some(ErrorKind::MissingParameter)
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_requests() {
        let executor = HttpExecutor::new(Arc::new(PendingTransport), TokenResolver::anonymous());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let params = RequestParams::new().with("id", "abc");
        let result = executor
            .execute_cancellable::<Value>(&GET_THING, &params, &cancel)
            .await;

        assert!(matches!(
            result,
            Err(ClientError::Transport {
                source: TransportError::Aborted,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn pre_cancelled_tokens_skip_transmission() {
        let transport = Arc::new(FailingTransport {
            calls: AtomicU32::new(0),
        });
        let executor = HttpExecutor::new(transport.clone(), TokenResolver::anonymous());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let params = RequestParams::new().with("id", "abc");
        let result = executor
            .execute_cancellable::<Value>(&GET_THING, &params, &cancel)
            .await;

        assert!(result.is_err_and(|err| err.is_transport()));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
