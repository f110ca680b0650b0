//! Generic resource façade.
//!
//! # Design
//! - One façade serves every resource family; per-resource modules only
//!   contribute descriptor tables and typed request structs.
//! - [`Endpoint`] pairs a descriptor with its request and response types so
//!   mismatched calls fail to compile.
//! - Preparing a call is synchronous; a missing parameter is reported before
//!   any future exists.

use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::descriptor::OperationDescriptor;
use crate::error::ClientResult;
use crate::executor::HttpExecutor;
use crate::params::RequestParams;
use crate::request::{WireRequest, build};
use crate::resources::orders::OrdersApi;
use crate::resources::users::UsersApi;

/// Conversion from a typed request into builder parameters.
pub trait IntoParams {
    /// Produce the parameter set; absent optional fields must be left out.
    fn into_params(self) -> RequestParams;
}

impl IntoParams for RequestParams {
    fn into_params(self) -> RequestParams {
        self
    }
}

impl IntoParams for () {
    fn into_params(self) -> RequestParams {
        RequestParams::new()
    }
}

/// Typed handle on an operation descriptor.
pub struct Endpoint<P, T> {
    /// Underlying descriptor.
    pub descriptor: &'static OperationDescriptor,
    _types: PhantomData<fn(P) -> T>,
}

impl<P, T> Endpoint<P, T> {
    /// Attach request and response types to `descriptor`.
    #[must_use]
    pub const fn new(descriptor: &'static OperationDescriptor) -> Self {
        Self {
            descriptor,
            _types: PhantomData,
        }
    }
}

impl<P, T> Clone for Endpoint<P, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, T> Copy for Endpoint<P, T> {}

impl<P, T> Debug for Endpoint<P, T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("Endpoint")
            .field(&self.descriptor.id)
            .finish()
    }
}

/// Entry point for typed API calls.
#[derive(Debug, Clone)]
pub struct ApiFacade {
    executor: HttpExecutor,
}

impl ApiFacade {
    /// Façade over `executor`.
    #[must_use]
    pub const fn new(executor: HttpExecutor) -> Self {
        Self { executor }
    }

    /// Executor the façade delegates to.
    #[must_use]
    pub const fn executor(&self) -> &HttpExecutor {
        &self.executor
    }

    /// Validate parameters and build the wire request without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::MissingParameter`] when a required
    /// parameter is absent.
    pub fn prepare<P: IntoParams, T>(
        &self,
        endpoint: Endpoint<P, T>,
        request: P,
    ) -> ClientResult<PreparedCall<'_, T>> {
        let wire = build(endpoint.descriptor, &request.into_params())?;
        Ok(PreparedCall {
            executor: &self.executor,
            descriptor: endpoint.descriptor,
            wire,
            _response: PhantomData,
        })
    }

    /// Prepare and send a typed call.
    ///
    /// # Errors
    ///
    /// Any [`crate::ClientError`]; non-success classifications map to their kind.
    pub async fn call<P: IntoParams, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint<P, T>,
        request: P,
    ) -> ClientResult<T> {
        self.prepare(endpoint, request)?.send().await
    }

    /// Send an arbitrary descriptor with dynamic parameters.
    ///
    /// # Errors
    ///
    /// As [`Self::call`].
    pub async fn call_raw(
        &self,
        descriptor: &'static OperationDescriptor,
        params: RequestParams,
    ) -> ClientResult<Value> {
        self.call(Endpoint::<RequestParams, Value>::new(descriptor), params)
            .await
    }

    /// Orders resource family.
    #[must_use]
    pub const fn orders(&self) -> OrdersApi<'_> {
        OrdersApi::new(self)
    }

    /// Users resource family.
    #[must_use]
    pub const fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }
}

/// A validated request waiting to be sent.
#[derive(Debug)]
pub struct PreparedCall<'a, T> {
    executor: &'a HttpExecutor,
    descriptor: &'static OperationDescriptor,
    wire: WireRequest,
    _response: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> PreparedCall<'_, T> {
    /// Request as it will be transmitted, before credentials are attached.
    #[must_use]
    pub const fn wire(&self) -> &WireRequest {
        &self.wire
    }

    /// Send and unwrap the success value.
    ///
    /// # Errors
    ///
    /// See [`ApiFacade::call`].
    pub async fn send(self) -> ClientResult<T> {
        self.executor
            .dispatch::<T>(self.descriptor, self.wire)
            .await?
            .into_result(self.descriptor.id)
    }

    /// Send, aborting when `cancel` fires first.
    ///
    /// # Errors
    ///
    /// See [`ApiFacade::call`]; cancellation yields a transport error.
    pub async fn send_cancellable(self, cancel: &CancellationToken) -> ClientResult<T> {
        self.executor
            .dispatch_cancellable::<T>(self.descriptor, self.wire, cancel)
            .await?
            .into_result(self.descriptor.id)
    }
}
