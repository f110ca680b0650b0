#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Typed REST client runtime for the Storefront API.
//!
//! Layout: descriptor.rs (endpoint tables), params.rs + request.rs (request
//! builder), auth.rs (token resolution), transport.rs (network seam),
//! executor.rs (send + classify), facade.rs (typed calls), resources/ (per
//! family descriptor tables and wrappers).
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use storefront_client::{ApiFacade, HttpExecutor, ReqwestTransport, TokenResolver};
//! use storefront_client::resources::orders::ListOrdersRequest;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ReqwestTransport::with_options(
//!     "https://api.polar.sh".parse()?,
//!     Duration::from_secs(10),
//!     "storefront-docs",
//! )?;
//! let tokens = TokenResolver::from_static(Some("polar_pat".to_string()));
//! let api = ApiFacade::new(HttpExecutor::new(Arc::new(transport), tokens));
//! let page = api
//!     .orders()
//!     .list_orders(ListOrdersRequest::default().sort_by_desc("created_at"))
//!     .await?;
//! println!("{} orders", page.pagination.total_count);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod facade;
pub mod params;
pub mod request;
pub mod resources;
pub mod transport;

pub use auth::{StaticTokenProvider, TokenProvider, TokenResolver};
pub use descriptor::{
    HTTP_BEARER, HttpMethod, OperationDescriptor, ParamLocation, ParamSpec, SecurityRequirement,
};
pub use error::{ClientError, ClientResult, ErrorKind, TransportError};
pub use executor::{HttpExecutor, NoRetry, ResponseClassification, RetryPolicy};
pub use facade::{ApiFacade, Endpoint, IntoParams, PreparedCall};
pub use params::{ParamValue, RequestParams};
pub use request::WireRequest;
pub use transport::{RawResponse, ReqwestTransport, Transport};
