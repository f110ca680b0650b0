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

//! Session bootstrap for Storefront clients.
//!
//! Layout: store.rs (store abstraction, memory and API-backed stores),
//! hydration.rs (one-shot hydration signal), bootstrap.rs (login-check state
//! machine), guard.rs (`require_auth`).

pub mod bootstrap;
pub mod guard;
pub mod hydration;
pub mod store;

pub use bootstrap::{BootstrapPhase, SessionBootstrap, SessionState};
pub use guard::{DEFAULT_REDIRECT, Navigator, require_auth, should_redirect};
pub use hydration::Hydration;
pub use store::{ApiSessionStore, MemoryStore, SessionStore, UserState};
