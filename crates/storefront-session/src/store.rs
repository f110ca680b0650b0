//! Session store abstraction and its implementations.
//!
//! # Design
//! - The store is an injected dependency with read/subscribe/mutate
//!   capabilities; there is no ambient global cell.
//! - `login` returns a future that settles exactly once. Dropping it is how a
//!   caller cancels, and a dropped login never touches the store.
//! - Failure to authenticate is an ordinary settlement that leaves the store
//!   logged out.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use storefront_api_models::UserRead;
use storefront_client::ApiFacade;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Store-owned half of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserState {
    /// Whether a user is signed in.
    pub authenticated: bool,
    /// The signed-in user, when known.
    pub current_user: Option<UserRead>,
}

impl UserState {
    /// Signed-in state for `user`.
    #[must_use]
    pub const fn signed_in(user: UserRead) -> Self {
        Self {
            authenticated: true,
            current_user: Some(user),
        }
    }
}

/// Shared authentication cell consumed by the session bootstrap.
pub trait SessionStore: Send + Sync {
    /// Current value.
    fn read(&self) -> UserState;

    /// Receiver notified whenever the value changes.
    fn subscribe(&self) -> watch::Receiver<UserState>;

    /// Attempt to authenticate; the future settles once, on success or failure.
    fn login(&self) -> BoxFuture<'static, ()>;

    /// Sign out and clear the stored user.
    fn logout(&self) -> BoxFuture<'static, ()>;
}

/// In-process store backed by a watch channel.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    cell: Arc<watch::Sender<UserState>>,
    login_user: Option<UserRead>,
}

impl MemoryStore {
    /// Store starting at `initial`; `login` settles without changing it.
    #[must_use]
    pub fn new(initial: UserState) -> Self {
        Self {
            cell: Arc::new(watch::Sender::new(initial)),
            login_user: None,
        }
    }

    /// Make `login` sign in as `user`.
    #[must_use]
    pub fn with_login_user(mut self, user: UserRead) -> Self {
        self.login_user = Some(user);
        self
    }

    /// Apply `change` and notify subscribers when it reports a modification.
    pub fn mutate(&self, change: impl FnOnce(&mut UserState) -> bool) {
        self.cell.send_if_modified(change);
    }

    /// Replace the whole value.
    pub fn set(&self, state: UserState) {
        self.cell.send_replace(state);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(UserState::default())
    }
}

impl SessionStore for MemoryStore {
    fn read(&self) -> UserState {
        self.cell.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<UserState> {
        self.cell.subscribe()
    }

    fn login(&self) -> BoxFuture<'static, ()> {
        let cell = Arc::clone(&self.cell);
        let user = self.login_user.clone();
        async move {
            if let Some(user) = user {
                cell.send_replace(UserState::signed_in(user));
            }
        }
        .boxed()
    }

    fn logout(&self) -> BoxFuture<'static, ()> {
        let cell = Arc::clone(&self.cell);
        async move {
            cell.send_replace(UserState::default());
        }
        .boxed()
    }
}

/// Store that authenticates against the API with the façade's credentials.
#[derive(Debug, Clone)]
pub struct ApiSessionStore {
    api: ApiFacade,
    cell: Arc<watch::Sender<UserState>>,
}

impl ApiSessionStore {
    /// Logged-out store over `api`.
    #[must_use]
    pub fn new(api: ApiFacade) -> Self {
        Self {
            api,
            cell: Arc::new(watch::Sender::new(UserState::default())),
        }
    }
}

impl SessionStore for ApiSessionStore {
    fn read(&self) -> UserState {
        self.cell.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<UserState> {
        self.cell.subscribe()
    }

    fn login(&self) -> BoxFuture<'static, ()> {
        let api = self.api.clone();
        let cell = Arc::clone(&self.cell);
        async move {
            match api.users().get_authenticated_user().await {
                Ok(user) => {
                    debug!(user_id = %user.id, "session authenticated");
                    cell.send_replace(UserState::signed_in(user));
                }
                Err(err) => {
                    debug!(error = %err, kind = ?err.kind(), "session check failed");
                    cell.send_replace(UserState::default());
                }
            }
        }
        .boxed()
    }

    fn logout(&self) -> BoxFuture<'static, ()> {
        let api = self.api.clone();
        let cell = Arc::clone(&self.cell);
        async move {
            if let Err(err) = api.users().logout().await {
                warn!(error = %err, "logout request failed; clearing local session anyway");
            }
            cell.send_replace(UserState::default());
        }
        .boxed()
    }
}
