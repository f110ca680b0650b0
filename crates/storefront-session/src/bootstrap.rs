//! Session bootstrap state machine.
//!
//! # Design
//! - States run `Idle` → `Hydrated-Unchecked` → `Checking` → `Checked`; the
//!   published [`SessionState`] is the only observable.
//! - Before hydration the logged-out shape is reported regardless of store
//!   contents, so the first client render matches a non-interactive one.
//! - Each instance owns at most one in-flight login, guarded by a
//!   [`CancellationToken`] that is checked under the state lock before a
//!   completion is applied.
//! - Store writes made while a check is in flight (including the login's own
//!   write) do not cancel it; the check still settles and sets `has_checked`.
//! - Unmounting cancels the login and freezes the published state; nothing is
//!   written afterwards. Store and hydration are fixed per mount, so swapping
//!   either means mounting a new instance and dropping this one.

use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use storefront_api_models::UserRead;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::hydration::Hydration;
use crate::store::SessionStore;

/// Session view published to the rest of the application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Whether a user is signed in.
    pub authenticated: bool,
    /// The signed-in user, when known.
    pub current_user: Option<UserRead>,
    /// Whether a login check has completed for this instance.
    pub has_checked: bool,
    /// Whether a login check is in flight.
    pub is_checking: bool,
}

impl SessionState {
    /// Deterministic shape reported before hydration.
    #[must_use]
    pub const fn logged_out() -> Self {
        Self {
            authenticated: false,
            current_user: None,
            has_checked: false,
            is_checking: false,
        }
    }
}

/// Phase of the bootstrap state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    /// Waiting for hydration.
    Idle,
    /// Hydrated, no check started.
    HydratedUnchecked,
    /// Login in flight.
    Checking,
    /// Check settled, or skipped because the store was already authenticated.
    Checked,
}

#[derive(Default)]
struct Inner {
    has_checked: bool,
    in_flight: Option<CancellationToken>,
    unmounted: bool,
}

struct Shared {
    store: Arc<dyn SessionStore>,
    hydration: Hydration,
    inner: Mutex<Inner>,
    published: watch::Sender<SessionState>,
    unmount: CancellationToken,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &SessionState) {
        self.published.send_if_modified(|current| {
            if current == state {
                false
            } else {
                current.clone_from(state);
                true
            }
        });
    }

    fn evaluate(self: &Arc<Self>) -> SessionState {
        let mut inner = self.lock();
        if inner.unmounted {
            return self.published.borrow().clone();
        }

        let user = self.store.read();
        let hydrated = self.hydration.is_hydrated();

        if hydrated && !user.authenticated && !inner.has_checked && inner.in_flight.is_none() {
            inner.in_flight = Some(self.start_login());
        }

        let state = if hydrated {
            SessionState {
                authenticated: user.authenticated,
                current_user: user.current_user,
                has_checked: inner.has_checked,
                is_checking: inner.in_flight.is_some(),
            }
        } else {
            SessionState::logged_out()
        };
        self.publish(&state);
        state
    }

    fn start_login(self: &Arc<Self>) -> CancellationToken {
        debug!("starting session check");
        let token = self.unmount.child_token();
        let guard = token.clone();
        let login = self.store.login();
        let shared = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = guard.cancelled() => {
                    debug!("session check cancelled");
                }
                () = login => settle(&shared, &guard),
            }
        });
        token
    }

    fn unmount(&self) {
        let mut inner = self.lock();
        if inner.unmounted {
            return;
        }
        inner.unmounted = true;
        if let Some(token) = inner.in_flight.take() {
            token.cancel();
        }
        drop(inner);
        self.unmount.cancel();
        debug!("session bootstrap unmounted");
    }
}

fn settle(shared: &Weak<Shared>, token: &CancellationToken) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    {
        let mut inner = shared.lock();
        if token.is_cancelled() || inner.unmounted {
            return;
        }
        inner.in_flight = None;
        inner.has_checked = true;
    }
    debug!("session check settled");
    shared.evaluate();
}

/// Drives the login check for one consumer and publishes its session view.
///
/// Dropping the bootstrap unmounts it.
pub struct SessionBootstrap {
    shared: Arc<Shared>,
}

impl Debug for SessionBootstrap {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionBootstrap")
            .field("state", &*self.shared.published.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionBootstrap {
    /// Mount over `store` and `hydration`.
    ///
    /// Must be called inside a Tokio runtime: a watcher task re-evaluates on
    /// every hydration or store change until unmount.
    #[must_use]
    pub fn mount(store: Arc<dyn SessionStore>, hydration: Hydration) -> Self {
        let shared = Arc::new(Shared {
            store,
            hydration,
            inner: Mutex::new(Inner::default()),
            published: watch::Sender::new(SessionState::logged_out()),
            unmount: CancellationToken::new(),
        });
        spawn_watcher(&shared);
        shared.evaluate();
        Self { shared }
    }

    /// Re-read the store and hydration signal, starting a check when one is due.
    ///
    /// Repeated calls without an intervening change return the same state.
    pub fn evaluate(&self) -> SessionState {
        self.shared.evaluate()
    }

    /// Last published state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.published.borrow().clone()
    }

    /// Current phase, derived from the last published state.
    #[must_use]
    pub fn phase(&self) -> BootstrapPhase {
        let state = self.shared.published.borrow();
        if !self.shared.hydration.is_hydrated() {
            BootstrapPhase::Idle
        } else if state.is_checking {
            BootstrapPhase::Checking
        } else if state.has_checked || state.authenticated {
            BootstrapPhase::Checked
        } else {
            BootstrapPhase::HydratedUnchecked
        }
    }

    /// Receiver of published states.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.published.subscribe()
    }

    /// Published states as a stream, starting with the current one.
    #[must_use]
    pub fn updates(&self) -> WatchStream<SessionState> {
        WatchStream::new(self.subscribe())
    }

    /// Cancel any in-flight check and stop publishing.
    pub fn unmount(&self) {
        self.shared.unmount();
    }

    /// Whether [`Self::unmount`] has run.
    #[must_use]
    pub fn is_unmounted(&self) -> bool {
        self.shared.lock().unmounted
    }
}

impl Drop for SessionBootstrap {
    fn drop(&mut self) {
        self.shared.unmount();
    }
}

fn spawn_watcher(shared: &Arc<Shared>) {
    let mut hydration = shared.hydration.subscribe();
    let mut store = shared.store.subscribe();
    let unmounted = shared.unmount.clone();
    let weak = Arc::downgrade(shared);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = unmounted.cancelled() => break,
                Ok(()) = hydration.changed() => {}
                Ok(()) = store.changed() => {}
                else => break,
            }
            let Some(shared) = weak.upgrade() else {
                break;
            };
            shared.evaluate();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, UserState};
    use futures_util::FutureExt;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use storefront_test_support::fixtures;
    use tokio::sync::oneshot;
    use tokio_stream::StreamExt;

    /// Store whose `login` waits until the test releases it.
    struct ScriptedStore {
        memory: MemoryStore,
        logins: AtomicUsize,
        pending: Mutex<Vec<oneshot::Receiver<Option<UserRead>>>>,
    }

    impl ScriptedStore {
        fn new(initial: UserState) -> (Arc<Self>, oneshot::Sender<Option<UserRead>>) {
            let (release, pending) = oneshot::channel();
            let store = Arc::new(Self {
                memory: MemoryStore::new(initial),
                logins: AtomicUsize::new(0),
                pending: Mutex::new(vec![pending]),
            });
            (store, release)
        }

        fn logins(&self) -> usize {
            self.logins.load(Ordering::SeqCst)
        }
    }

    impl SessionStore for ScriptedStore {
        fn read(&self) -> UserState {
            self.memory.read()
        }

        fn subscribe(&self) -> watch::Receiver<UserState> {
            self.memory.subscribe()
        }

        fn login(&self) -> BoxFuture<'static, ()> {
            self.logins.fetch_add(1, Ordering::SeqCst);
            let pending = self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop();
            let memory = self.memory.clone();
            async move {
                if let Some(pending) = pending
                    && let Ok(Some(user)) = pending.await
                {
                    memory.set(UserState::signed_in(user));
                }
            }
            .boxed()
        }

        fn logout(&self) -> BoxFuture<'static, ()> {
            self.memory.logout()
        }
    }

    fn user(id: &str) -> serde_json::Result<UserRead> {
        serde_json::from_value(fixtures::user_json(id))
    }

    async fn wait_for(
        bootstrap: &SessionBootstrap,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> anyhow::Result<SessionState> {
        let mut updates = bootstrap.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(2), updates.wait_for(predicate))
            .await??
            .clone();
        Ok(state)
    }

    #[tokio::test]
    async fn reports_logged_out_before_hydration_regardless_of_store() -> anyhow::Result<()> {
        let (store, _release) = ScriptedStore::new(UserState::signed_in(user("usr_1")?));
        let bootstrap = SessionBootstrap::mount(store.clone(), Hydration::new());

        assert_eq!(bootstrap.evaluate(), SessionState::logged_out());
        assert_eq!(bootstrap.phase(), BootstrapPhase::Idle);
        assert_eq!(store.logins(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unauthenticated_store_is_not_checked_before_hydration() {
        let (store, _release) = ScriptedStore::new(UserState::default());
        let bootstrap = SessionBootstrap::mount(store.clone(), Hydration::new());

        for _ in 0..3 {
            assert_eq!(bootstrap.evaluate(), SessionState::logged_out());
        }
        assert_eq!(store.logins(), 0);
    }

    #[tokio::test]
    async fn checks_once_after_hydration_and_settles() -> anyhow::Result<()> {
        let (store, release) = ScriptedStore::new(UserState::default());
        let hydration = Hydration::new();
        let bootstrap = SessionBootstrap::mount(store.clone(), hydration.clone());

        hydration.mark_hydrated();
        let checking = bootstrap.evaluate();
        assert!(checking.is_checking);
        assert!(!checking.has_checked);
        assert_eq!(bootstrap.phase(), BootstrapPhase::Checking);
        assert_eq!(store.logins(), 1);

        release
            .send(None)
            .map_err(|_| anyhow::anyhow!("login future dropped early"))?;
        let settled = wait_for(&bootstrap, |state| state.has_checked).await?;
        assert!(!settled.is_checking);
        assert!(!settled.authenticated);
        assert_eq!(bootstrap.phase(), BootstrapPhase::Checked);

        for _ in 0..3 {
            assert_eq!(bootstrap.evaluate(), settled);
        }
        assert_eq!(store.logins(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn successful_login_publishes_the_user() -> anyhow::Result<()> {
        let (store, release) = ScriptedStore::new(UserState::default());
        let bootstrap = SessionBootstrap::mount(store.clone(), Hydration::hydrated());
        assert!(bootstrap.state().is_checking);

        release
            .send(Some(user("usr_7")?))
            .map_err(|_| anyhow::anyhow!("login future dropped early"))?;
        let settled = wait_for(&bootstrap, |state| state.has_checked).await?;
        assert!(settled.authenticated);
        assert!(!settled.is_checking);
        assert_eq!(
            settled.current_user.map(|user| user.id),
            Some("usr_7".to_string())
        );
        assert_eq!(bootstrap.evaluate(), bootstrap.state());
        assert_eq!(store.logins(), 1);
        Ok(())
    }

    /// Store whose `login` signs in and then keeps running for a while.
    struct SlowSettlingStore {
        memory: MemoryStore,
        user: UserRead,
    }

    impl SessionStore for SlowSettlingStore {
        fn read(&self) -> UserState {
            self.memory.read()
        }

        fn subscribe(&self) -> watch::Receiver<UserState> {
            self.memory.subscribe()
        }

        fn login(&self) -> BoxFuture<'static, ()> {
            let memory = self.memory.clone();
            let user = self.user.clone();
            async move {
                memory.set(UserState::signed_in(user));
                tokio::task::yield_now().await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            .boxed()
        }

        fn logout(&self) -> BoxFuture<'static, ()> {
            self.memory.logout()
        }
    }

    #[tokio::test]
    async fn login_that_writes_before_settling_still_marks_checked() -> anyhow::Result<()> {
        let store = Arc::new(SlowSettlingStore {
            memory: MemoryStore::default(),
            user: user("usr_9")?,
        });
        let bootstrap = SessionBootstrap::mount(store, Hydration::hydrated());

        let mid_check = wait_for(&bootstrap, |state| state.authenticated).await?;
        assert!(!mid_check.has_checked);

        let settled = wait_for(&bootstrap, |state| state.has_checked).await?;
        assert!(settled.authenticated);
        assert!(!settled.is_checking);
        assert_eq!(bootstrap.phase(), BootstrapPhase::Checked);
        Ok(())
    }

    #[tokio::test]
    async fn authenticated_store_skips_the_check() -> anyhow::Result<()> {
        let (store, _release) = ScriptedStore::new(UserState::signed_in(user("usr_1")?));
        let bootstrap = SessionBootstrap::mount(store.clone(), Hydration::hydrated());

        let state = bootstrap.evaluate();
        assert!(state.authenticated);
        assert!(!state.is_checking);
        assert!(!state.has_checked);
        assert_eq!(bootstrap.phase(), BootstrapPhase::Checked);
        assert_eq!(store.logins(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unmount_cancels_and_freezes_state() -> anyhow::Result<()> {
        let (store, mut release) = ScriptedStore::new(UserState::default());
        let bootstrap = SessionBootstrap::mount(store.clone(), Hydration::hydrated());
        let mut updates = bootstrap.subscribe();
        assert!(updates.borrow_and_update().is_checking);

        bootstrap.unmount();
        tokio::time::timeout(Duration::from_secs(2), release.closed()).await?;

        assert!(bootstrap.is_unmounted());
        assert!(!updates.has_changed()?);
        let frozen = bootstrap.evaluate();
        assert!(frozen.is_checking);
        assert!(!frozen.has_checked);
        assert_eq!(store.logins(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn dropping_the_bootstrap_cancels_the_login() -> anyhow::Result<()> {
        let (store, mut release) = ScriptedStore::new(UserState::default());
        let bootstrap = SessionBootstrap::mount(store.clone(), Hydration::hydrated());
        drop(bootstrap);

        tokio::time::timeout(Duration::from_secs(2), release.closed()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn external_sign_in_mid_check_lets_the_check_settle() -> anyhow::Result<()> {
        let (store, release) = ScriptedStore::new(UserState::default());
        let bootstrap = SessionBootstrap::mount(store.clone(), Hydration::hydrated());
        assert!(bootstrap.state().is_checking);

        store.memory.set(UserState::signed_in(user("usr_2")?));
        let state = bootstrap.evaluate();
        assert!(state.authenticated);
        assert!(state.is_checking);
        assert!(!state.has_checked);

        release
            .send(None)
            .map_err(|_| anyhow::anyhow!("login future dropped early"))?;
        let settled = wait_for(&bootstrap, |state| state.has_checked).await?;
        assert!(settled.authenticated);
        assert!(!settled.is_checking);
        assert_eq!(store.logins(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn hydration_change_is_picked_up_by_the_watcher() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::default());
        let hydration = Hydration::new();
        let bootstrap = SessionBootstrap::mount(store, hydration.clone());
        let mut updates = bootstrap.updates();
        assert_eq!(updates.next().await, Some(SessionState::logged_out()));

        hydration.mark_hydrated();
        let settled = wait_for(&bootstrap, |state| state.has_checked).await?;
        assert!(!settled.authenticated);
        Ok(())
    }
}
