//! Route guard redirecting anonymous users once the session check settles.

use crate::bootstrap::{SessionBootstrap, SessionState};

/// Destination used when the caller supplies none.
pub const DEFAULT_REDIRECT: &str = "/";

/// Navigation side effect.
pub trait Navigator {
    /// Navigate to `path`.
    fn push(&self, path: &str);
}

/// Whether `state` calls for a redirect: the check has settled and nobody is
/// signed in.
#[must_use]
pub const fn should_redirect(state: &SessionState) -> bool {
    state.has_checked && !state.is_checking && !state.authenticated
}

/// Evaluate the session and redirect to `redirect_to` (default `/`) when the
/// check has settled without an authenticated user.
///
/// Never redirects while a check is in flight.
pub fn require_auth(
    session: &SessionBootstrap,
    redirect_to: Option<&str>,
    navigator: &dyn Navigator,
) -> SessionState {
    let state = session.evaluate();
    if should_redirect(&state) {
        let target = redirect_to.unwrap_or(DEFAULT_REDIRECT);
        tracing::debug!(target_path = target, "redirecting unauthenticated session");
        navigator.push(target);
    }
    state
}
