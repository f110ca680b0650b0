//! `whoami`: runs the session bootstrap once and prints the signed-in user.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::anyhow;
use storefront_session::{
    ApiSessionStore, Hydration, Navigator, SessionBootstrap, SessionState, require_auth,
};

use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_user;

const CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Records redirects instead of navigating.
#[derive(Debug, Default)]
struct RedirectLog {
    target: Mutex<Option<String>>,
}

impl RedirectLog {
    fn target(&self) -> Option<String> {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RedirectLog {
    fn push(&self, path: &str) {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.to_string());
    }
}

pub(crate) async fn handle_whoami(ctx: &AppContext) -> CliResult<String> {
    let store = Arc::new(ApiSessionStore::new(ctx.api.clone()));
    let bootstrap = SessionBootstrap::mount(store, Hydration::hydrated());
    settle(&bootstrap).await?;

    let redirects = RedirectLog::default();
    let state = require_auth(&bootstrap, None, &redirects);
    bootstrap.unmount();

    if let Some(target) = redirects.target() {
        tracing::debug!(redirect = %target, "session check rejected credentials");
        return Err(CliError::validation("not authenticated"));
    }
    let user = state
        .current_user
        .ok_or_else(|| CliError::failure(anyhow!("session reported no current user")))?;
    render_user(&user, ctx.format)
}

async fn settle(bootstrap: &SessionBootstrap) -> CliResult<SessionState> {
    let mut updates = bootstrap.subscribe();
    let wait = updates.wait_for(|state| state.has_checked);
    match tokio::time::timeout(CHECK_TIMEOUT, wait).await {
        Ok(Ok(state)) => Ok(state.clone()),
        Ok(Err(_)) => Err(CliError::failure(anyhow!("session bootstrap stopped"))),
        Err(_) => Err(CliError::failure(anyhow!(
            "session check timed out after {}s",
            CHECK_TIMEOUT.as_secs()
        ))),
    }
}
