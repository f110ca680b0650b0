//! One-shot hydration signal.

use std::sync::Arc;

use tokio::sync::watch;

/// Flag that starts `false` and flips to `true` at most once.
#[derive(Debug, Clone)]
pub struct Hydration {
    cell: Arc<watch::Sender<bool>>,
}

impl Hydration {
    /// Signal in the not-yet-hydrated state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Arc::new(watch::Sender::new(false)),
        }
    }

    /// Signal that is already hydrated.
    #[must_use]
    pub fn hydrated() -> Self {
        let signal = Self::new();
        signal.mark_hydrated();
        signal
    }

    /// Flip the flag; returns `true` only for the call that changed it.
    pub fn mark_hydrated(&self) -> bool {
        self.cell.send_if_modified(|hydrated| {
            if *hydrated {
                false
            } else {
                *hydrated = true;
                true
            }
        })
    }

    /// Current value.
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        *self.cell.borrow()
    }

    /// Receiver notified when the flag flips.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.cell.subscribe()
    }
}

impl Default for Hydration {
    fn default() -> Self {
        Self::new()
    }
}
