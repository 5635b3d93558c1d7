//! A subscriber's handle on the published session state.

use sessionlink_protocol::User;
use tokio::sync::watch;

use crate::SessionState;

/// Observes [`SessionState`] as the controller publishes it.
///
/// Backed by a `tokio::sync::watch` channel: the current value is always
/// available (a new subscriber sees it immediately), and a slow reader
/// skips straight to the latest value instead of queueing old ones. Use
/// [`SessionController::events`](crate::SessionController::events) when
/// every transition matters.
///
/// A published `Failed` state does NOT close the stream. Once the
/// controller is dropped, `changed` and `wait_for` return `None`.
#[derive(Debug, Clone)]
pub struct SessionWatch {
    rx: watch::Receiver<SessionState>,
}

impl SessionWatch {
    pub(crate) fn new(rx: watch::Receiver<SessionState>) -> Self {
        Self { rx }
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Snapshot of the current user.
    pub fn user(&self) -> Option<User> {
        self.rx.borrow().user().cloned()
    }

    /// Waits for the next published state and returns it.
    ///
    /// Returns `None` once the controller is gone.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Waits until the state satisfies `predicate` (checking the current
    /// value first) and returns it.
    ///
    /// Returns `None` if the controller is dropped before that happens.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> Option<SessionState> {
        self.rx.wait_for(predicate).await.ok().map(|state| state.clone())
    }
}
