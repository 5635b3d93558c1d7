//! The completion broadcast: "the external login UI just finished".
//!
//! One [`CompletionEvents`] lives inside each provider. Every subscriber
//! gets every signal fired after it subscribed, in emission order. There
//! is no replay: a signal fired while nobody listens is gone.

use sessionlink_protocol::CompletionSignal;
use tokio::sync::broadcast;

/// Typed emitter for [`CompletionSignal`]s.
///
/// Cloning is cheap and every clone feeds the same channel.
#[derive(Debug, Clone)]
pub struct CompletionEvents {
    sender: broadcast::Sender<CompletionSignal>,
}

impl CompletionEvents {
    /// Buffer size per subscriber. A subscriber that falls further behind
    /// than this sees `RecvError::Lagged` and skips the oldest signals.
    pub const DEFAULT_CAPACITY: usize = 16;

    /// Creates an emitter with [`Self::DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates an emitter with a custom per-subscriber buffer.
    ///
    /// A capacity of 0 is bumped to 1; `broadcast::channel` panics on 0.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Fires one signal. Returns how many subscribers it reached.
    pub fn notify(&self) -> usize {
        match self.sender.send(CompletionSignal) {
            Ok(reached) => {
                tracing::debug!(reached, "completion signal fired");
                reached
            }
            Err(_) => {
                tracing::debug!("completion signal fired with no subscribers");
                0
            }
        }
    }

    /// Subscribes to signals fired from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CompletionSignal> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for CompletionEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_notify_without_subscribers_reaches_nobody() {
        let events = CompletionEvents::new();
        assert_eq!(events.notify(), 0);
    }

    #[test]
    fn test_notify_reaches_every_subscriber() {
        let events = CompletionEvents::new();
        let mut a = events.subscribe();
        let mut b = events.subscribe();

        assert_eq!(events.notify(), 2);

        assert_eq!(a.try_recv(), Ok(CompletionSignal));
        assert_eq!(b.try_recv(), Ok(CompletionSignal));
    }

    #[test]
    fn test_subscribe_does_not_replay_earlier_signals() {
        let events = CompletionEvents::new();
        let _early = events.subscribe();
        events.notify();

        let mut late = events.subscribe();

        assert_eq!(late.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_subscriber_count_tracks_drops() {
        let events = CompletionEvents::new();
        let rx = events.subscribe();
        assert_eq!(events.subscriber_count(), 1);

        drop(rx);

        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn test_clones_share_one_channel() {
        let events = CompletionEvents::new();
        let mut rx = events.subscribe();

        events.clone().notify();

        assert_eq!(rx.try_recv(), Ok(CompletionSignal));
    }

    #[test]
    fn test_with_capacity_zero_does_not_panic() {
        let events = CompletionEvents::with_capacity(0);
        let mut rx = events.subscribe();
        events.notify();
        assert_eq!(rx.try_recv(), Ok(CompletionSignal));
    }
}
