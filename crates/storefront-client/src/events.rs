//! Session lifecycle notifications.
//!
//! The client never decides what "logged out" means for the embedding
//! application. It emits an event and the application reacts: route to the
//! login screen, drop per-user caches, surface a toast. Emission is
//! best-effort over a broadcast channel; having no subscribers is normal.

use tokio::sync::broadcast;
use tracing::debug;

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 16;

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// Voluntary `ApiClient::logout` call.
    UserRequested,
    /// The refresh endpoint failed, ending every queued request with it.
    RefreshFailed,
    /// A replayed request failed authentication a second time.
    AlreadyRetried,
    /// An exempt auth endpoint rejected the credential outright.
    AuthEndpointRejected,
}

impl LogoutReason {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            LogoutReason::UserRequested => "user_requested",
            LogoutReason::RefreshFailed => "refresh_failed",
            LogoutReason::AlreadyRetried => "already_retried",
            LogoutReason::AuthEndpointRejected => "auth_endpoint_rejected",
        }
    }
}

/// Events emitted by the client as the session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A refresh replaced the stored credential.
    Refreshed,
    /// The credential was cleared.
    LoggedOut { reason: LogoutReason },
}

/// Handle for emitting and subscribing to [`SessionEvent`]s.
///
/// Clones share the same underlying channel.
#[derive(Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// New receiver seeing every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!(event = ?event, "session event emitted with no subscribers");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let events = SessionEvents::new();
        let mut rx = events.subscribe();

        events.emit(SessionEvent::Refreshed);
        events.emit(SessionEvent::LoggedOut {
            reason: LogoutReason::UserRequested,
        });

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Refreshed);
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::LoggedOut {
                reason: LogoutReason::UserRequested
            }
        );
    }

    #[tokio::test]
    async fn emit_without_subscribers_does_not_panic() {
        let events = SessionEvents::new();
        events.emit(SessionEvent::Refreshed);
    }

    #[tokio::test]
    async fn clones_share_the_channel() {
        let events = SessionEvents::new();
        let clone = events.clone();
        let mut rx = events.subscribe();

        clone.emit(SessionEvent::LoggedOut {
            reason: LogoutReason::RefreshFailed,
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::LoggedOut {
                reason: LogoutReason::RefreshFailed
            }
        );
    }

    #[test]
    fn reason_labels_are_stable() {
        assert_eq!(LogoutReason::UserRequested.label(), "user_requested");
        assert_eq!(LogoutReason::RefreshFailed.label(), "refresh_failed");
        assert_eq!(LogoutReason::AlreadyRetried.label(), "already_retried");
        assert_eq!(
            LogoutReason::AuthEndpointRejected.label(),
            "auth_endpoint_rejected"
        );
    }
}
