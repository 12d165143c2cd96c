//! Operator-facing session events
//!
//! The core never presents anything itself. Hosts receive these on an
//! unbounded channel and decide how to surface them.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::fallback::FallbackReason;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// `init()` ran before the readiness gate opened
    NotReady,
    /// Loading the test or document failed; the session is over
    LoadFailed { message: String },
    /// Automation stopped and a human has to finish the test
    ManualFallback { reason: FallbackReason },
    /// The adapter reported ERROR for one assertion
    AdapterError { index: usize, message: String },
}

pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Sending half of the operator channel; a no-op when nobody listens
#[derive(Debug, Clone, Default)]
pub struct Events(Option<mpsc::UnboundedSender<SessionEvent>>);

impl Events {
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(Some(tx)), rx)
    }

    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_receiver() {
        let (events, mut rx) = Events::channel();
        events.emit(SessionEvent::NotReady);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::NotReady);
    }

    #[test]
    fn test_disabled_and_closed_are_silent() {
        Events::disabled().emit(SessionEvent::NotReady);
        let (events, rx) = Events::channel();
        drop(rx);
        events.emit(SessionEvent::NotReady);
    }
}
