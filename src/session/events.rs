//! Session lifecycle events and the relay that dispatches them

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::{EncodeError, Result};

/// Kind of a session lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    Started,
    Ended,
    Closed,
}

/// An event raised by the running topology, with its status.
#[derive(Debug)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub status: Result<()>,
}

impl SessionEvent {
    pub fn started(status: Result<()>) -> Self {
        Self {
            kind: SessionEventKind::Started,
            status,
        }
    }

    pub fn ended(status: Result<()>) -> Self {
        Self {
            kind: SessionEventKind::Ended,
            status,
        }
    }

    pub fn closed(status: Result<()>) -> Self {
        Self {
            kind: SessionEventKind::Closed,
            status,
        }
    }
}

/// Receiver of the relayed session events.
pub trait SessionEvents: Send + Sync {
    /// All input has been encoded; the session should be closed.
    fn on_session_ended(&self);

    /// The output is finalized.
    fn on_session_closed(&self);

    /// The session failed. No further events are delivered.
    fn on_error(&self, error: EncodeError);
}

/// Pulls events off the session's queue one at a time and dispatches them to
/// a [`SessionEvents`] handler.
pub struct EventSink<H: SessionEvents> {
    handler: Arc<H>,
    events: UnboundedReceiver<SessionEvent>,
}

impl<H: SessionEvents> EventSink<H> {
    pub fn new(handler: Arc<H>, events: UnboundedReceiver<SessionEvent>) -> Self {
        Self { handler, events }
    }

    /// Handle one event. Returns whether the sink should wait for another.
    pub fn invoke(&self, event: SessionEvent) -> bool {
        tracing::debug!(kind = ?event.kind, ok = event.status.is_ok(), "session event");

        if let Err(e) = event.status {
            self.handler.on_error(e);
            return false;
        }

        match event.kind {
            SessionEventKind::Started => true,
            SessionEventKind::Ended => {
                self.handler.on_session_ended();
                true
            }
            SessionEventKind::Closed => {
                self.handler.on_session_closed();
                false
            }
        }
    }

    /// Relay events until the session is closed or fails.
    pub fn run(mut self) {
        while let Some(event) = self.begin_get_event() {
            if !self.invoke(event) {
                return;
            }
        }
        self.handler.on_error(EncodeError::Session(
            "session stopped before it was closed".into(),
        ));
    }

    fn begin_get_event(&mut self) -> Option<SessionEvent> {
        self.events.blocking_recv()
    }
}
