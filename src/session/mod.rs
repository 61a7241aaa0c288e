//! Transcode session
//!
//! A [`TranscodeSession`] runs a [`Topology`](crate::transcode::Topology) on a
//! pipeline thread. Lifecycle events flow through a channel to an
//! [`EventSink`] on a relay thread, which drives the session state and
//! signals a [`WaitHandle`] the caller polls.

pub mod events;
pub mod transcode;
pub mod wait;

pub use events::{EventSink, SessionEvent, SessionEventKind, SessionEvents};
pub use transcode::{SessionStatus, TranscodeSession};
pub use wait::WaitHandle;
