use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::unbounded_channel;

use crate::duration::WindowsTimeUnits;
use crate::error::{EncodeError, Result};
use crate::profile::{aac_quality_bytes_per_second, TranscodeProfile};
use crate::source::MediaSource;
use crate::transcode::{PipelineControl, Topology};

use super::events::{EventSink, SessionEvents};
use super::wait::WaitHandle;

/// Lifecycle of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionStatus {
    /// Built but not started
    Pending,
    Running,
    /// All input encoded, close requested
    Ended,
    Closed,
    Failed,
}

/// State shared between the session, the relay thread and the caller.
pub(crate) struct SessionState {
    status: Mutex<SessionStatus>,
    error: Mutex<Option<EncodeError>>,
    control: PipelineControl,
    done: WaitHandle,
}

impl SessionState {
    fn new(control: PipelineControl) -> Self {
        Self {
            status: Mutex::new(SessionStatus::Pending),
            error: Mutex::new(None),
            control,
            done: WaitHandle::new(),
        }
    }

    pub(crate) fn status(&self) -> SessionStatus {
        *self.status.lock()
    }

    /// Move to `next` unless the session is already at or past it.
    fn advance(&self, next: SessionStatus) -> bool {
        let mut status = self.status.lock();
        if *status >= next {
            return false;
        }
        *status = next;
        true
    }
}

impl SessionEvents for SessionState {
    fn on_session_ended(&self) {
        if self.advance(SessionStatus::Ended) {
            tracing::debug!("session ended, closing");
            self.control.request_close();
        }
    }

    fn on_session_closed(&self) {
        if self.advance(SessionStatus::Closed) {
            tracing::debug!("session closed");
        }
        self.done.set();
    }

    fn on_error(&self, error: EncodeError) {
        if self.advance(SessionStatus::Failed) {
            tracing::debug!(error = %error, "session failed");
            self.error.lock().get_or_insert(error);
        }
        self.control.request_close();
        self.done.set();
    }
}

/// Transcodes one media source into an AAC / MPEG-4 file.
pub struct TranscodeSession {
    state: Arc<SessionState>,
    topology: Option<Topology>,
    profile: TranscodeProfile,
    duration: WindowsTimeUnits,
    pipeline: Option<JoinHandle<()>>,
    relay: Option<JoinHandle<()>>,
}

impl TranscodeSession {
    /// Create a session for `source` at the given quality level (1 to 4).
    pub fn new(source: MediaSource, output: &Path, quality: i32) -> Result<Self> {
        let attributes = source.attributes();
        let profile = TranscodeProfile::aac(
            attributes.bits_per_sample,
            attributes.samples_per_second,
            attributes.channels,
            aac_quality_bytes_per_second(quality),
        );
        Self::with_profile(source, output, profile)
    }

    /// Create a session with an explicit profile.
    pub fn with_profile(
        source: MediaSource,
        output: &Path,
        profile: TranscodeProfile,
    ) -> Result<Self> {
        let duration = source.attributes().duration;
        let topology = Topology::build(source, output, &profile)?;

        Ok(Self {
            state: Arc::new(SessionState::new(PipelineControl::new())),
            topology: Some(topology),
            profile,
            duration,
            pipeline: None,
            relay: None,
        })
    }

    pub fn profile(&self) -> &TranscodeProfile {
        &self.profile
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    /// Arm the event relay and start the pipeline.
    pub fn start(&mut self) -> Result<()> {
        let topology = self
            .topology
            .take()
            .ok_or_else(|| EncodeError::Session("session already started".into()))?;

        let (tx, rx) = unbounded_channel();
        let sink = EventSink::new(self.state.clone(), rx);
        self.relay = Some(
            std::thread::Builder::new()
                .name("session-events".into())
                .spawn(move || sink.run())?,
        );

        self.state.advance(SessionStatus::Running);

        let control = self.state.control.clone();
        let pipeline = std::thread::Builder::new()
            .name("session-pipeline".into())
            .spawn(move || topology.run(&control, &tx));
        match pipeline {
            Ok(handle) => {
                self.pipeline = Some(handle);
                Ok(())
            }
            Err(e) => {
                // The relay sees its queue close and stops on its own.
                self.state.advance(SessionStatus::Failed);
                Err(e.into())
            }
        }
    }

    /// Wait up to `timeout` for the session to finish.
    ///
    /// Returns `Ok(true)` once the output is closed, `Ok(false)` on timeout,
    /// and the session's error if it failed.
    pub fn wait(&self, timeout: Duration) -> Result<bool> {
        if !self.state.done.wait(timeout) {
            return Ok(false);
        }
        if let Some(error) = self.state.error.lock().take() {
            return Err(error);
        }
        match self.state.status() {
            SessionStatus::Failed => Err(EncodeError::Session("transcode failed".into())),
            _ => Ok(true),
        }
    }

    /// Current presentation time. Zero until the first packet is read.
    pub fn position(&self) -> WindowsTimeUnits {
        self.state
            .control
            .position()
            .unwrap_or(WindowsTimeUnits::ZERO)
    }

    /// Fraction of the source processed, from 0.0 to 1.0.
    pub fn progress(&self) -> f32 {
        progress_fraction(self.position(), self.duration)
    }
}

impl Drop for TranscodeSession {
    fn drop(&mut self) {
        if !matches!(
            self.state.status(),
            SessionStatus::Closed | SessionStatus::Failed
        ) {
            self.state.control.request_abort();
        }
        if let Some(handle) = self.pipeline.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.relay.take() {
            let _ = handle.join();
        }
    }
}

fn progress_fraction(position: WindowsTimeUnits, duration: WindowsTimeUnits) -> f32 {
    if duration.ticks() <= 0 {
        return 0.0;
    }
    (position.ticks() as f64 / duration.ticks() as f64).clamp(0.0, 1.0) as f32
}
