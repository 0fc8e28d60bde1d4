//! The playback lifecycle controller.
//!
//! [`AudioDriver`] owns the session state machine: `start_if_needed()`
//! and `stop()` are idempotent and never return errors. A start tries
//! the platform low-latency backend first, falls back to the generic
//! negotiate-open-pump path, and degrades to silence when neither comes
//! up. A stop tears everything down with bounded waits so an emulator
//! pause never hangs on a wedged device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::backend::LowLatencyBackend;
use crate::negotiate::negotiate;
use crate::pump::{self, PumpHandle, PumpParams, PumpStats};
use crate::sink::{OutputDevice, OutputSpec, SharedSink};
use crate::source::SharedSource;
use crate::{BackendKind, EventCallback, PlaybackConfig, PlaybackError, PlaybackEvent, SinkError};

/// How long teardown waits to acquire the sink after an abandoned pump.
const TEARDOWN_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// Whether a playback session is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No session is active; `start_if_needed()` will attempt a start.
    #[default]
    Stopped,
    /// A session is active on some backend.
    Running,
}

/// A live generic-stream session: one sink, one pump thread.
struct Session {
    running: Arc<AtomicBool>,
    handle: PumpHandle,
    sink: SharedSink,
    stats: Arc<PumpStats>,
}

/// The playback lifecycle controller.
///
/// Constructed via [`PlaybackAudio::builder()`](crate::PlaybackAudio::builder).
/// All methods take `&mut self`; the driver is single-owner by design
/// and delegates concurrency to the pump thread it manages.
///
/// Dropping a running driver stops the session first.
pub struct AudioDriver {
    source: SharedSource,
    device: Box<dyn OutputDevice>,
    native: Option<Box<dyn LowLatencyBackend>>,
    config: PlaybackConfig,
    on_event: Option<EventCallback>,
    state: PlaybackState,
    backend: BackendKind,
    session: Option<Session>,
}

impl AudioDriver {
    pub(crate) fn new(
        source: SharedSource,
        device: Box<dyn OutputDevice>,
        native: Option<Box<dyn LowLatencyBackend>>,
        config: PlaybackConfig,
        on_event: Option<EventCallback>,
    ) -> Self {
        Self {
            source,
            device,
            native,
            config,
            on_event,
            state: PlaybackState::Stopped,
            backend: BackendKind::Disabled,
            session: None,
        }
    }

    /// Starts a playback session if none is running.
    ///
    /// Calling this while running is a no-op. Failures select
    /// [`BackendKind::Disabled`] and leave the state [`PlaybackState::Stopped`],
    /// so a later call retries from scratch; nothing is returned or
    /// thrown. The worst outcome is silence.
    pub fn start_if_needed(&mut self) {
        if self.state == PlaybackState::Running {
            return;
        }

        if let Some(native) = &self.native {
            match native.try_start() {
                Ok(()) => {
                    tracing::info!("low-latency backend started");
                    self.backend = BackendKind::NativeLowLatency;
                    self.state = PlaybackState::Running;
                    return;
                }
                Err(err) => {
                    tracing::debug!("low-latency backend unavailable: {err}");
                    self.emit(PlaybackEvent::NativeFallback {
                        reason: err.to_string(),
                    });
                }
            }
        }

        match self.start_stream() {
            Ok(()) => {
                self.backend = BackendKind::GenericStream;
                self.state = PlaybackState::Running;
            }
            Err(err) => {
                tracing::warn!("audio disabled for this session: {err}");
                self.emit(PlaybackEvent::AudioDisabled {
                    reason: err.to_string(),
                });
                self.backend = BackendKind::Disabled;
            }
        }
    }

    /// Stops the current session, if any.
    ///
    /// Safe to call repeatedly and when nothing is running. Waits at
    /// most `join_timeout` for the pump thread; a thread wedged in a
    /// sink write is abandoned with a warning rather than blocking the
    /// caller. Sink teardown errors are logged and ignored.
    pub fn stop(&mut self) {
        if let Some(native) = &self.native {
            native.stop();
        }

        if let Some(session) = self.session.take() {
            session.running.store(false, Ordering::SeqCst);

            let PumpHandle { thread, done_rx } = session.handle;
            match done_rx.recv_timeout(self.config.join_timeout) {
                Ok(()) => {
                    let _ = thread.join();
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = self.config.join_timeout.as_millis() as u64,
                        "pump thread did not stop in time, abandoning"
                    );
                }
            }

            self.teardown_sink(&session.sink);
            // The sink handle drops here; if the thread was abandoned it
            // keeps its clone alive until it finally exits.
        }

        self.backend = BackendKind::Disabled;
        self.state = PlaybackState::Stopped;
    }

    /// Whether a session is currently running.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// The backend selected by the most recent `start_if_needed()`.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend
    }

    /// Pump counters for the current session.
    ///
    /// `None` unless a generic-stream session is running; the native
    /// backend pulls samples itself and has no pump to count.
    pub fn stats(&self) -> Option<Arc<PumpStats>> {
        self.session.as_ref().map(|s| Arc::clone(&s.stats))
    }

    fn start_stream(&mut self) -> Result<(), PlaybackError> {
        let source_rate = self.source.lock().sample_rate().max(1);
        let negotiated = negotiate(self.device.as_ref(), source_rate, &self.config)?;

        let spec = OutputSpec {
            sample_rate: negotiated.sample_rate,
            channels: 1,
            buffer_bytes: negotiated.buffer_bytes,
            low_latency: true,
        };
        let mut sink = self.device.open(&spec)?;
        sink.play()?;
        tracing::info!(
            sink = sink.name(),
            source_rate,
            output_rate = negotiated.sample_rate,
            buffer_bytes = negotiated.buffer_bytes,
            "generic stream session started"
        );

        let sink: SharedSink = Arc::new(Mutex::new(sink));
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(PumpStats::default());

        let handle = pump::spawn(PumpParams::new(
            Arc::clone(&self.source),
            Arc::clone(&sink),
            Arc::clone(&running),
            Arc::clone(&stats),
            source_rate,
            negotiated.sample_rate,
            &self.config,
        ))?;

        self.session = Some(Session {
            running,
            handle,
            sink,
            stats,
        });
        Ok(())
    }

    fn teardown_sink(&self, sink: &SharedSink) {
        let Some(mut guard) = sink.try_lock_for(TEARDOWN_LOCK_TIMEOUT) else {
            tracing::warn!("sink still busy during teardown, releasing without stop");
            return;
        };

        if let Err(err) = guard.pause() {
            self.teardown_error("pause", &err);
        }
        if let Err(err) = guard.flush() {
            self.teardown_error("flush", &err);
        }
        if let Err(err) = guard.stop() {
            self.teardown_error("stop", &err);
        }
    }

    fn teardown_error(&self, op: &str, err: &SinkError) {
        // Devices mid-unplug or preempted by the OS reject teardown
        // calls; the session is ending either way.
        tracing::trace!("sink {op} failed during teardown: {err}");
        self.emit(PlaybackEvent::SinkTeardownError {
            op: op.to_string(),
            error: err.to_string(),
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(callback) = &self.on_event {
            callback(event);
        }
    }
}

impl Drop for AudioDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
