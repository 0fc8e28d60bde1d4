//! Backend selection for a playback session.
//!
//! Each `start_if_needed()` call selects exactly one backend: the
//! platform's low-latency path if it comes up, else the generic
//! negotiate-open-pump path, else no audio at all. The selection is an
//! explicit tagged value, not an exception-driven control flow.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::PlaybackError;

/// Which audio path is active for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// A platform-specific low-latency output path (e.g. AAudio) that
    /// pulls samples directly; no pump thread exists.
    NativeLowLatency,

    /// The generic path: negotiated sink plus a dedicated pump thread.
    GenericStream,

    /// No audio path is active; all operations are no-ops.
    #[default]
    Disabled,
}

/// A platform low-latency output path tried before the generic stream.
///
/// Implementations wrap whatever the platform offers (AAudio, exclusive
/// WASAPI, ...). Both methods must tolerate repeated calls: the driver
/// invokes `try_start()` on every `start_if_needed()` and `stop()` on
/// every `stop()`, regardless of current state.
pub trait LowLatencyBackend: Send {
    /// Attempts to start the low-latency output path.
    ///
    /// A `BackendUnavailable` error is the normal "not on this
    /// device/OS" outcome and triggers fallback, not failure.
    fn try_start(&self) -> Result<(), PlaybackError>;

    /// Stops the low-latency output path.
    ///
    /// Must be a no-op when the path is not running.
    fn stop(&self);
}

/// Call counters recorded by [`MockNativeBackend`].
#[derive(Debug, Default)]
pub struct MockNativeCalls {
    /// Number of `try_start()` invocations.
    pub starts: AtomicUsize,
    /// Number of `stop()` invocations.
    pub stops: AtomicUsize,
}

/// A scriptable [`LowLatencyBackend`] for testing fallback selection
/// without platform audio.
pub struct MockNativeBackend {
    available: bool,
    calls: Arc<MockNativeCalls>,
}

impl MockNativeBackend {
    /// Creates a backend that starts successfully.
    pub fn available() -> Self {
        Self {
            available: true,
            calls: Arc::new(MockNativeCalls::default()),
        }
    }

    /// Creates a backend that reports itself unavailable on every start.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            calls: Arc::new(MockNativeCalls::default()),
        }
    }

    /// Returns a handle to the call counters for later inspection.
    pub fn calls(&self) -> Arc<MockNativeCalls> {
        Arc::clone(&self.calls)
    }
}

impl LowLatencyBackend for MockNativeBackend {
    fn try_start(&self) -> Result<(), PlaybackError> {
        self.calls.starts.fetch_add(1, Ordering::SeqCst);
        if self.available {
            Ok(())
        } else {
            Err(PlaybackError::BackendUnavailable {
                reason: "mock backend configured unavailable".to_string(),
            })
        }
    }

    fn stop(&self) {
        self.calls.stops.fetch_add(1, Ordering::SeqCst);
    }
}
