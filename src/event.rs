//! Runtime events for monitoring session health.
//!
//! Events are non-fatal notifications about degraded modes. The driver
//! keeps going after emitting one - they exist for logging and metrics,
//! not error handling.

use std::sync::Arc;

/// Runtime events emitted by the driver.
///
/// These are informational, never errors. Register an [`EventCallback`]
/// via [`PlaybackAudioBuilder::on_event()`] to observe them.
///
/// [`PlaybackAudioBuilder::on_event()`]: crate::PlaybackAudioBuilder::on_event
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// The platform low-latency backend was unavailable and the driver
    /// fell back to the generic stream path.
    NativeFallback {
        /// Why the low-latency backend could not start.
        reason: String,
    },

    /// No output configuration could be negotiated; the session stays
    /// silent until the next `start_if_needed()`.
    AudioDisabled {
        /// Why the session was disabled.
        reason: String,
    },

    /// A sink teardown operation failed during `stop()` and was ignored.
    ///
    /// Expected when the device was already in a transitional state
    /// (unplugged, preempted). Teardown continues regardless.
    SinkTeardownError {
        /// The teardown operation that failed (`pause`, `flush`, `stop`).
        op: String,
        /// Description of the failure.
        error: String,
    },
}

/// Callback type for receiving runtime events.
///
/// The callback may be invoked from the owning context during
/// `start_if_needed()`/`stop()`; keep it cheap and non-blocking.
pub type EventCallback = Arc<dyn Fn(PlaybackEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use playback_audio::{event_callback, PlaybackEvent};
///
/// let callback = event_callback(|event| {
///     tracing::warn!(?event, "playback event");
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(PlaybackEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}
