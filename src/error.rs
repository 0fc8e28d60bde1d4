//! Error types for playback-audio.
//!
//! Errors are split into two categories:
//! - [`PlaybackError`]: construction and session-start failures. The
//!   lifecycle operations (`start_if_needed`/`stop`) swallow these and
//!   degrade to silence; they surface only from the builder and to
//!   [`LowLatencyBackend`](crate::LowLatencyBackend) implementors.
//! - [`SinkError`]: device-level failures from an [`AudioSink`](crate::AudioSink)
//!   implementation. During teardown these are caught and logged, never
//!   propagated.

/// Errors that can occur while building a driver or bringing up a session.
///
/// None of these reach the public lifecycle surface: `start_if_needed()`
/// logs the failure, leaves the session disabled, and returns normally.
/// The worst user-visible outcome is silence.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// No sample source was configured before `build()`.
    #[error("no sample source configured - call source() before build()")]
    NoSourceConfigured,

    /// The platform low-latency path is not present or failed to start.
    ///
    /// Recovered locally by falling back to the generic stream backend.
    #[error("low-latency backend unavailable: {reason}")]
    BackendUnavailable {
        /// Why the backend could not start.
        reason: String,
    },

    /// No candidate sample rate is supported by the output device.
    ///
    /// Recovered by leaving the session disabled for its lifetime.
    #[error("no supported output sample rate (tried {tried:?})")]
    NoSupportedRate {
        /// Sample rates that were probed, in order.
        tried: Vec<u32>,
    },

    /// The negotiated sink could not be opened or started.
    #[error("sink failed to initialize: {0}")]
    SinkInit(#[from] SinkError),
}

/// Errors raised by an [`AudioSink`](crate::AudioSink) or
/// [`OutputDevice`](crate::OutputDevice) implementation.
///
/// Write-side errors are treated as transient backpressure by the pump;
/// teardown-side errors are swallowed by the driver.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The requested output format is not supported by the device.
    #[error("unsupported output format: {reason}")]
    Unsupported {
        /// What the device rejected.
        reason: String,
    },

    /// An operation was invoked while the device is in the wrong state
    /// (for example, pausing a sink whose stream already shut down).
    #[error("sink in invalid state for {op}")]
    InvalidState {
        /// The operation that was rejected.
        op: String,
    },

    /// An error from the underlying audio library.
    #[error("audio backend error: {0}")]
    Backend(String),

    /// Custom error for user-implemented sinks.
    #[error("{0}")]
    Custom(String),
}

impl SinkError {
    /// Creates a custom sink error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates an invalid-state error for the given operation.
    pub fn invalid_state(op: impl Into<String>) -> Self {
        Self::InvalidState { op: op.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_error_display() {
        let err = PlaybackError::NoSupportedRate {
            tried: vec![32768, 48000, 44100],
        };
        assert_eq!(
            err.to_string(),
            "no supported output sample rate (tried [32768, 48000, 44100])"
        );
    }

    #[test]
    fn test_sink_error_custom() {
        let err = SinkError::custom("device unplugged");
        assert_eq!(err.to_string(), "device unplugged");
    }

    #[test]
    fn test_sink_error_invalid_state() {
        let err = SinkError::invalid_state("pause");
        assert_eq!(err.to_string(), "sink in invalid state for pause");
    }

    #[test]
    fn test_sink_error_converts_to_playback_error() {
        let err: PlaybackError = SinkError::custom("boom").into();
        assert!(matches!(err, PlaybackError::SinkInit(_)));
    }
}
