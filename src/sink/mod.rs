//! Sink traits and implementations for audio output devices.
//!
//! An [`OutputDevice`] answers capability probes and opens sinks; an
//! [`AudioSink`] is one open output stream. The crate ships a real
//! device ([`CpalDevice`]) and scriptable mocks for hardware-free tests.

mod cpal_out;
mod mock;

pub use cpal_out::{CpalDevice, CpalSink};
pub use mock::{MockDevice, MockSink, MockSinkState};

use parking_lot::Mutex;
use std::sync::Arc;

use crate::SinkError;

/// Parameters for opening an output stream.
///
/// Always mono signed 16-bit PCM; the fields cover what negotiation
/// decided plus the latency hint the platform may honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    /// Negotiated output sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count; this crate always opens mono streams.
    pub channels: u16,
    /// Device buffer size in bytes, from negotiation.
    pub buffer_bytes: usize,
    /// Request the platform's low-latency performance mode if it has one.
    pub low_latency: bool,
}

/// An output device that can be probed and opened.
///
/// Models the platform's capability query plus stream construction. A
/// device outlives the sinks it opens: the driver probes and reopens on
/// every restart.
pub trait OutputDevice {
    /// Minimum buffer size in bytes the device needs for mono signed
    /// 16-bit PCM at `sample_rate`, or `None` if the rate is
    /// unsupported.
    fn min_buffer_bytes(&self, sample_rate: u32) -> Option<usize>;

    /// Opens an output stream with the given parameters.
    fn open(&self, spec: &OutputSpec) -> Result<Box<dyn AudioSink>, SinkError>;
}

/// One open audio output stream.
///
/// # Implementation Notes
///
/// - `write` must never block indefinitely: return `Ok(0)` (or a partial
///   count) when the device cannot accept more data. The pump treats
///   that as backpressure and backs off.
/// - The teardown methods (`pause`, `flush`, `stop`) are called during
///   `stop()` even if the device is in a transitional state; returning
///   an error there is fine, the driver swallows it.
/// - Resource release happens on drop.
pub trait AudioSink: Send {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Begins playback.
    fn play(&mut self) -> Result<(), SinkError>;

    /// Writes PCM frames, returning how many the device accepted.
    ///
    /// `Ok(0)` means the device buffer is full right now; it is not an
    /// error and not end-of-stream.
    fn write(&mut self, frames: &[i16]) -> Result<usize, SinkError>;

    /// Pauses playback without discarding queued audio.
    fn pause(&mut self) -> Result<(), SinkError>;

    /// Discards queued, not-yet-played audio.
    fn flush(&mut self) -> Result<(), SinkError>;

    /// Stops playback.
    fn stop(&mut self) -> Result<(), SinkError>;
}

/// A sink shared between the pump thread (writes) and the driver
/// (teardown). Exactly two holders exist, and the driver only touches
/// it after signaling the pump to exit.
pub(crate) type SharedSink = Arc<Mutex<Box<dyn AudioSink>>>;
