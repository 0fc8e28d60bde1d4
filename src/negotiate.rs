//! Output format negotiation.
//!
//! A pure function of the device's capability probes: try the source's
//! native rate, then the fallback list, and size the device buffer with
//! enough headroom that a few late pump iterations do not underrun.

use crate::sink::OutputDevice;
use crate::{PlaybackConfig, PlaybackError};

/// The outcome of a successful negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    /// The sample rate the device accepted.
    pub sample_rate: u32,
    /// Device buffer size in bytes to open the sink with.
    pub buffer_bytes: usize,
}

/// Determines a supported sample rate and buffer size for the device.
///
/// Probes `preferred_rate` first, then each entry of
/// `config.fallback_rates` in order. The chosen buffer is
/// `max(min_bytes * 2, frames_per_write * 2 * 4)`: double the device
/// minimum, but never less than four write cycles of headroom - a small
/// latency cost traded for underrun resistance.
///
/// # Errors
///
/// Returns [`PlaybackError::NoSupportedRate`] when every candidate is
/// rejected. The caller disables audio for the session; this is a
/// tolerated degraded mode, not a failure it propagates.
pub fn negotiate(
    device: &dyn OutputDevice,
    preferred_rate: u32,
    config: &PlaybackConfig,
) -> Result<Negotiated, PlaybackError> {
    let mut tried = Vec::with_capacity(1 + config.fallback_rates.len());

    for &rate in std::iter::once(&preferred_rate).chain(&config.fallback_rates) {
        tried.push(rate);
        match device.min_buffer_bytes(rate) {
            Some(min_bytes) if min_bytes > 0 => {
                let buffer_bytes = (min_bytes * 2).max(config.write_headroom_bytes());
                tracing::debug!(
                    rate,
                    min_bytes,
                    buffer_bytes,
                    "negotiated output configuration"
                );
                return Ok(Negotiated {
                    sample_rate: rate,
                    buffer_bytes,
                });
            }
            _ => {
                tracing::debug!(rate, "sample rate unsupported, trying next candidate");
            }
        }
    }

    Err(PlaybackError::NoSupportedRate { tried })
}
