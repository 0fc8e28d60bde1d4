//! Configuration for playback sessions.

use std::time::Duration;

/// Bytes per sample for mono signed 16-bit PCM.
pub(crate) const BYTES_PER_SAMPLE: usize = 2;

/// Configuration for playback behavior.
///
/// Use [`PlaybackConfig::default()`] for the values the original hardware
/// targets were tuned with, or customize as needed.
///
/// # Example
///
/// ```
/// use playback_audio::PlaybackConfig;
/// use std::time::Duration;
///
/// let config = PlaybackConfig {
///     frames_per_write: 512,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Number of frames produced and written per pump iteration.
    ///
    /// Smaller values reduce latency but increase write overhead.
    /// Default: 256
    pub frames_per_write: usize,

    /// Capacity of the staging buffer used for interpolation continuity.
    ///
    /// Must comfortably exceed `frames_per_write * step` so a single
    /// refill covers an output chunk. Default: 512
    pub staging_capacity: usize,

    /// Sample rates probed, in order, when the source's native rate is
    /// not supported by the output device.
    ///
    /// Default: 48000 then 44100
    pub fallback_rates: Vec<u32>,

    /// How long the pump sleeps after the sink rejects a write.
    ///
    /// This bounds the retry rate under device backpressure without
    /// busy-spinning. Default: 5ms
    pub backpressure_sleep: Duration,

    /// How long `stop()` waits for the pump thread to observe the stop
    /// flag and exit before abandoning it.
    ///
    /// The thread observes the flag within one iteration, so this only
    /// triggers if a sink write wedged. Default: 500ms
    pub join_timeout: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frames_per_write: 256,
            staging_capacity: 512,
            fallback_rates: vec![48_000, 44_100],
            backpressure_sleep: Duration::from_millis(5),
            join_timeout: Duration::from_millis(500),
        }
    }
}

impl PlaybackConfig {
    /// Minimum sink buffer size in bytes that guarantees headroom for
    /// four write cycles at the configured chunk size.
    pub(crate) fn write_headroom_bytes(&self) -> usize {
        self.frames_per_write * BYTES_PER_SAMPLE * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PlaybackConfig::default();
        assert_eq!(config.frames_per_write, 256);
        assert_eq!(config.staging_capacity, 512);
        assert_eq!(config.fallback_rates, vec![48_000, 44_100]);
        assert_eq!(config.backpressure_sleep, Duration::from_millis(5));
        assert_eq!(config.join_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_write_headroom_covers_four_chunks() {
        let config = PlaybackConfig::default();
        assert_eq!(config.write_headroom_bytes(), 256 * 2 * 4);
    }
}
