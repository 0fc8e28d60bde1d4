//! Mock sample source for testing without an emulation core.

use std::collections::VecDeque;
use std::time::Duration;

use super::SampleSource;

/// A mock sample source that serves queued synthetic audio.
///
/// This allows testing the full pipeline without a running core, making
/// it suitable for CI environments. Once the queue drains, reads return
/// zero frames - the same shape a starved core produces.
///
/// # Example
///
/// ```
/// use playback_audio::{MockSource, SampleSource};
///
/// let mut mock = MockSource::new(32_768);
///
/// // Queue 100ms of silence followed by a 440Hz tone
/// mock.generate_silence(100);
/// mock.generate_sine(440.0, 100);
///
/// let mut buf = [0i16; 256];
/// let got = mock.read_frames(&mut buf);
/// assert_eq!(got, 256);
/// ```
pub struct MockSource {
    sample_rate: u32,
    samples: VecDeque<i16>,
}

impl MockSource {
    /// Creates a mock source with the given native sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: VecDeque::new(),
        }
    }

    /// Queues silence for the given duration in milliseconds.
    pub fn generate_silence(&mut self, duration_ms: u64) {
        let num_samples = self.samples_for_duration(duration_ms);
        self.samples.extend(std::iter::repeat(0i16).take(num_samples));
    }

    /// Queues a sine wave at the given frequency for the given duration.
    pub fn generate_sine(&mut self, frequency: f64, duration_ms: u64) {
        let num_samples = self.samples_for_duration(duration_ms);
        let sample_rate = f64::from(self.sample_rate);

        for i in 0..num_samples {
            let t = i as f64 / sample_rate;
            let value = (2.0 * std::f64::consts::PI * frequency * t).sin();
            self.samples.push_back((value * 32767.0) as i16);
        }
    }

    /// Queues a linear ramp of `len` samples scaled by `slope`.
    ///
    /// Useful for asserting interpolation output: a ramp in produces a
    /// ramp out, scaled by the resampling step.
    pub fn generate_ramp(&mut self, len: usize, slope: i16) {
        for i in 0..len {
            self.samples.push_back((i as i16).wrapping_mul(slope));
        }
    }

    /// Queues raw samples directly.
    pub fn add_samples(&mut self, samples: &[i16]) {
        self.samples.extend(samples.iter().copied());
    }

    /// Returns the number of frames still queued.
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }

    /// Returns the duration of the queued samples.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    fn samples_for_duration(&self, duration_ms: u64) -> usize {
        (u64::from(self.sample_rate) * duration_ms / 1000) as usize
    }
}

impl SampleSource for MockSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_frames(&mut self, out: &mut [i16]) -> usize {
        let mut got = 0;
        for slot in out.iter_mut() {
            match self.samples.pop_front() {
                Some(sample) => {
                    *slot = sample;
                    got += 1;
                }
                None => break,
            }
        }
        got
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_silence() {
        let mut mock = MockSource::new(16_000);
        mock.generate_silence(100);

        assert_eq!(mock.remaining(), 1600); // 16000 * 0.1
        let mut buf = [1i16; 1600];
        assert_eq!(mock.read_frames(&mut buf), 1600);
        assert!(buf.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_mock_source_sine_has_both_polarities() {
        let mut mock = MockSource::new(16_000);
        mock.generate_sine(440.0, 100);

        let mut buf = [0i16; 1600];
        mock.read_frames(&mut buf);
        assert!(buf.iter().any(|&s| s > 0));
        assert!(buf.iter().any(|&s| s < 0));
    }

    #[test]
    fn test_mock_source_partial_read() {
        let mut mock = MockSource::new(32_768);
        mock.add_samples(&[10, 20, 30]);

        let mut buf = [0i16; 8];
        assert_eq!(mock.read_frames(&mut buf), 3);
        assert_eq!(&buf[..3], &[10, 20, 30]);
        // Untouched past the returned count
        assert_eq!(buf[3], 0);

        // Drained source returns zero frames, not an error
        assert_eq!(mock.read_frames(&mut buf), 0);
    }

    #[test]
    fn test_mock_source_ramp() {
        let mut mock = MockSource::new(32_000);
        mock.generate_ramp(4, 3);

        let mut buf = [0i16; 4];
        mock.read_frames(&mut buf);
        assert_eq!(buf, [0, 3, 6, 9]);
    }

    #[test]
    fn test_mock_source_duration() {
        let mut mock = MockSource::new(16_000);
        mock.generate_silence(500);
        assert_eq!(mock.duration(), Duration::from_millis(500));
    }
}
