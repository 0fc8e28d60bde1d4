//! Mock output device and sink for testing without audio hardware.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::{AudioSink, OutputDevice, OutputSpec};
use crate::SinkError;

/// Shared observable state for a [`MockDevice`] and the sinks it opens.
///
/// Tests hold a clone of this handle and inspect it after driving the
/// lifecycle, since the driver consumes the device and sink themselves.
#[derive(Default)]
pub struct MockSinkState {
    opens: AtomicUsize,
    plays: AtomicUsize,
    pauses: AtomicUsize,
    flushes: AtomicUsize,
    stops: AtomicUsize,
    last_spec: Mutex<Option<OutputSpec>>,
    written: Mutex<Vec<i16>>,
    write_lens: Mutex<Vec<usize>>,
    scripted_writes: Mutex<VecDeque<usize>>,
    write_blocked: Mutex<bool>,
    write_unblocked: Condvar,
    failing_teardown: Mutex<Vec<String>>,
}

impl MockSinkState {
    /// Number of sinks opened so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of `play()` calls across all opened sinks.
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    /// Number of `pause()` calls across all opened sinks.
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    /// Number of `flush()` calls across all opened sinks.
    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Number of `stop()` calls across all opened sinks.
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// The spec passed to the most recent `open()`.
    pub fn last_spec(&self) -> Option<OutputSpec> {
        *self.last_spec.lock()
    }

    /// All frames accepted by the sink, in write order.
    pub fn written(&self) -> Vec<i16> {
        self.written.lock().clone()
    }

    /// The frame count of every `write()` call, accepted or not.
    pub fn write_lens(&self) -> Vec<usize> {
        self.write_lens.lock().clone()
    }

    /// Scripts the accepted count of upcoming writes.
    ///
    /// Each queued value is consumed by one `write()` call; once the
    /// queue drains, writes accept everything. Queue zeros to simulate
    /// device backpressure.
    pub fn script_writes(&self, accepted: &[usize]) {
        self.scripted_writes.lock().extend(accepted.iter().copied());
    }

    /// Parks every subsequent `write()` until [`release_writes()`] is
    /// called, simulating a wedged device.
    ///
    /// The write is recorded in [`write_lens()`] before parking, so a
    /// test can wait for the writer to arrive at the gate.
    ///
    /// [`release_writes()`]: Self::release_writes
    /// [`write_lens()`]: Self::write_lens
    pub fn block_writes(&self) {
        *self.write_blocked.lock() = true;
    }

    /// Releases writers parked by [`block_writes()`](Self::block_writes).
    pub fn release_writes(&self) {
        *self.write_blocked.lock() = false;
        self.write_unblocked.notify_all();
    }

    /// Makes the named teardown operations (`pause`, `flush`, `stop`)
    /// fail with a state error. Call counters still advance.
    pub fn fail_teardown_ops(&self, ops: &[&str]) {
        self.failing_teardown
            .lock()
            .extend(ops.iter().map(|op| (*op).to_string()));
    }

    fn teardown_result(&self, op: &str) -> Result<(), SinkError> {
        if self.failing_teardown.lock().iter().any(|o| o == op) {
            Err(SinkError::invalid_state(op))
        } else {
            Ok(())
        }
    }
}

/// A scriptable [`OutputDevice`] backed by [`MockSinkState`].
pub struct MockDevice {
    supported_rates: Option<Vec<u32>>,
    min_buffer_bytes: usize,
    fail_open: bool,
    state: Arc<MockSinkState>,
}

impl MockDevice {
    /// Creates a device that supports every sample rate.
    pub fn new() -> Self {
        Self {
            supported_rates: None,
            min_buffer_bytes: 1024,
            fail_open: false,
            state: Arc::new(MockSinkState::default()),
        }
    }

    /// Restricts the device to the given sample rates.
    pub fn with_supported_rates(mut self, rates: &[u32]) -> Self {
        self.supported_rates = Some(rates.to_vec());
        self
    }

    /// Creates a device that rejects every sample rate.
    pub fn unsupported() -> Self {
        Self::new().with_supported_rates(&[])
    }

    /// Overrides the minimum buffer size reported for supported rates.
    pub fn with_min_buffer_bytes(mut self, bytes: usize) -> Self {
        self.min_buffer_bytes = bytes;
        self
    }

    /// Makes every `open()` call fail.
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Returns a handle to the shared observable state.
    pub fn state(&self) -> Arc<MockSinkState> {
        Arc::clone(&self.state)
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDevice for MockDevice {
    fn min_buffer_bytes(&self, sample_rate: u32) -> Option<usize> {
        match &self.supported_rates {
            Some(rates) if !rates.contains(&sample_rate) => None,
            _ => Some(self.min_buffer_bytes),
        }
    }

    fn open(&self, spec: &OutputSpec) -> Result<Box<dyn AudioSink>, SinkError> {
        if self.fail_open {
            return Err(SinkError::Unsupported {
                reason: "mock device configured to fail open".to_string(),
            });
        }
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        *self.state.last_spec.lock() = Some(*spec);
        Ok(Box::new(MockSink {
            state: Arc::clone(&self.state),
        }))
    }
}

/// The sink opened by [`MockDevice`]; records everything into the shared
/// [`MockSinkState`].
pub struct MockSink {
    state: Arc<MockSinkState>,
}

impl AudioSink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    fn play(&mut self) -> Result<(), SinkError> {
        self.state.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn write(&mut self, frames: &[i16]) -> Result<usize, SinkError> {
        self.state.write_lens.lock().push(frames.len());
        {
            let mut blocked = self.state.write_blocked.lock();
            while *blocked {
                self.state.write_unblocked.wait(&mut blocked);
            }
        }
        let accepted = self
            .state
            .scripted_writes
            .lock()
            .pop_front()
            .unwrap_or(frames.len())
            .min(frames.len());
        self.state
            .written
            .lock()
            .extend_from_slice(&frames[..accepted]);
        Ok(accepted)
    }

    fn pause(&mut self) -> Result<(), SinkError> {
        self.state.pauses.fetch_add(1, Ordering::SeqCst);
        self.state.teardown_result("pause")
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.state.flushes.fetch_add(1, Ordering::SeqCst);
        self.state.teardown_result("flush")
    }

    fn stop(&mut self) -> Result<(), SinkError> {
        self.state.stops.fetch_add(1, Ordering::SeqCst);
        self.state.teardown_result("stop")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_device_supports_everything_by_default() {
        let device = MockDevice::new();
        assert_eq!(device.min_buffer_bytes(32_768), Some(1024));
        assert_eq!(device.min_buffer_bytes(48_000), Some(1024));
    }

    #[test]
    fn test_mock_device_restricted_rates() {
        let device = MockDevice::new().with_supported_rates(&[48_000]);
        assert_eq!(device.min_buffer_bytes(48_000), Some(1024));
        assert_eq!(device.min_buffer_bytes(32_768), None);
    }

    #[test]
    fn test_mock_sink_records_writes() {
        let device = MockDevice::new();
        let state = device.state();
        let spec = OutputSpec {
            sample_rate: 48_000,
            channels: 1,
            buffer_bytes: 2048,
            low_latency: false,
        };

        let mut sink = device.open(&spec).unwrap();
        sink.play().unwrap();
        assert_eq!(sink.write(&[1, 2, 3]).unwrap(), 3);

        assert_eq!(state.opens(), 1);
        assert_eq!(state.plays(), 1);
        assert_eq!(state.written(), vec![1, 2, 3]);
        assert_eq!(state.last_spec().unwrap().sample_rate, 48_000);
    }

    #[test]
    fn test_mock_sink_scripted_backpressure() {
        let device = MockDevice::new();
        let state = device.state();
        state.script_writes(&[0, 2]);

        let spec = OutputSpec {
            sample_rate: 48_000,
            channels: 1,
            buffer_bytes: 2048,
            low_latency: false,
        };
        let mut sink = device.open(&spec).unwrap();

        assert_eq!(sink.write(&[1, 2, 3]).unwrap(), 0);
        assert_eq!(sink.write(&[4, 5, 6]).unwrap(), 2);
        assert_eq!(sink.write(&[7, 8]).unwrap(), 2);
        assert_eq!(state.written(), vec![4, 5, 7, 8]);
        assert_eq!(state.write_lens(), vec![3, 3, 2]);
    }

    #[test]
    fn test_blocked_write_parks_until_released() {
        let device = MockDevice::new();
        let state = device.state();
        state.block_writes();

        let spec = OutputSpec {
            sample_rate: 48_000,
            channels: 1,
            buffer_bytes: 2048,
            low_latency: false,
        };
        let mut sink = device.open(&spec).unwrap();

        let writer = std::thread::spawn(move || sink.write(&[1, 2]).unwrap());
        // The write is recorded before parking, so this is observable.
        while state.write_lens().is_empty() {
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(!writer.is_finished());

        state.release_writes();
        assert_eq!(writer.join().unwrap(), 2);
        assert_eq!(state.written(), vec![1, 2]);
    }

    #[test]
    fn test_scripted_teardown_failures_still_count() {
        let device = MockDevice::new();
        let state = device.state();
        state.fail_teardown_ops(&["pause", "stop"]);

        let spec = OutputSpec {
            sample_rate: 48_000,
            channels: 1,
            buffer_bytes: 2048,
            low_latency: false,
        };
        let mut sink = device.open(&spec).unwrap();

        assert!(sink.pause().is_err());
        assert!(sink.flush().is_ok());
        assert!(sink.stop().is_err());
        assert_eq!(state.pauses(), 1);
        assert_eq!(state.flushes(), 1);
        assert_eq!(state.stops(), 1);
    }
}
