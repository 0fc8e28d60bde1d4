//! The resampling pump thread.
//!
//! One pump runs per generic-stream session. Each iteration produces one
//! chunk of output-rate frames (interpolated from the source, or read
//! straight through when the rates already match), writes it to the
//! sink, and backs off briefly when the device pushes back. The loop
//! polls a shared stop flag and signals a completion channel on exit so
//! the driver can join with a bound.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::sink::SharedSink;
use crate::source::SharedSource;
use crate::staging::StagingBuffer;
use crate::{PlaybackConfig, PlaybackError, SinkError};

/// Counters maintained by the pump thread.
///
/// Readable from any thread while the session runs; reset on every
/// session start. Useful for diagnosing starvation and backpressure.
#[derive(Debug, Default)]
pub struct PumpStats {
    chunks_written: AtomicU64,
    frames_written: AtomicU64,
    backpressure_waits: AtomicU64,
}

impl PumpStats {
    /// Number of fully accepted chunk writes.
    pub fn chunks_written(&self) -> u64 {
        self.chunks_written.load(Ordering::Relaxed)
    }

    /// Total frames the sink accepted.
    pub fn frames_written(&self) -> u64 {
        self.frames_written.load(Ordering::Relaxed)
    }

    /// Number of iterations that ended in a backpressure sleep.
    pub fn backpressure_waits(&self) -> u64 {
        self.backpressure_waits.load(Ordering::Relaxed)
    }
}

/// Handle to a spawned pump thread.
pub(crate) struct PumpHandle {
    pub(crate) thread: thread::JoinHandle<()>,
    /// Receives exactly one message, sent when the loop exits.
    pub(crate) done_rx: mpsc::Receiver<()>,
}

/// Parameters captured by the pump loop at spawn time.
pub(crate) struct PumpParams {
    pub(crate) source: SharedSource,
    pub(crate) sink: SharedSink,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) stats: Arc<PumpStats>,
    pub(crate) source_rate: u32,
    pub(crate) output_rate: u32,
    pub(crate) frames_per_write: usize,
    pub(crate) staging_capacity: usize,
    pub(crate) backpressure_sleep: Duration,
}

impl PumpParams {
    pub(crate) fn new(
        source: SharedSource,
        sink: SharedSink,
        running: Arc<AtomicBool>,
        stats: Arc<PumpStats>,
        source_rate: u32,
        output_rate: u32,
        config: &PlaybackConfig,
    ) -> Self {
        Self {
            source,
            sink,
            running,
            stats,
            source_rate,
            output_rate,
            frames_per_write: config.frames_per_write,
            staging_capacity: config.staging_capacity,
            backpressure_sleep: config.backpressure_sleep,
        }
    }
}

/// Spawns the pump thread for a session.
pub(crate) fn spawn(params: PumpParams) -> Result<PumpHandle, PlaybackError> {
    let (done_tx, done_rx) = mpsc::channel();

    let thread = thread::Builder::new()
        .name("audio-pump".into())
        .spawn(move || {
            run(params);
            let _ = done_tx.send(());
        })
        .map_err(|e| SinkError::Backend(format!("failed to spawn pump thread: {e}")))?;

    Ok(PumpHandle { thread, done_rx })
}

fn run(params: PumpParams) {
    let PumpParams {
        source,
        sink,
        running,
        stats,
        source_rate,
        output_rate,
        frames_per_write,
        staging_capacity,
        backpressure_sleep,
    } = params;

    let step = source_rate as f32 / output_rate as f32;
    let resample = source_rate != output_rate;
    let mut staging = StagingBuffer::new(staging_capacity);
    let mut chunk = vec![0i16; frames_per_write];

    tracing::debug!(
        source_rate,
        output_rate,
        step,
        frames_per_write,
        "pump thread started"
    );

    while running.load(Ordering::SeqCst) {
        {
            let mut src = source.lock();
            if resample {
                staging.interpolate_into(&mut chunk, step, &mut **src);
            } else {
                // Rates match; skip interpolation and pad starved reads
                // with silence to keep the write cadence.
                let got = src.read_frames(&mut chunk);
                chunk[got..].fill(0);
            }
        }

        let accepted = match sink.lock().write(&chunk) {
            Ok(n) => n,
            Err(err) => {
                tracing::warn!("sink write failed, backing off: {err}");
                0
            }
        };

        stats.frames_written.fetch_add(accepted as u64, Ordering::Relaxed);
        if accepted == chunk.len() {
            stats.chunks_written.fetch_add(1, Ordering::Relaxed);
        } else {
            // Device buffer is full (or errored); sleeping bounds the
            // retry rate without busy-spinning. The unaccepted remainder
            // is dropped, matching a real-time source that cannot pause.
            stats.backpressure_waits.fetch_add(1, Ordering::Relaxed);
            thread::sleep(backpressure_sleep);
        }
    }

    tracing::debug!(
        chunks = stats.chunks_written(),
        frames = stats.frames_written(),
        waits = stats.backpressure_waits(),
        "pump thread exiting"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MockDevice, OutputDevice, OutputSpec};
    use crate::MockSource;
    use parking_lot::Mutex;
    use std::time::Instant;

    fn spawn_mock_pump(
        source: MockSource,
        device: &MockDevice,
        source_rate: u32,
        output_rate: u32,
    ) -> (PumpHandle, Arc<AtomicBool>, Arc<PumpStats>) {
        let spec = OutputSpec {
            sample_rate: output_rate,
            channels: 1,
            buffer_bytes: 2048,
            low_latency: false,
        };
        let sink = device.open(&spec).unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(PumpStats::default());
        let params = PumpParams::new(
            Arc::new(Mutex::new(Box::new(source) as Box<dyn crate::SampleSource>)),
            Arc::new(Mutex::new(sink)),
            Arc::clone(&running),
            Arc::clone(&stats),
            source_rate,
            output_rate,
            &PlaybackConfig::default(),
        );
        (spawn(params).unwrap(), running, stats)
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_pump_passthrough_when_rates_match() {
        let mut source = MockSource::new(48_000);
        source.add_samples(&[7; 1024]);
        let device = MockDevice::new();
        let state = device.state();

        let (handle, running, stats) = spawn_mock_pump(source, &device, 48_000, 48_000);
        wait_for(|| state.written().len() >= 1024);

        running.store(false, Ordering::SeqCst);
        handle.thread.join().unwrap();

        let written = state.written();
        assert_eq!(&written[..1024], &[7i16; 1024][..]);
        assert!(stats.frames_written() >= 1024);
    }

    #[test]
    fn test_pump_pads_starved_source_with_silence() {
        let mut source = MockSource::new(48_000);
        source.add_samples(&[9; 100]);
        let device = MockDevice::new();
        let state = device.state();

        let (handle, running, _) = spawn_mock_pump(source, &device, 48_000, 48_000);
        wait_for(|| state.written().len() >= 256);

        running.store(false, Ordering::SeqCst);
        handle.thread.join().unwrap();

        let written = state.written();
        assert_eq!(&written[..100], &[9i16; 100][..]);
        // The 100-sample source only part-fills the first 256-frame
        // chunk; the rest must be silence, not stale data.
        assert!(written[100..256].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_pump_resamples_between_rates() {
        let mut source = MockSource::new(32_000);
        source.generate_ramp(4096, 3);
        let device = MockDevice::new();
        let state = device.state();

        let (handle, running, _) = spawn_mock_pump(source, &device, 32_000, 48_000);
        wait_for(|| state.written().len() >= 256);

        running.store(false, Ordering::SeqCst);
        handle.thread.join().unwrap();

        let written = state.written();
        let step = 32_000.0f32 / 48_000.0;
        for (i, &sample) in written[..256].iter().enumerate() {
            let expected = i as f32 * 3.0 * step;
            assert!(
                (f32::from(sample) - expected).abs() <= 1.0,
                "sample {i}: got {sample}, expected ~{expected}"
            );
        }
    }

    #[test]
    fn test_pump_backs_off_on_backpressure() {
        let mut source = MockSource::new(48_000);
        source.add_samples(&[1; 4096]);
        let device = MockDevice::new();
        let state = device.state();
        state.script_writes(&[0, 0, 0]);

        let (handle, running, stats) = spawn_mock_pump(source, &device, 48_000, 48_000);
        wait_for(|| stats.backpressure_waits() >= 3);
        wait_for(|| state.written().len() >= 256);

        running.store(false, Ordering::SeqCst);
        handle.thread.join().unwrap();
        assert!(stats.backpressure_waits() >= 3);
    }

    #[test]
    fn test_pump_signals_done_on_stop() {
        let source = MockSource::new(48_000);
        let device = MockDevice::new();

        let (handle, running, _) = spawn_mock_pump(source, &device, 48_000, 48_000);

        running.store(false, Ordering::SeqCst);
        handle
            .done_rx
            .recv_timeout(Duration::from_millis(500))
            .expect("pump should signal completion promptly");
        handle.thread.join().unwrap();
    }
}
