//! CPAL-backed output device.
//!
//! The pump thread needs a `Send` sink handle, but cpal streams are tied
//! to the thread that created them. The stream therefore lives on a small
//! keeper thread that executes play/pause commands; the [`CpalSink`]
//! handle owns the ring-buffer producer and the command channel, and the
//! cpal callback drains the ring, zero-filling on underrun.

use std::sync::mpsc;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig, SupportedBufferSize};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;

use super::{AudioSink, OutputDevice, OutputSpec};
use crate::config::BYTES_PER_SAMPLE;
use crate::SinkError;

/// Frames assumed when the device does not report a minimum buffer size.
const DEFAULT_MIN_FRAMES: usize = 256;

/// Scale factor for i16 -> f32 sample conversion.
const I16_SCALE: f32 = 1.0 / 32768.0;

/// The default host's default output device.
///
/// Construction is infallible; device lookup happens at probe/open time
/// so a device that appears later is picked up on the next start.
#[derive(Debug, Default)]
pub struct CpalDevice;

impl CpalDevice {
    /// Creates a handle to the default output device.
    pub fn new() -> Self {
        Self
    }
}

impl OutputDevice for CpalDevice {
    fn min_buffer_bytes(&self, sample_rate: u32) -> Option<usize> {
        let host = cpal::default_host();
        let device = host.default_output_device()?;
        let configs = device.supported_output_configs().ok()?;

        for range in configs {
            if !usable_range(
                range.channels(),
                range.sample_format(),
                range.min_sample_rate().0,
                range.max_sample_rate().0,
                sample_rate,
            ) {
                continue;
            }
            let min_frames = match range.buffer_size() {
                SupportedBufferSize::Range { min, .. } => (*min as usize).max(1),
                SupportedBufferSize::Unknown => DEFAULT_MIN_FRAMES,
            };
            return Some(min_frames * BYTES_PER_SAMPLE);
        }
        None
    }

    fn open(&self, spec: &OutputSpec) -> Result<Box<dyn AudioSink>, SinkError> {
        CpalSink::open(spec).map(|sink| Box::new(sink) as Box<dyn AudioSink>)
    }
}

/// Whether a supported-config range could actually satisfy `open()`:
/// mono, a sample format the output callback handles, and the probed
/// rate inside the range. Probing must not report support that
/// `build_stream` would later reject.
fn usable_range(
    channels: u16,
    format: SampleFormat,
    min_rate: u32,
    max_rate: u32,
    rate: u32,
) -> bool {
    channels == 1
        && matches!(format, SampleFormat::I16 | SampleFormat::F32)
        && min_rate <= rate
        && rate <= max_rate
}

enum StreamCmd {
    Play,
    Pause,
    Shutdown,
}

/// An open cpal output stream.
///
/// Writes push into a lock-free ring sized from the negotiated buffer;
/// a full ring reports backpressure by accepting fewer frames than
/// offered. Dropping the sink shuts down the keeper thread and with it
/// the stream.
pub struct CpalSink {
    producer: ringbuf::HeapProd<i16>,
    cmd_tx: mpsc::Sender<StreamCmd>,
    keeper: Option<thread::JoinHandle<()>>,
}

impl CpalSink {
    fn open(spec: &OutputSpec) -> Result<Self, SinkError> {
        let capacity = (spec.buffer_bytes / BYTES_PER_SAMPLE).max(1024);
        let ring = HeapRb::<i16>::new(capacity);
        let (producer, consumer) = ring.split();

        let (cmd_tx, cmd_rx) = mpsc::channel::<StreamCmd>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), SinkError>>();

        let spec = *spec;
        let keeper = thread::Builder::new()
            .name("audio-sink".into())
            .spawn(move || {
                let stream = match build_stream(&spec, consumer) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        StreamCmd::Play => {
                            if let Err(err) = stream.play() {
                                tracing::warn!("output stream play failed: {err}");
                            }
                        }
                        StreamCmd::Pause => {
                            if let Err(err) = stream.pause() {
                                tracing::warn!("output stream pause failed: {err}");
                            }
                        }
                        StreamCmd::Shutdown => break,
                    }
                }
                // Dropping the stream here closes the device.
            })
            .map_err(|e| SinkError::Backend(format!("failed to spawn sink thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                producer,
                cmd_tx,
                keeper: Some(keeper),
            }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(SinkError::Backend(
                "sink thread exited before reporting readiness".to_string(),
            )),
        }
    }

    fn send(&self, cmd: StreamCmd, op: &str) -> Result<(), SinkError> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| SinkError::invalid_state(op))
    }
}

impl AudioSink for CpalSink {
    fn name(&self) -> &str {
        "cpal"
    }

    fn play(&mut self) -> Result<(), SinkError> {
        self.send(StreamCmd::Play, "play")
    }

    fn write(&mut self, frames: &[i16]) -> Result<usize, SinkError> {
        Ok(self.producer.push_slice(frames))
    }

    fn pause(&mut self) -> Result<(), SinkError> {
        self.send(StreamCmd::Pause, "pause")
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        // The callback owns the consumer side, so queued audio cannot be
        // discarded from here; it is bounded by the negotiated ring size
        // and drains within a few write cycles.
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SinkError> {
        // cpal has no stopped state distinct from paused.
        self.send(StreamCmd::Pause, "stop")
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(StreamCmd::Shutdown);
        if let Some(keeper) = self.keeper.take() {
            let _ = keeper.join();
        }
    }
}

fn build_stream(
    spec: &OutputSpec,
    mut consumer: ringbuf::HeapCons<i16>,
) -> Result<cpal::Stream, SinkError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or_else(|| {
        SinkError::Unsupported {
            reason: "no default output device".to_string(),
        }
    })?;

    let sample_format = device
        .default_output_config()
        .map_err(|e| SinkError::Backend(e.to_string()))?
        .sample_format();

    let config = StreamConfig {
        channels: spec.channels,
        sample_rate: SampleRate(spec.sample_rate),
        buffer_size: BufferSize::Fixed((spec.buffer_bytes / BYTES_PER_SAMPLE) as u32),
    };

    let err_fn = |err| tracing::error!("output stream error: {err}");

    let stream = match sample_format {
        SampleFormat::I16 => device
            .build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    let popped = consumer.pop_slice(data);
                    // Underrun: pad with silence rather than stale data.
                    data[popped..].fill(0);
                },
                err_fn,
                None,
            )
            .map_err(|e| SinkError::Backend(e.to_string()))?,
        SampleFormat::F32 => {
            let mut staged: Vec<i16> = vec![0; 4096];
            device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        if staged.len() < data.len() {
                            staged.resize(data.len(), 0);
                        }
                        let popped = consumer.pop_slice(&mut staged[..data.len()]);
                        for (out, &s) in data.iter_mut().zip(&staged[..popped]) {
                            *out = f32::from(s) * I16_SCALE;
                        }
                        data[popped..].fill(0.0);
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| SinkError::Backend(e.to_string()))?
        }
        format => {
            return Err(SinkError::Unsupported {
                reason: format!("sample format {format:?}"),
            });
        }
    };

    Ok(stream)
}
