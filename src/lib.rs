//! # playback-audio
//!
//! Emulator audio output: resampling playback from an emulation core to
//! the host's audio device.
//!
//! `playback-audio` pulls mono signed 16-bit PCM from a [`SampleSource`]
//! at the core's native rate, resamples it by linear interpolation to a
//! rate the output device accepts, and writes it on a dedicated pump
//! thread with bounded backpressure. Session lifecycle is idempotent and
//! infallible: a device that cannot be brought up means silence, never a
//! crash of the hosting emulator.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use playback_audio::{MockSource, PlaybackAudio};
//!
//! let mut source = MockSource::new(32_768);
//! source.generate_sine(440.0, 1000);
//!
//! let mut driver = PlaybackAudio::builder()
//!     .source(source)
//!     .on_event(|e| tracing::warn!(?e, "playback event"))
//!     .build()
//!     .expect("source was configured");
//!
//! driver.start_if_needed();   // emulation resumed
//! // ... core runs, producing samples ...
//! driver.stop();              // emulation paused
//! ```
//!
//! ## Architecture
//!
//! Samples flow `SampleSource -> StagingBuffer -> pump thread -> AudioSink`:
//!
//! - **Negotiation**: probe the source's native rate, then 48000 and
//!   44100, and size the device buffer with write-cycle headroom
//! - **Pump Thread**: fixed-size chunks, linear interpolation with a
//!   fractional position carried across chunks, a short sleep whenever
//!   the device pushes back
//! - **Lifecycle**: platform low-latency backend first when one is
//!   injected, generic stream otherwise, disabled as the last resort;
//!   `stop()` joins the pump with a bound and never hangs
//!
//! Starved sources produce an audible gap rather than stalling the
//! write cadence; emulation timing owes nothing to the audio device.

#![warn(missing_docs)]
// Resampling code casts between f32 positions and integer indices
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod backend;
mod builder;
mod config;
mod driver;
mod error;
mod event;
mod negotiate;
mod pump;
pub mod sink;
pub mod source;
mod staging;

pub use backend::{BackendKind, LowLatencyBackend, MockNativeBackend, MockNativeCalls};
pub use builder::{PlaybackAudio, PlaybackAudioBuilder};
pub use config::PlaybackConfig;
pub use driver::{AudioDriver, PlaybackState};
pub use error::{PlaybackError, SinkError};
pub use event::{event_callback, EventCallback, PlaybackEvent};
pub use negotiate::{negotiate, Negotiated};
pub use pump::PumpStats;
pub use sink::{AudioSink, CpalDevice, MockDevice, OutputDevice, OutputSpec};
pub use source::{MockSource, SampleSource};
