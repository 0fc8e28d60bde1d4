//! Sample source abstraction.
//!
//! A [`SampleSource`] is the emulation core's audio output contract: a
//! producer of mono signed 16-bit PCM at a fixed native rate. The pump
//! thread is the only reader once a session starts.

mod mock;

pub use mock::MockSource;

use parking_lot::Mutex;
use std::sync::Arc;

/// A producer of mono signed 16-bit PCM frames.
///
/// # Implementation Notes
///
/// - `read_frames` may return fewer frames than requested, including
///   zero, without signaling an error - the caller treats shortfalls as
///   temporary starvation, never as end-of-stream.
/// - It is called repeatedly from the pump thread and must be safe to
///   call at audio rates; avoid blocking for long.
pub trait SampleSource: Send {
    /// The native sample rate the source produces at, in Hz.
    fn sample_rate(&self) -> u32;

    /// Fills `out` with up to `out.len()` frames.
    ///
    /// Returns the number of frames actually written. Frames beyond the
    /// returned count are left untouched; callers zero-fill if needed.
    fn read_frames(&mut self, out: &mut [i16]) -> usize;
}

/// A sample source shared between the driver and the pump thread.
///
/// The driver keeps a handle across sessions so `stop()` followed by
/// `start_if_needed()` reuses the same producer; the pump locks it once
/// per read, with no other contender while running.
pub(crate) type SharedSource = Arc<Mutex<Box<dyn SampleSource>>>;
