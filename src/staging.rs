//! Staging buffer for resampling continuity.
//!
//! Linear interpolation needs the sample pair straddling the current
//! read position, so not-yet-consumed source samples are staged in a
//! fixed-capacity buffer that survives across output chunks. The pump
//! thread is the only accessor; no locking is involved.

use crate::source::SampleSource;

/// Fixed-capacity holding area for source samples awaiting consumption.
///
/// Invariants: `0 <= index <= count <= capacity`, and `position` is
/// re-normalized into `[0, 1)` after every advance by carrying the
/// integer part into `index`.
pub(crate) struct StagingBuffer {
    buf: Box<[i16]>,
    /// Valid samples present in `buf`.
    count: usize,
    /// Next unconsumed offset.
    index: usize,
    /// Fractional interpolation accumulator.
    position: f32,
}

impl StagingBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 2, "staging buffer needs room for a sample pair");
        Self {
            buf: vec![0i16; capacity].into_boxed_slice(),
            count: 0,
            index: 0,
            position: 0.0,
        }
    }

    /// Shifts unconsumed samples to the front and pulls fresh source
    /// frames into the freed space behind them.
    fn compact_and_fill(&mut self, source: &mut dyn SampleSource) {
        let remain = self.count.saturating_sub(self.index);
        if remain > 0 {
            self.buf.copy_within(self.index..self.count, 0);
        }
        self.index = 0;
        self.count = remain;
        self.position = 0.0;

        if remain < self.buf.len() {
            let got = source.read_frames(&mut self.buf[remain..]);
            self.count = remain + got;
        }
    }

    /// Produces `out.len()` interpolated samples at the given step,
    /// refilling from `source` as staged samples run out.
    ///
    /// When the source is starved (one or zero samples after a refill),
    /// the missing interpolation neighbor falls back to the last real
    /// sample, or silence if none exists. The gap is audible; blocking
    /// here would stall the write cadence instead.
    pub(crate) fn interpolate_into(
        &mut self,
        out: &mut [i16],
        step: f32,
        source: &mut dyn SampleSource,
    ) {
        for slot in out.iter_mut() {
            let mut i0 = self.index + self.position as usize;
            let mut frac = self.position.fract();

            while i0 + 1 >= self.count {
                self.compact_and_fill(source);
                i0 = 0;
                frac = 0.0;
                if self.count <= 1 {
                    break;
                }
            }

            let s0 = if self.count > 0 && i0 < self.count {
                self.buf[i0]
            } else {
                0
            };
            let s1 = if i0 + 1 < self.count { self.buf[i0 + 1] } else { s0 };
            *slot = (f32::from(s0) + (f32::from(s1) - f32::from(s0)) * frac) as i16;

            self.position += step;
            let adv = self.position as usize;
            if adv > 0 {
                self.index += adv;
                self.position -= adv as f32;
            }
        }
    }
}
