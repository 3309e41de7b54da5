//! Real-time fill path.
//!
//! [`Filler`] runs on the backend's audio thread. It only pops from the SPSC
//! buffer and touches atomics: no locks, no allocation, no I/O.

use std::sync::Arc;

use crate::engine::buffer::SampleConsumer;
use crate::engine::clock::{PlaybackClock, PlaybackState};
use crate::engine::decoder::raw_pcm::BYTES_PER_SAMPLE;

/// Outcome of one callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    Continue,
    Complete,
}

pub struct Filler {
    consumer: SampleConsumer,
    clock: Arc<PlaybackClock>,
    channels: usize,
    complete: bool,
}

impl Filler {
    pub fn new(consumer: SampleConsumer, clock: Arc<PlaybackClock>) -> Self {
        let channels = clock.channels().max(1) as usize;
        Self {
            consumer,
            clock,
            channels,
            complete: false,
        }
    }

    /// Writes every slot of `out` and reports whether playback should go on.
    ///
    /// Frames come from the buffer in file order; slots the feeder has not
    /// supplied yet are silence. Once the cursor reaches the end of the file
    /// (or the feeder gave up and the buffer is drained) this and every later
    /// call report `Complete`.
    pub fn fill(&mut self, out: &mut [i16]) -> FillStatus {
        if self.complete {
            out.fill(0);
            return FillStatus::Complete;
        }

        let popped = self.consumer.pop_frames(out, self.channels);
        out[popped..].fill(0);

        if popped > 0 {
            self.clock.advance((popped * BYTES_PER_SAMPLE) as u64);
        }

        let drained = self.clock.is_exhausted() && self.consumer.occupied_len() == 0;
        if self.clock.is_at_end() || drained {
            self.complete = true;
            self.clock.set_state(PlaybackState::Complete);
            return FillStatus::Complete;
        }
        FillStatus::Continue
    }
}
