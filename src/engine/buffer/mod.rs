//! The Buffer subsystem carries PCM samples from the feeder thread to the
//! output callback. It uses a lock-free Single-Producer Single-Consumer (SPSC)
//! ring buffer so the callback never waits on the feeder.

use std::sync::Arc;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
    CachingProd,
    CachingCons,
};

/// Producer handle for the sample buffer. Used by the feeder.
pub struct SampleProducer {
    inner: CachingProd<Arc<HeapRb<i16>>>,
}

/// Consumer handle for the sample buffer. Used by the fill callback.
pub struct SampleConsumer {
    inner: CachingCons<Arc<HeapRb<i16>>>,
}

impl SampleProducer {
    /// Pushes a slice of samples into the buffer.
    /// Returns the number of samples successfully pushed.
    pub fn push_slice(&mut self, samples: &[i16]) -> usize {
        self.inner.push_slice(samples)
    }

    /// Returns the number of free spaces in the buffer.
    pub fn vacant_len(&self) -> usize {
        self.inner.vacant_len()
    }
}

impl SampleConsumer {
    /// Pops whole interleaved frames of `channels` samples into the front of
    /// `out`. A frame is never split, so a partially pushed frame stays
    /// queued until the rest of it arrives. Returns the number of samples
    /// written.
    pub fn pop_frames(&mut self, out: &mut [i16], channels: usize) -> usize {
        let channels = channels.max(1);
        let room = out.len() / channels * channels;
        let ready = self.inner.occupied_len() / channels * channels;
        self.inner.pop_slice(&mut out[..room.min(ready)])
    }

    /// Returns the number of samples available in the buffer.
    pub fn occupied_len(&self) -> usize {
        self.inner.occupied_len()
    }
}

/// Creates a new sample buffer with the specified capacity (in samples).
/// Returns a (Producer, Consumer) pair.
pub fn create_sample_buffer(capacity: usize) -> (SampleProducer, SampleConsumer) {
    let rb = HeapRb::<i16>::new(capacity.max(1));
    let (prod, cons) = rb.split();
    (
        SampleProducer { inner: prod },
        SampleConsumer { inner: cons },
    )
}
