use std::io::{ErrorKind, Read};

use crate::config::MAX_CHUNK_FRAMES;
use crate::engine::decoder::AudioDecoder;

/// Byte width of one `i16` sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Reads a byte stream as raw interleaved little-endian `i16` PCM.
///
/// Nothing in the stream is interpreted as a header. A trailing partial
/// sample or frame is zero-padded so every block holds whole frames.
pub struct RawPcmDecoder<R: Read> {
    reader: R,
    channels: u16,
    bytes: Vec<u8>,
    finished: bool,
}

impl<R: Read> RawPcmDecoder<R> {
    pub fn new(reader: R, channels: u16, chunk_frames: usize) -> Self {
        let channels = channels.max(1);
        let chunk_frames = chunk_frames.clamp(1, MAX_CHUNK_FRAMES as usize);
        Self {
            reader,
            channels,
            bytes: vec![0; chunk_frames * channels as usize * BYTES_PER_SAMPLE],
            finished: false,
        }
    }

    /// Fills the scratch buffer as far as the reader allows and returns the
    /// byte count. A short count means end of stream. A read error ends the
    /// stream too, but bytes read before it are still returned.
    fn fill_chunk(&mut self) -> usize {
        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.reader.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::warn!(error = %err, kept = filled, "read failed, treating as end of stream");
                    self.finished = true;
                    break;
                }
            }
        }
        filled
    }
}

impl<R: Read> AudioDecoder for RawPcmDecoder<R> {
    fn decode_next(&mut self) -> Option<Vec<i16>> {
        if self.finished {
            return None;
        }

        let filled = self.fill_chunk();
        if filled < self.bytes.len() {
            self.finished = true;
        }
        if filled == 0 {
            return None;
        }

        let channels = self.channels as usize;
        let sample_count = filled.div_ceil(BYTES_PER_SAMPLE);
        let padded = sample_count.div_ceil(channels) * channels;

        let mut samples = Vec::with_capacity(padded);
        for pair in self.bytes[..filled].chunks(BYTES_PER_SAMPLE) {
            let lo = pair[0];
            let hi = pair.get(1).copied().unwrap_or(0);
            samples.push(i16::from_le_bytes([lo, hi]));
        }
        samples.resize(padded, 0);
        Some(samples)
    }
}
