pub mod raw_pcm;

pub trait AudioDecoder {
    /// Reads the next block of audio and returns it as interleaved `i16` samples.
    /// Every block holds whole frames.
    /// Returns None when the end of the stream is reached.
    fn decode_next(&mut self) -> Option<Vec<i16>>;
}
