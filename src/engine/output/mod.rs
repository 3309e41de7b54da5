pub mod cpal_backend;
pub mod device;

use crate::engine::error::EngineError;
use crate::engine::fill::Filler;

/// Stream parameters requested from the device. Samples are always `i16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub frames_per_buffer: u32,
}

/// Opens output streams on some audio device.
pub trait OutputBackend {
    /// Checks that the device can play `format`.
    fn check_format(&mut self, format: &StreamFormat) -> Result<(), EngineError>;

    /// Builds a stream for `format` whose callback is driven by `filler`.
    fn open(&mut self, format: &StreamFormat, filler: Filler) -> Result<Box<dyn AudioOutput>, EngineError>;
}

pub trait AudioOutput {
    /// Starts the audio output stream.
    fn start(&mut self) -> Result<(), EngineError>;

    /// Stops the stream and releases it. The callback will not run again once this returns.
    fn close(&mut self);
}
