use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, Stream, StreamConfig, SupportedBufferSize};

use crate::engine::error::EngineError;
use crate::engine::fill::Filler;
use crate::engine::output::device::device_name;
use crate::engine::output::{AudioOutput, OutputBackend, StreamFormat};

/// Output backend on the host's default output device.
pub struct CpalBackend {
    host: cpal::Host,
    device: Option<cpal::Device>,
    buffer_size: BufferSize,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
            device: None,
            buffer_size: BufferSize::Default,
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBackend for CpalBackend {
    fn check_format(&mut self, format: &StreamFormat) -> Result<(), EngineError> {
        let device = self
            .host
            .default_output_device()
            .ok_or_else(|| EngineError::StreamOpen("No output device available".into()))?;
        let name = device_name(&device);

        let ranges = device
            .supported_output_configs()
            .map_err(|e| EngineError::UnsupportedFormat(e.to_string()))?;

        let range = ranges
            .filter(|r| r.channels() == format.channels && r.sample_format() == SampleFormat::I16)
            .find(|r| rate_in_range(r.min_sample_rate(), r.max_sample_rate(), format.sample_rate))
            .ok_or_else(|| {
                EngineError::UnsupportedFormat(format!(
                    "{}ch i16 @ {} Hz is not supported by '{name}'",
                    format.channels, format.sample_rate
                ))
            })?;

        self.buffer_size = pick_buffer_size(range.buffer_size(), format.frames_per_buffer);
        tracing::info!(
            device = %name,
            channels = format.channels,
            sample_rate = format.sample_rate,
            buffer_size = ?self.buffer_size,
            "output format supported"
        );
        self.device = Some(device);
        Ok(())
    }

    fn open(&mut self, format: &StreamFormat, mut filler: Filler) -> Result<Box<dyn AudioOutput>, EngineError> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| EngineError::StreamOpen("output format was never checked".into()))?;

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: format.sample_rate,
            buffer_size: self.buffer_size,
        };

        let err_fn = |err| tracing::warn!("stream error: {err}");

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    filler.fill(data);
                },
                err_fn,
                None,
            )
            .map_err(|e| EngineError::StreamOpen(e.to_string()))?;

        Ok(Box::new(CpalOutput { stream: Some(stream) }))
    }
}

pub struct CpalOutput {
    stream: Option<Stream>,
}

impl AudioOutput for CpalOutput {
    fn start(&mut self) -> Result<(), EngineError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| EngineError::StreamStart("stream already closed".into()))?;
        stream
            .play()
            .map_err(|e| EngineError::StreamStart(e.to_string()))
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                tracing::debug!("pause before close failed: {e}");
            }
            // dropping the stream joins the callback thread
            drop(stream);
        }
    }
}

fn rate_in_range(min: u32, max: u32, rate: u32) -> bool {
    min <= rate && rate <= max
}

/// Use the requested frame count when the device accepts it, otherwise clamp
/// into its advertised range. Devices that do not advertise a range get their
/// default.
fn pick_buffer_size(supported: &SupportedBufferSize, frames: u32) -> BufferSize {
    match supported {
        SupportedBufferSize::Range { min, max } => BufferSize::Fixed(frames.clamp(*min, (*max).max(*min))),
        SupportedBufferSize::Unknown => BufferSize::Default,
    }
}
