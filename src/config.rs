use std::path::PathBuf;

use crate::cli::Args;

pub const DEFAULT_PATH: &str = "audio.wav";
pub const SAMPLE_RATE: u32 = 44_100;
pub const CHANNEL_COUNT: u16 = 2;
pub const FRAMES_PER_BUFFER: u32 = 512;
pub const MAX_BUFFER_SECONDS: f32 = 60.0;
pub const MAX_CHUNK_FRAMES: u32 = 65_536;

/// Playback parameters for one run.
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    /// Raw PCM source.
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames requested from the callback per period.
    pub frames_per_buffer: u32,
    /// Frames read from disk per feeder iteration.
    pub chunk_frames: usize,
    /// Target sample buffer duration.
    pub buffer_seconds: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            sample_rate: SAMPLE_RATE,
            channels: CHANNEL_COUNT,
            frames_per_buffer: FRAMES_PER_BUFFER,
            chunk_frames: 1024,
            buffer_seconds: 1.0,
        }
    }
}

impl PlayerConfig {
    /// Sample buffer capacity in samples. Never smaller than two callback
    /// periods or one feeder chunk, never larger than `MAX_BUFFER_SECONDS`
    /// of audio.
    pub fn buffer_capacity_samples(&self) -> usize {
        let channels = self.channels.max(1) as usize;
        let rate = self.sample_rate as usize;
        let seconds = if self.buffer_seconds.is_finite() {
            self.buffer_seconds.clamp(0.0, MAX_BUFFER_SECONDS)
        } else {
            MAX_BUFFER_SECONDS
        };
        let wanted = ((rate as f64 * seconds as f64) as usize).saturating_mul(channels);
        let chunk = self.chunk_frames.min(MAX_CHUNK_FRAMES as usize);
        let floor = (self.frames_per_buffer as usize)
            .saturating_mul(2)
            .max(chunk)
            .saturating_mul(channels);
        let ceiling = rate
            .saturating_mul(MAX_BUFFER_SECONDS as usize)
            .saturating_mul(channels)
            .max(floor);
        wanted.max(floor).min(ceiling)
    }
}

impl From<&Args> for PlayerConfig {
    fn from(args: &Args) -> Self {
        Self {
            path: args.path.clone(),
            chunk_frames: args.chunk_frames.clamp(1, MAX_CHUNK_FRAMES) as usize,
            buffer_seconds: args.buffer_seconds,
            ..Self::default()
        }
    }
}
