use std::path::PathBuf;

use clap::Parser;

use crate::config::{MAX_BUFFER_SECONDS, MAX_CHUNK_FRAMES};

/// Play a file as raw 16-bit stereo PCM at 44.1 kHz.
#[derive(Parser, Debug)]
#[command(name = "rawplay", version)]
pub struct Args {
    /// File to play; its bytes are treated as interleaved little-endian i16 samples
    #[arg(default_value = crate::config::DEFAULT_PATH)]
    pub path: PathBuf,

    /// List output devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Sample buffer target in seconds
    #[arg(long, default_value_t = 1.0, value_parser = parse_buffer_seconds)]
    pub buffer_seconds: f32,

    /// Frames read from disk per feeder pass
    #[arg(
        long,
        default_value_t = 1024,
        value_parser = clap::value_parser!(u32).range(1..=MAX_CHUNK_FRAMES as i64)
    )]
    pub chunk_frames: u32,
}

fn parse_buffer_seconds(s: &str) -> Result<f32, String> {
    let secs: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || !(0.0..=MAX_BUFFER_SECONDS).contains(&secs) {
        return Err(format!("must be between 0 and {MAX_BUFFER_SECONDS}"));
    }
    Ok(secs)
}
