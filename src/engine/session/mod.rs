//! Playback session: the open source file, its size and the shared clock.
//!
//! The file is read on a dedicated feeder thread that keeps the sample buffer
//! topped up, so the real-time callback never touches the filesystem.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::MAX_CHUNK_FRAMES;
use crate::engine::buffer::{create_sample_buffer, SampleProducer};
use crate::engine::clock::PlaybackClock;
use crate::engine::decoder::{raw_pcm::RawPcmDecoder, AudioDecoder};
use crate::engine::error::EngineError;
use crate::engine::fill::Filler;
use crate::engine::output::StreamFormat;

pub struct PlaybackSession {
    path: PathBuf,
    file: Option<File>,
    clock: Arc<PlaybackClock>,
    frames_per_buffer: u32,
    sample_rate: u32,
    chunk_frames: usize,
    feeder: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl PlaybackSession {
    /// Opens `path` and measures it. The read cursor starts at zero.
    pub fn open<P: AsRef<Path>>(
        path: P,
        sample_rate: u32,
        channels: u16,
        frames_per_buffer: u32,
        chunk_frames: usize,
    ) -> Result<Self, EngineError> {
        let path = path.as_ref().to_path_buf();
        let file_open = |source| EngineError::FileOpen {
            path: path.clone(),
            source,
        };

        let mut file = File::open(&path).map_err(file_open)?;
        let file_size = file.seek(SeekFrom::End(0)).map_err(file_open)?;
        file.seek(SeekFrom::Start(0)).map_err(file_open)?;

        tracing::debug!(path = %path.display(), file_size, "session opened");

        Ok(Self {
            clock: Arc::new(PlaybackClock::new(file_size, sample_rate, channels)),
            path,
            file: Some(file),
            frames_per_buffer,
            sample_rate,
            chunk_frames: chunk_frames.clamp(1, MAX_CHUNK_FRAMES as usize),
            feeder: None,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.clock.file_size()
    }

    pub fn cursor(&self) -> u64 {
        self.clock.byte_pos()
    }

    /// Output stream parameters this session plays at.
    pub fn stream_format(&self) -> StreamFormat {
        StreamFormat {
            channels: self.clock.channels(),
            sample_rate: self.sample_rate,
            frames_per_buffer: self.frames_per_buffer,
        }
    }

    pub fn clock(&self) -> Arc<PlaybackClock> {
        self.clock.clone()
    }

    /// True while the file handle is held, either here or by the feeder.
    pub fn is_open(&self) -> bool {
        self.file.is_some() || self.feeder.is_some()
    }

    /// Hands the file to a feeder thread and returns the callback side of the
    /// sample buffer. `capacity` is in samples.
    pub fn start_feeding(&mut self, capacity: usize) -> Result<Filler, EngineError> {
        let file = self.file.take().ok_or_else(|| {
            EngineError::StreamOpen(format!(
                "'{}' is not available for streaming",
                self.path.display()
            ))
        })?;

        let chunk_samples = self.chunk_frames * self.clock.channels() as usize;
        let decoder = RawPcmDecoder::new(BufReader::new(file), self.clock.channels(), self.chunk_frames);
        let (producer, consumer) = create_sample_buffer(capacity.max(chunk_samples));

        let clock = self.clock.clone();
        let stop = self.stop.clone();
        let handle = thread::Builder::new()
            .name("rawplay-feeder".into())
            .spawn(move || feed(decoder, producer, &clock, &stop))
            .map_err(|e| EngineError::StreamOpen(format!("failed to spawn feeder: {e}")))?;

        self.feeder = Some(handle);
        Ok(Filler::new(consumer, self.clock.clone()))
    }

    /// Stops the feeder and releases the file. Safe to call more than once.
    pub fn close(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.feeder.take() {
            if handle.join().is_err() {
                tracing::warn!("feeder thread panicked");
            }
        }
        if self.file.take().is_some() {
            tracing::debug!(path = %self.path.display(), "file released");
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Feeder loop: pushes decoded blocks until the source runs dry or `stop` is set.
///
/// A block is only pushed once the buffer has room for all of it; the buffer
/// is always at least one block large.
fn feed<D: AudioDecoder>(
    mut decoder: D,
    mut producer: SampleProducer,
    clock: &PlaybackClock,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Relaxed) {
        let Some(samples) = decoder.decode_next() else {
            break;
        };

        while producer.vacant_len() < samples.len() {
            if stop.load(Ordering::Relaxed) {
                return;
            }
            // Buffer is full; give the callback time to drain it.
            thread::sleep(Duration::from_millis(5));
        }
        producer.push_slice(&samples);
    }
    clock.mark_exhausted();
    tracing::debug!("source exhausted");
}
