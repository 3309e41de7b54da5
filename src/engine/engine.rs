use std::sync::Arc;

use crate::config::PlayerConfig;
use crate::engine::clock::{PlaybackClock, PlaybackState};
use crate::engine::error::EngineError;
use crate::engine::output::{AudioOutput, OutputBackend};
use crate::engine::session::PlaybackSession;

/// Startup stages, in the only order they may happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    StreamOpen,
    Streaming,
    Closed,
}

/// Drives one playback session from file open to teardown.
pub struct PlaybackEngine {
    config: PlayerConfig,
    backend: Box<dyn OutputBackend>,
    session: Option<PlaybackSession>,
    output: Option<Box<dyn AudioOutput>>,
    state: LifecycleState,
}

impl PlaybackEngine {
    pub fn new(config: PlayerConfig, backend: Box<dyn OutputBackend>) -> Self {
        Self {
            config,
            backend,
            session: None,
            output: None,
            state: LifecycleState::Uninitialized,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Shared clock of the current session, if one is open.
    pub fn clock(&self) -> Option<Arc<PlaybackClock>> {
        self.session.as_ref().map(|s| s.clock())
    }

    fn advance_to(&mut self, to: LifecycleState) -> Result<(), EngineError> {
        let expected = match to {
            LifecycleState::Initialized => LifecycleState::Uninitialized,
            LifecycleState::StreamOpen => LifecycleState::Initialized,
            LifecycleState::Streaming => LifecycleState::StreamOpen,
            LifecycleState::Uninitialized | LifecycleState::Closed => {
                return Err(EngineError::InvalidTransition { from: self.state, to });
            }
        };
        if self.state != expected {
            return Err(EngineError::InvalidTransition { from: self.state, to });
        }
        Ok(())
    }

    /// Opens the source file.
    pub fn init(&mut self) -> Result<(), EngineError> {
        self.advance_to(LifecycleState::Initialized)?;
        let session = PlaybackSession::open(
            &self.config.path,
            self.config.sample_rate,
            self.config.channels,
            self.config.frames_per_buffer,
            self.config.chunk_frames,
        )?;
        tracing::info!(
            path = %session.path().display(),
            file_size = session.file_size(),
            "session initialized"
        );
        self.session = Some(session);
        self.state = LifecycleState::Initialized;
        Ok(())
    }

    /// Checks the device format, starts the feeder and builds the stream.
    pub fn open_stream(&mut self) -> Result<(), EngineError> {
        self.advance_to(LifecycleState::StreamOpen)?;
        let session = self
            .session
            .as_mut()
            .ok_or(EngineError::InvalidTransition {
                from: LifecycleState::Uninitialized,
                to: LifecycleState::StreamOpen,
            })?;
        let format = session.stream_format();
        self.backend.check_format(&format)?;

        let capacity = self.config.buffer_capacity_samples();
        let filler = session.start_feeding(capacity)?;

        let output = self.backend.open(&format, filler)?;
        tracing::debug!(capacity, "output stream opened");
        self.output = Some(output);
        self.state = LifecycleState::StreamOpen;
        Ok(())
    }

    /// Starts the output stream; the callback begins pulling frames.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.advance_to(LifecycleState::Streaming)?;
        if let Some(clock) = self.clock() {
            clock.set_state(PlaybackState::Playing);
        }
        let output = self
            .output
            .as_mut()
            .ok_or_else(|| EngineError::StreamStart("no output stream".into()))?;
        if let Err(e) = output.start() {
            if let Some(clock) = self.clock() {
                clock.set_state(PlaybackState::Idle);
            }
            return Err(e);
        }
        tracing::info!("playback started");
        self.state = LifecycleState::Streaming;
        Ok(())
    }

    /// Runs init, open and start in order, stopping at the first failure.
    /// The caller is expected to `close` afterwards either way.
    pub fn startup(&mut self) -> Result<(), EngineError> {
        self.init()?;
        self.open_stream()?;
        self.start()
    }

    /// Releases the stream, then the file. Each is released at most once;
    /// later calls do nothing.
    pub fn close(&mut self) {
        if self.state == LifecycleState::Closed {
            return;
        }
        if let Some(mut output) = self.output.take() {
            output.close();
            tracing::debug!("output stream closed");
        }
        if let Some(mut session) = self.session.take() {
            let held_file = session.is_open();
            session.close();
            tracing::info!(
                position = session.cursor(),
                file_size = session.file_size(),
                released = held_file,
                "session closed"
            );
        }
        self.state = LifecycleState::Closed;
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::engine::fill::{FillStatus, Filler};
    use crate::engine::output::StreamFormat;

    #[derive(Default)]
    struct Counters {
        checks: AtomicUsize,
        opens: AtomicUsize,
        starts: AtomicUsize,
        closes: AtomicUsize,
    }

    #[derive(Default, Clone, Copy)]
    struct Faults {
        unsupported: bool,
        open_fails: bool,
        start_fails: bool,
    }

    struct MockBackend {
        counters: Arc<Counters>,
        faults: Faults,
    }

    struct MockOutput {
        counters: Arc<Counters>,
        filler: Filler,
        fail_start: bool,
        frames_per_buffer: usize,
    }

    impl OutputBackend for MockBackend {
        fn check_format(&mut self, format: &StreamFormat) -> Result<(), EngineError> {
            self.counters.checks.fetch_add(1, Ordering::SeqCst);
            if self.faults.unsupported {
                return Err(EngineError::UnsupportedFormat(format!("{}ch", format.channels)));
            }
            Ok(())
        }

        fn open(&mut self, format: &StreamFormat, filler: Filler) -> Result<Box<dyn AudioOutput>, EngineError> {
            if self.faults.open_fails {
                return Err(EngineError::StreamOpen("device unplugged".into()));
            }
            self.counters.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockOutput {
                counters: self.counters.clone(),
                filler,
                fail_start: self.faults.start_fails,
                frames_per_buffer: format.frames_per_buffer as usize,
            }))
        }
    }

    impl AudioOutput for MockOutput {
        fn start(&mut self) -> Result<(), EngineError> {
            if self.fail_start {
                return Err(EngineError::StreamStart("host refused".into()));
            }
            self.counters.starts.fetch_add(1, Ordering::SeqCst);
            // one callback period, as the device would run it
            let mut out = vec![0i16; self.frames_per_buffer * 2];
            let _status: FillStatus = self.filler.fill(&mut out);
            Ok(())
        }

        fn close(&mut self) {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn engine_with(path: PathBuf, faults: Faults) -> (PlaybackEngine, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let backend = MockBackend {
            counters: counters.clone(),
            faults,
        };
        let config = PlayerConfig {
            path,
            ..PlayerConfig::default()
        };
        (PlaybackEngine::new(config, Box::new(backend)), counters)
    }

    fn temp_pcm(len: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; len]).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn full_lifecycle_opens_and_closes_once() {
        let file = temp_pcm(44_100 * 4);
        let (mut engine, counters) = engine_with(file.path().to_path_buf(), Faults::default());

        engine.startup().unwrap();
        assert_eq!(engine.state(), LifecycleState::Streaming);
        let clock = engine.clock().unwrap();
        assert_eq!(clock.state(), PlaybackState::Playing);
        assert_eq!(clock.file_size(), 44_100 * 4);

        engine.close();
        engine.close();
        assert_eq!(engine.state(), LifecycleState::Closed);
        assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
        assert_eq!(counters.starts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
        assert!(engine.clock().is_none());
    }

    #[test]
    fn missing_file_never_touches_the_backend() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, counters) = engine_with(dir.path().join("audio.wav"), Faults::default());

        let err = engine.startup().unwrap_err();
        assert!(matches!(err, EngineError::FileOpen { .. }));
        assert_eq!(engine.state(), LifecycleState::Uninitialized);
        assert_eq!(counters.checks.load(Ordering::SeqCst), 0);
        assert_eq!(counters.opens.load(Ordering::SeqCst), 0);

        engine.close();
        assert_eq!(engine.state(), LifecycleState::Closed);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsupported_format_aborts_and_releases_file() {
        let file = temp_pcm(64);
        let faults = Faults { unsupported: true, ..Faults::default() };
        let (mut engine, counters) = engine_with(file.path().to_path_buf(), faults);

        let err = engine.startup().unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedFormat(_)));
        assert_eq!(engine.state(), LifecycleState::Initialized);
        assert_eq!(counters.opens.load(Ordering::SeqCst), 0);

        engine.close();
        assert!(engine.clock().is_none());
        assert_eq!(counters.closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stream_open_failure_keeps_backend_text() {
        let file = temp_pcm(64);
        let faults = Faults { open_fails: true, ..Faults::default() };
        let (mut engine, _counters) = engine_with(file.path().to_path_buf(), faults);

        let err = engine.startup().unwrap_err();
        assert!(err.to_string().contains("device unplugged"));
        engine.close();
        assert_eq!(engine.state(), LifecycleState::Closed);
    }

    #[test]
    fn start_failure_still_closes_stream_once() {
        let file = temp_pcm(64);
        let faults = Faults { start_fails: true, ..Faults::default() };
        let (mut engine, counters) = engine_with(file.path().to_path_buf(), faults);

        let err = engine.startup().unwrap_err();
        assert!(matches!(err, EngineError::StreamStart(_)));
        assert_eq!(engine.state(), LifecycleState::StreamOpen);

        drop(engine);
        assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stages_cannot_be_skipped_or_repeated() {
        let file = temp_pcm(64);
        let (mut engine, _counters) = engine_with(file.path().to_path_buf(), Faults::default());

        assert!(matches!(
            engine.start(),
            Err(EngineError::InvalidTransition { from: LifecycleState::Uninitialized, to: LifecycleState::Streaming })
        ));
        engine.init().unwrap();
        assert!(matches!(engine.init(), Err(EngineError::InvalidTransition { .. })));
        engine.close();
        assert!(matches!(engine.init(), Err(EngineError::InvalidTransition { from: LifecycleState::Closed, .. })));
    }
}
