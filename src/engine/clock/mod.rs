use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

/// Represents the current playback state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackState {
    Idle = 0,
    Playing = 1,
    Complete = 2,
}

impl From<u8> for PlaybackState {
    fn from(value: u8) -> Self {
        match value {
            1 => PlaybackState::Playing,
            2 => PlaybackState::Complete,
            _ => PlaybackState::Idle,
        }
    }
}

/// The PlaybackClock tracks how far into the source file playback has got.
/// Position is a byte offset so it maps directly onto the file, and it is
/// kept in atomics so the real-time callback can update it without locking.
///
/// The byte position has a single writer (the fill callback). Other threads
/// only read it.
pub struct PlaybackClock {
    /// Bytes of the source already handed to the device.
    byte_pos: AtomicU64,
    /// Total length of the source in bytes.
    file_size: u64,
    sample_rate: u32,
    channels: u16,
    /// Current state of playback (stored as u8 for atomicity).
    state: AtomicU8,
    /// Set by the feeder once it has nothing more to push.
    exhausted: AtomicBool,
}

impl PlaybackClock {
    pub fn new(file_size: u64, sample_rate: u32, channels: u16) -> Self {
        Self {
            byte_pos: AtomicU64::new(0),
            file_size,
            sample_rate,
            channels,
            state: AtomicU8::new(PlaybackState::Idle as u8),
            exhausted: AtomicBool::new(false),
        }
    }

    /// Returns the current read offset in bytes.
    pub fn byte_pos(&self) -> u64 {
        self.byte_pos.load(Ordering::Relaxed)
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Advances the read offset by `bytes`, never past the end of the file.
    /// Returns the new offset.
    pub fn advance(&self, bytes: u64) -> u64 {
        let next = self.byte_pos().saturating_add(bytes).min(self.file_size);
        self.byte_pos.store(next, Ordering::Release);
        next
    }

    pub fn is_at_end(&self) -> bool {
        self.byte_pos() >= self.file_size
    }

    /// Returns the current playback position in seconds.
    pub fn time_secs(&self) -> f64 {
        let bytes_per_sec = self.sample_rate as f64 * self.channels as f64 * 2.0;
        if bytes_per_sec > 0.0 {
            self.byte_pos() as f64 / bytes_per_sec
        } else {
            0.0
        }
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState::from(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: PlaybackState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn mark_exhausted(&self) {
        self.exhausted.store(true, Ordering::Release);
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_clamps_to_file_size() {
        let clock = PlaybackClock::new(10, 44_100, 2);
        assert_eq!(clock.advance(4), 4);
        assert_eq!(clock.advance(4), 8);
        assert_eq!(clock.advance(4), 10);
        assert!(clock.is_at_end());
        assert_eq!(clock.advance(4), 10);
    }

    #[test]
    fn empty_source_starts_at_end() {
        let clock = PlaybackClock::new(0, 44_100, 2);
        assert!(clock.is_at_end());
        assert_eq!(clock.byte_pos(), 0);
    }

    #[test]
    fn time_secs_uses_stereo_16_bit_frames() {
        let clock = PlaybackClock::new(44_100 * 4 * 3, 44_100, 2);
        clock.advance(44_100 * 4);
        assert!((clock.time_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn state_round_trips_through_atomic() {
        let clock = PlaybackClock::new(4, 44_100, 2);
        assert_eq!(clock.state(), PlaybackState::Idle);
        clock.set_state(PlaybackState::Playing);
        assert_eq!(clock.state(), PlaybackState::Playing);
        clock.set_state(PlaybackState::Complete);
        assert_eq!(clock.state(), PlaybackState::Complete);
    }
}
