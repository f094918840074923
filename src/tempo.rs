//! Tick to seconds conversion under a changing tempo.

use crate::document::{EventKind, MidiEvent};
use crate::error::PlayerError;

/// Tempo in effect before the first set-tempo event (120 BPM).
pub const DEFAULT_US_PER_QUARTER: u32 = 500_000;

/// The current ticks-to-seconds factor while walking a merged event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoTrack {
    time_division: u16,
    us_per_quarter: u32,
    seconds_per_tick: f64,
}

impl TempoTrack {
    pub fn new(time_division: u16) -> Result<Self, PlayerError> {
        if time_division == 0 {
            return Err(PlayerError::DecodeFailure(
                "time division must be positive".to_string(),
            ));
        }
        let mut track = Self {
            time_division,
            us_per_quarter: DEFAULT_US_PER_QUARTER,
            seconds_per_tick: 0.0,
        };
        track.set_tempo(DEFAULT_US_PER_QUARTER);
        Ok(track)
    }

    pub fn set_tempo(&mut self, us_per_quarter: u32) {
        self.us_per_quarter = us_per_quarter;
        self.seconds_per_tick = us_per_quarter as f64 / 1_000_000.0 / self.time_division as f64;
    }

    /// Apply `event` if it is a tempo change; other events are ignored.
    pub fn apply(&mut self, event: &MidiEvent) -> Result<(), PlayerError> {
        if event.kind()? == EventKind::Tempo {
            self.set_tempo(parse_tempo(event)?);
        }
        Ok(())
    }

    /// Seconds spanned by `ticks` at the current tempo.
    pub fn seconds_for(&self, ticks: u64) -> f64 {
        self.seconds_per_tick * ticks as f64
    }

    pub fn us_per_quarter(&self) -> u32 {
        self.us_per_quarter
    }

    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.us_per_quarter as f64
    }
}

/// Read the 24-bit big-endian microseconds-per-quarter payload of a set-tempo event.
pub fn parse_tempo(event: &MidiEvent) -> Result<u32, PlayerError> {
    match event.data.as_slice() {
        [a, b, c] => Ok(u32::from_be_bytes([0, *a, *b, *c])),
        other => Err(PlayerError::MalformedTempo {
            ticks: event.ticks,
            len: other.len(),
        }),
    }
}
