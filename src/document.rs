//! Decoded MIDI documents and the decoder seam.
//!
//! A [`MidiDocument`] is what an external decoder hands to the player: a time division,
//! a precomputed duration, and one event list per track. Events keep their raw status
//! byte and data; [`MidiEvent::kind`] classifies the few statuses the player cares about.

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;
use crate::tempo::TempoTrack;

/// Meta event type for "set tempo".
pub const META_SET_TEMPO: u8 = 0x51;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;

/// A single event with its absolute position in ticks.
///
/// Channel messages use their status byte (`0x80..=0xEF`). Meta events store the meta
/// type as the status byte, so a tempo change has `status_byte == 0x51`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MidiEvent {
    pub ticks: u64,
    pub status_byte: u8,
    pub data: Vec<u8>,
}

/// What an event means to the timing walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
    Tempo,
    Other,
}

impl MidiEvent {
    pub fn new(ticks: u64, status_byte: u8, data: Vec<u8>) -> Self {
        Self {
            ticks,
            status_byte,
            data,
        }
    }

    pub fn note_on(ticks: u64, channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::new(ticks, NOTE_ON | (channel & 0x0F), vec![pitch, velocity])
    }

    pub fn note_off(ticks: u64, channel: u8, pitch: u8) -> Self {
        Self::new(ticks, NOTE_OFF | (channel & 0x0F), vec![pitch, 0])
    }

    pub fn tempo(ticks: u64, us_per_quarter: u32) -> Self {
        let [_, a, b, c] = us_per_quarter.to_be_bytes();
        Self::new(ticks, META_SET_TEMPO, vec![a, b, c])
    }

    /// Classify the event.
    ///
    /// A note-on with velocity 0 is reported as a note-off. Note messages missing their
    /// key or velocity byte are a decode failure.
    pub fn kind(&self) -> Result<EventKind, PlayerError> {
        let channel = self.status_byte & 0x0F;
        match self.status_byte & 0xF0 {
            NOTE_ON => match self.data.as_slice() {
                [pitch, 0, ..] => Ok(EventKind::NoteOff {
                    channel,
                    pitch: *pitch,
                }),
                [pitch, velocity, ..] => Ok(EventKind::NoteOn {
                    channel,
                    pitch: *pitch,
                    velocity: *velocity,
                }),
                _ => Err(self.truncated("note-on")),
            },
            NOTE_OFF => match self.data.as_slice() {
                [pitch, ..] => Ok(EventKind::NoteOff {
                    channel,
                    pitch: *pitch,
                }),
                _ => Err(self.truncated("note-off")),
            },
            _ if self.status_byte == META_SET_TEMPO => Ok(EventKind::Tempo),
            _ => Ok(EventKind::Other),
        }
    }

    fn truncated(&self, what: &str) -> PlayerError {
        PlayerError::DecodeFailure(format!(
            "truncated {} event at tick {} ({} data bytes)",
            what,
            self.ticks,
            self.data.len()
        ))
    }
}

/// A parsed MIDI file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MidiDocument {
    /// Ticks per quarter note.
    pub time_division: u16,
    /// Length in seconds, up to the last event of any track.
    pub duration: f64,
    pub tracks: Vec<Vec<MidiEvent>>,
}

impl MidiDocument {
    /// Build a document and compute its duration with the same tempo walk the note
    /// extractor uses.
    pub fn new(time_division: u16, tracks: Vec<Vec<MidiEvent>>) -> Result<Self, PlayerError> {
        let mut document = Self {
            time_division,
            duration: 0.0,
            tracks,
        };
        document.duration = document.compute_duration()?;
        Ok(document)
    }

    /// All events of all tracks, stable-sorted by tick.
    ///
    /// Events on the same tick keep track order, then their order within the track.
    pub fn merged_events(&self) -> Vec<&MidiEvent> {
        let mut events: Vec<&MidiEvent> = self.tracks.iter().flatten().collect();
        events.sort_by_key(|event| event.ticks);
        events
    }

    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(Vec::len).sum()
    }

    fn compute_duration(&self) -> Result<f64, PlayerError> {
        let events = self.merged_events();
        let mut tempo = TempoTrack::new(self.time_division)?;
        let mut elapsed = 0.0;
        for (i, event) in events.iter().enumerate() {
            tempo.apply(event)?;
            if let Some(next) = events.get(i + 1) {
                elapsed += tempo.seconds_for(next.ticks - event.ticks);
            }
        }
        Ok(elapsed)
    }
}

/// Turns raw file bytes into a [`MidiDocument`].
///
/// The player never parses bytes itself; hosts inject an implementation such as
/// [`crate::smf::SmfDecoder`].
pub trait MidiDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<MidiDocument, PlayerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_with_zero_velocity_is_note_off() {
        let event = MidiEvent::new(0, 0x93, vec![64, 0]);
        assert_eq!(
            event.kind().unwrap(),
            EventKind::NoteOff {
                channel: 3,
                pitch: 64
            }
        );
    }

    #[test]
    fn test_truncated_note_on_is_decode_failure() {
        let event = MidiEvent::new(12, 0x90, vec![60]);
        let err = event.kind().unwrap_err();
        assert!(err.is_decode_failure());
        assert!(err.to_string().contains("tick 12"));
    }

    #[test]
    fn test_controller_and_meta_events_are_other() {
        assert_eq!(
            MidiEvent::new(0, 0xB0, vec![7, 100]).kind().unwrap(),
            EventKind::Other
        );
        assert_eq!(
            MidiEvent::new(0, 0x2F, vec![]).kind().unwrap(),
            EventKind::Other
        );
        assert_eq!(MidiEvent::tempo(0, 500_000).kind().unwrap(), EventKind::Tempo);
    }

    #[test]
    fn test_merge_is_stable_across_tracks() {
        let doc = MidiDocument::new(
            480,
            vec![
                vec![MidiEvent::note_on(0, 0, 60, 90), MidiEvent::note_off(480, 0, 60)],
                vec![MidiEvent::note_on(0, 1, 62, 90), MidiEvent::note_off(240, 1, 62)],
            ],
        )
        .unwrap();
        let order: Vec<(u64, u8)> = doc
            .merged_events()
            .iter()
            .map(|e| (e.ticks, e.status_byte))
            .collect();
        assert_eq!(order, vec![(0, 0x90), (0, 0x91), (240, 0x81), (480, 0x80)]);
    }

    #[test]
    fn test_duration_follows_tempo_changes() {
        // One beat at 120 BPM, one beat at 60 BPM.
        let doc = MidiDocument::new(
            480,
            vec![vec![
                MidiEvent::tempo(0, 500_000),
                MidiEvent::tempo(480, 1_000_000),
                MidiEvent::new(960, 0x2F, vec![]),
            ]],
        )
        .unwrap();
        assert!((doc.duration - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_time_division_is_rejected() {
        assert!(MidiDocument::new(0, vec![]).unwrap_err().is_decode_failure());
    }
}
