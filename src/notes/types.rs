//! Note interval type definitions
//!
//! These are the extractor's output and the payload of per-note playback events.

use serde::Serialize;

/// Number of MIDI channels.
pub const CHANNEL_COUNT: usize = 16;

/// The General MIDI percussion channel (channel 10, zero-based).
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Shortest length given to a percussion note, in seconds.
pub const MIN_PERCUSSION_LENGTH: f64 = 0.02;

/// A single note in absolute time.
///
/// # Fields
/// - `pitch`: MIDI key number (0-127)
/// - `start`: Seconds from the beginning of the document
/// - `length`: Seconds between note-on and the note-off that closed it
/// - `velocity`: Note-on velocity scaled to 0.0-1.0 (raw value / 127)
/// - `channel`: MIDI channel (0-15)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInterval {
    pub pitch: u8,
    pub start: f64,
    pub length: f64,
    pub velocity: f64,
    pub channel: u8,
}

/// Extracted notes, one list per channel, each in note-on order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct NoteTimeline {
    channels: [Vec<NoteInterval>; CHANNEL_COUNT],
}

impl NoteTimeline {
    pub(crate) fn from_channels(channels: [Vec<NoteInterval>; CHANNEL_COUNT]) -> Self {
        Self { channels }
    }

    /// Notes on `channel`. Channels outside 0-15 have no notes.
    pub fn channel(&self, channel: u8) -> &[NoteInterval] {
        self.channels
            .get(channel as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn channels(&self) -> &[Vec<NoteInterval>; CHANNEL_COUNT] {
        &self.channels
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoteInterval> {
        self.channels.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.channels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(Vec::is_empty)
    }

    /// True if some note begins strictly after `seconds`.
    pub fn has_notes_after(&self, seconds: f64) -> bool {
        self.iter().any(|note| note.start > seconds)
    }

    /// All notes ordered by start time.
    ///
    /// Ties keep channel order, then note-on order within the channel.
    pub fn by_start(&self) -> Vec<NoteInterval> {
        let mut notes: Vec<NoteInterval> = self.iter().copied().collect();
        notes.sort_by(|a, b| a.start.total_cmp(&b.start));
        notes
    }
}
