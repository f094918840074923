//! Note timing extraction
//!
//! Walks the merged event stream of a document once, converting ticks to seconds and
//! pairing note-ons with the note-offs that close them.

use crate::document::{EventKind, MidiDocument};
use crate::error::PlayerError;
use crate::tempo::TempoTrack;

use super::types::{
    NoteInterval, NoteTimeline, CHANNEL_COUNT, MIN_PERCUSSION_LENGTH, PERCUSSION_CHANNEL,
};

/// A note-on still waiting for its note-off.
#[derive(Debug, Clone, Copy)]
struct UnfinishedNote {
    pitch: u8,
    /// Position of the interval in its channel's output list.
    index: usize,
}

/// Per-channel output lists plus the notes still open on each channel.
struct NoteWalk {
    channels: [Vec<NoteInterval>; CHANNEL_COUNT],
    unfinished: [Vec<UnfinishedNote>; CHANNEL_COUNT],
}

impl NoteWalk {
    fn new() -> Self {
        Self {
            channels: Default::default(),
            unfinished: Default::default(),
        }
    }

    fn open(&mut self, channel: u8, pitch: u8, velocity: u8, elapsed: f64) {
        // Re-triggering a sounding pitch ends the earlier note first.
        self.close(channel, pitch, elapsed);

        let ch = channel as usize;
        self.unfinished[ch].push(UnfinishedNote {
            pitch,
            index: self.channels[ch].len(),
        });
        self.channels[ch].push(NoteInterval {
            pitch,
            start: elapsed,
            length: 0.0,
            velocity: velocity as f64 / 127.0,
            channel,
        });
    }

    /// Close the first open note of `pitch` on `channel`, if any.
    fn close(&mut self, channel: u8, pitch: u8, elapsed: f64) {
        let ch = channel as usize;
        if let Some(position) = self.unfinished[ch].iter().position(|n| n.pitch == pitch) {
            let note = self.unfinished[ch].remove(position);
            self.finish(channel, note, elapsed);
        }
    }

    fn finish(&mut self, channel: u8, note: UnfinishedNote, elapsed: f64) {
        let interval = &mut self.channels[channel as usize][note.index];
        let length = elapsed - interval.start;
        interval.length = if channel == PERCUSSION_CHANNEL {
            length.max(MIN_PERCUSSION_LENGTH)
        } else {
            length
        };
    }

    fn close_all(mut self, elapsed: f64) -> NoteTimeline {
        for channel in 0..CHANNEL_COUNT {
            let open = std::mem::take(&mut self.unfinished[channel]);
            for note in open {
                self.finish(channel as u8, note, elapsed);
            }
        }
        NoteTimeline::from_channels(self.channels)
    }
}

/// Extract per-channel note intervals from a document.
///
/// The document is not modified; calling this twice on the same document yields equal
/// timelines.
///
/// # Errors
/// Returns a decode failure if the time division is zero, a note event is truncated,
/// or a tempo event's payload is not three bytes. No partial timeline is returned.
///
/// # Example
/// ```rust
/// use midi_player::{extract_notes, MidiDocument};
///
/// let empty = MidiDocument::new(96, vec![]).unwrap();
/// let timeline = extract_notes(&empty).unwrap();
/// assert!(timeline.is_empty());
/// assert_eq!(timeline.channels().len(), 16);
/// ```
pub fn extract_notes(document: &MidiDocument) -> Result<NoteTimeline, PlayerError> {
    let events = document.merged_events();
    let mut tempo = TempoTrack::new(document.time_division)?;
    let mut walk = NoteWalk::new();
    let mut elapsed = 0.0;

    for (i, event) in events.iter().enumerate() {
        match event.kind()? {
            EventKind::NoteOn {
                channel,
                pitch,
                velocity,
            } => walk.open(channel, pitch, velocity, elapsed),
            EventKind::NoteOff { channel, pitch } => walk.close(channel, pitch, elapsed),
            EventKind::Tempo => {
                tempo.apply(event)?;
            }
            EventKind::Other => {}
        }

        if let Some(next) = events.get(i + 1) {
            elapsed += tempo.seconds_for(next.ticks - event.ticks);
        }
    }

    Ok(walk.close_all(elapsed))
}
