//! # Public API
//!
//! One-call entry points for working with MIDI bytes directly, without a player.
//!
//! ## Functions
//!
//! - [`decode()`] - Parse Standard MIDI File bytes into a [`MidiDocument`]
//! - [`decode_and_extract()`] - Parse and produce the per-channel [`NoteTimeline`]
//! - [`describe()`] - Parse and summarize: timing, track and note counts
//!
//! ## Typical Usage
//!
//! ```rust,no_run
//! use midi_player::decode_and_extract;
//!
//! let bytes = std::fs::read("song.mid").unwrap();
//! let timeline = decode_and_extract(&bytes)?;
//! for note in timeline.channel(0) {
//!     println!("{} at {:.3}s for {:.3}s", note.pitch, note.start, note.length);
//! }
//! # Ok::<(), midi_player::PlayerError>(())
//! ```

use serde::Serialize;

use crate::{
    extract_notes, MidiDecoder, MidiDocument, NoteTimeline, PlayerError, SmfDecoder, TempoTrack,
};

/// Parse Standard MIDI File bytes.
///
/// # Errors
/// Returns [`PlayerError::DecodeFailure`] for anything `midly` rejects and for SMPTE
/// timecode divisions.
pub fn decode(bytes: &[u8]) -> Result<MidiDocument, PlayerError> {
    SmfDecoder.decode(bytes)
}

/// Parse Standard MIDI File bytes and extract their note timeline.
///
/// # Pipeline
/// 1. Decode the file with [`SmfDecoder`]
/// 2. Merge the tracks and walk them with the tempo map
/// 3. Pair note-ons with note-offs per channel
///
/// # Errors
/// Any decode failure, including a malformed tempo event.
pub fn decode_and_extract(bytes: &[u8]) -> Result<NoteTimeline, PlayerError> {
    let document = decode(bytes)?;
    extract_notes(&document)
}

/// Per-channel note count in a [`DocumentSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub channel: u8,
    pub notes: usize,
    pub lowest_pitch: u8,
    pub highest_pitch: u8,
}

/// What `info` prints about a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub time_division: u16,
    pub duration: f64,
    pub tracks: usize,
    pub events: usize,
    pub notes: usize,
    /// Tempo in effect at tick 0.
    pub initial_bpm: f64,
    /// Only channels that carry notes.
    pub channels: Vec<ChannelSummary>,
}

impl DocumentSummary {
    pub fn new(document: &MidiDocument, timeline: &NoteTimeline) -> Result<Self, PlayerError> {
        let mut tempo = TempoTrack::new(document.time_division)?;
        for event in document.merged_events() {
            if event.ticks > 0 {
                break;
            }
            tempo.apply(event)?;
        }

        let channels = timeline
            .channels()
            .iter()
            .enumerate()
            .filter(|(_, notes)| !notes.is_empty())
            .map(|(channel, notes)| ChannelSummary {
                channel: channel as u8,
                notes: notes.len(),
                lowest_pitch: notes.iter().map(|n| n.pitch).min().unwrap_or_default(),
                highest_pitch: notes.iter().map(|n| n.pitch).max().unwrap_or_default(),
            })
            .collect();

        Ok(Self {
            time_division: document.time_division,
            duration: document.duration,
            tracks: document.tracks.len(),
            events: document.event_count(),
            notes: timeline.len(),
            initial_bpm: tempo.bpm(),
            channels,
        })
    }
}

/// Parse Standard MIDI File bytes and summarize them.
pub fn describe(bytes: &[u8]) -> Result<DocumentSummary, PlayerError> {
    let document = decode(bytes)?;
    let timeline = extract_notes(&document)?;
    DocumentSummary::new(&document, &timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MidiEvent;

    #[test]
    fn test_summary_counts_only_used_channels() {
        let doc = MidiDocument::new(
            480,
            vec![
                vec![MidiEvent::tempo(0, 400_000)],
                vec![
                    MidiEvent::note_on(0, 2, 50, 80),
                    MidiEvent::note_on(0, 2, 57, 80),
                    MidiEvent::note_off(480, 2, 50),
                    MidiEvent::note_off(480, 2, 57),
                    MidiEvent::note_on(480, 9, 36, 127),
                    MidiEvent::note_off(480, 9, 36),
                ],
            ],
        )
        .unwrap();
        let timeline = extract_notes(&doc).unwrap();
        let summary = DocumentSummary::new(&doc, &timeline).unwrap();

        assert_eq!(summary.tracks, 2);
        assert_eq!(summary.events, 7);
        assert_eq!(summary.notes, 3);
        assert!((summary.initial_bpm - 150.0).abs() < 1e-9);
        assert_eq!(
            summary.channels,
            vec![
                ChannelSummary {
                    channel: 2,
                    notes: 2,
                    lowest_pitch: 50,
                    highest_pitch: 57,
                },
                ChannelSummary {
                    channel: 9,
                    notes: 1,
                    lowest_pitch: 36,
                    highest_pitch: 36,
                },
            ]
        );
    }

    #[test]
    fn test_decode_and_extract_rejects_garbage() {
        let err = decode_and_extract(b"RIFF").unwrap_err();
        assert_eq!(err.kind(), "decode");
    }
}
