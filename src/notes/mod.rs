//! # Notes Module
//!
//! Convert a decoded MIDI document into absolute-time note intervals for visualization
//! and playback synchronization.
//!
//! ## Purpose
//! MIDI files store time in ticks, spread over several tracks, with tempo changes
//! interleaved among the notes. Visualizers need something simpler: for each of the 16
//! channels, the notes in order, each with a start time and a length in seconds.
//!
//! ## Sub-modules
//! - `types` - NoteInterval and NoteTimeline definitions
//! - `extractor` - The timing walk that produces them
//!
//! ## Key Types
//! - [`NoteInterval`] - One note: pitch, start, length, velocity, channel
//! - [`NoteTimeline`] - One ordered list of intervals per channel
//!
//! ## Entry Point
//! [`extract_notes()`] - Walk a [`MidiDocument`](crate::MidiDocument) and build its timeline
//!
//! ## Example
//! ```rust
//! use midi_player::{extract_notes, MidiDocument, MidiEvent};
//!
//! let doc = MidiDocument::new(480, vec![vec![
//!     MidiEvent::tempo(0, 500_000),
//!     MidiEvent::note_on(0, 0, 60, 100),
//!     MidiEvent::note_off(480, 0, 60),
//! ]]).unwrap();
//!
//! let timeline = extract_notes(&doc).unwrap();
//! let note = timeline.channel(0)[0];
//! assert_eq!(note.pitch, 60);
//! assert_eq!(note.start, 0.0);
//! assert!((note.length - 0.5).abs() < 1e-9);
//! ```
//!
//! ## Timing Rules
//!
//! ### Merging
//! All tracks are merged and stable-sorted by tick. Events sharing a tick keep the
//! order in which their tracks emitted them.
//!
//! ### Tempo
//! The elapsed time advances *after* each event is applied, by the tick gap to the next
//! event at the tempo now in effect. A tempo change at tick T therefore governs the
//! step that starts at T and never reaches back before it.
//!
//! ### Open notes
//! - A note-on with velocity 0 is a note-off.
//! - A note-on for a pitch already sounding on that channel closes the earlier note.
//! - A note-off closes the first open note of that pitch (FIFO).
//! - Notes still open at the end of the stream close at the final elapsed time.
//! - Percussion (channel 9) notes last at least [`MIN_PERCUSSION_LENGTH`] seconds.

mod extractor;
mod types;

#[cfg(test)]
mod tests;

pub use extractor::extract_notes;
pub use types::{
    NoteInterval, NoteTimeline, CHANNEL_COUNT, MIN_PERCUSSION_LENGTH, PERCUSSION_CHANNEL,
};
