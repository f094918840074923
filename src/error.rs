//! # Error Types
//!
//! This module defines all error types for the MIDI player.
//!
//! Every variant is fatal to the load that produced it: the widget enters its error
//! state, controls are disabled, and the message below is shown to the user.
//!
//! ## Error Types
//! - `DecodeFailure` / `MalformedTempo` - the MIDI data could not be turned into timings
//! - `ResourceFetchFailure` - the MIDI source or the instrument bank could not be fetched
//! - `NoContent` - a load was requested with nothing to load
//! - `BackendInitFailure` - the audio backend could not be constructed
//! - `AudioDisabled` - no instrument bank is configured
//!
//! ## Usage
//! ```rust
//! use midi_player::{decode_and_extract, PlayerError};
//!
//! match decode_and_extract(b"not a midi file") {
//!     Ok(timeline) => println!("{} notes", timeline.len()),
//!     Err(e) if e.is_decode_failure() => eprintln!("Bad MIDI data: {}", e),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// The MIDI bytes or the decoded event stream are malformed.
    ///
    /// # Example
    /// ```
    /// # use midi_player::PlayerError;
    /// let err = PlayerError::DecodeFailure("time division must be positive".to_string());
    /// assert_eq!(err.to_string(), "Decode error: time division must be positive");
    /// ```
    #[error("Decode error: {0}")]
    DecodeFailure(String),

    /// A set-tempo meta event whose payload is not exactly three bytes.
    ///
    /// A wrong tempo corrupts every timing after it, so this is never defaulted.
    ///
    /// # Example
    /// ```
    /// # use midi_player::PlayerError;
    /// let err = PlayerError::MalformedTempo { ticks: 960, len: 2 };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Malformed tempo event at tick 960: expected 3 data bytes, found 2"
    /// );
    /// ```
    #[error("Malformed tempo event at tick {ticks}: expected 3 data bytes, found {len}")]
    MalformedTempo { ticks: u64, len: usize },

    /// Fetching the MIDI source or the instrument bank failed.
    #[error("Failed to fetch {resource}: {message}")]
    ResourceFetchFailure { resource: String, message: String },

    /// Load requested with neither a source nor a document configured.
    #[error("No content loaded")]
    NoContent,

    /// The audio backend could not be initialized. A later load may succeed.
    #[error("Audio backend unavailable: {0}")]
    BackendInitFailure(String),

    /// The instrument bank setting is absent, so audio is disabled.
    #[error("Audio disabled: no instrument bank configured")]
    AudioDisabled,
}

impl PlayerError {
    /// True for errors caused by malformed MIDI data.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            PlayerError::DecodeFailure(_) | PlayerError::MalformedTempo { .. }
        )
    }

    /// Short machine-readable name, used by the JSON bridges.
    pub fn kind(&self) -> &'static str {
        match self {
            PlayerError::DecodeFailure(_) | PlayerError::MalformedTempo { .. } => "decode",
            PlayerError::ResourceFetchFailure { .. } => "fetch",
            PlayerError::NoContent => "no-content",
            PlayerError::BackendInitFailure(_) => "backend",
            PlayerError::AudioDisabled => "audio-disabled",
        }
    }
}
