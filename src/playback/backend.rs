//! The audio backend seam.
//!
//! Synthesis lives outside this crate. A backend owns the transport clock and renders
//! whatever document it was given; the controller only drives it through
//! [`AudioBackend`] and builds it through a [`BackendFactory`].

use std::rc::Rc;

use crate::document::MidiDocument;
use crate::error::PlayerError;

/// Bank used when the instrument-bank setting is an empty string.
pub const DEFAULT_INSTRUMENT_BANK_URL: &str =
    "https://storage.googleapis.com/magentadata/js/soundfonts/sgm_plus";

/// A fetched instrument bank (sound font), identified by its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentBank {
    pub url: String,
    pub data: Vec<u8>,
}

impl InstrumentBank {
    pub fn new(url: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            data,
        }
    }
}

/// Transport and rendering surface of a synthesis engine.
pub trait AudioBackend {
    fn play(&mut self);
    fn pause(&mut self);
    /// Transport position in seconds.
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn is_playing(&self) -> bool;
    /// Swap the rendered content without reallocating the backend.
    fn load_song_list(&mut self, documents: &[Rc<MidiDocument>]);
}

/// Builds a backend for one instrument bank.
///
/// Construction may fail, e.g. when no audio device is available. That failure is
/// reported as [`PlayerError::BackendInitFailure`] and does not poison the caller.
pub trait BackendFactory {
    fn create(&mut self, bank: &InstrumentBank) -> Result<Box<dyn AudioBackend>, PlayerError>;
}
