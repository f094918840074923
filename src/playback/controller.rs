//! Playback controller
//!
//! Owns the audio backend and the loaded document, and tracks the transport through
//! `Unloaded -> Loading -> Ready <-> Playing`, with `Error` reachable from `Loading`.

use std::rc::Rc;

use crate::document::MidiDocument;
use crate::error::PlayerError;
use crate::notes::{NoteInterval, NoteTimeline};

use super::backend::{AudioBackend, BackendFactory, InstrumentBank};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Unloaded,
    Loading,
    Ready,
    Playing,
    Error,
}

/// What one transport poll observed, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportSignal {
    /// A note whose start time the transport just crossed.
    Note(NoteInterval),
    /// Transport position after the poll.
    Position(f64),
    /// The content ended on its own.
    Finished,
}

/// Start-ordered notes plus the index of the next one to announce.
#[derive(Debug, Clone, Default)]
struct NoteCursor {
    notes: Vec<NoteInterval>,
    next: usize,
}

impl NoteCursor {
    fn new(timeline: &NoteTimeline) -> Self {
        Self {
            notes: timeline.by_start(),
            next: 0,
        }
    }

    /// Position the cursor so notes starting at or after `seconds` are still ahead.
    fn seek(&mut self, seconds: f64) {
        self.next = self.notes.partition_point(|note| note.start < seconds);
    }

    /// Notes starting in `(previous position, seconds]`.
    fn advance(&mut self, seconds: f64) -> &[NoteInterval] {
        let from = self.next;
        let ahead = self.notes[from..].partition_point(|note| note.start <= seconds);
        self.next = from + ahead;
        &self.notes[from..self.next]
    }
}

pub struct PlaybackController {
    state: PlaybackState,
    backend: Option<Box<dyn AudioBackend>>,
    bank_url: Option<String>,
    document: Option<Rc<MidiDocument>>,
    cursor: NoteCursor,
    position: f64,
    looping: bool,
    last_error: Option<PlayerError>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Unloaded,
            backend: None,
            bank_url: None,
            document: None,
            cursor: NoteCursor::default(),
            position: 0.0,
            looping: false,
            last_error: None,
        }
    }

    /// Suspend playback and enter `Loading` while resources are being fetched.
    pub fn begin_load(&mut self) {
        self.pause();
        self.state = PlaybackState::Loading;
    }

    /// Wire `document` to a backend for `bank` and become `Ready` at position 0.
    ///
    /// A backend already built for the same bank is reused through
    /// [`AudioBackend::load_song_list`]. For any other bank the old backend is dropped
    /// before the factory is asked for a new one, so two never coexist.
    ///
    /// # Errors
    /// A factory failure leaves the controller in `Error` with no backend and no
    /// document. A later `load` may still succeed.
    pub fn load(
        &mut self,
        document: Rc<MidiDocument>,
        notes: &NoteTimeline,
        bank: &InstrumentBank,
        factory: &mut dyn BackendFactory,
    ) -> Result<(), PlayerError> {
        self.begin_load();

        let reusable = self.backend.is_some() && self.bank_url.as_deref() == Some(&bank.url);
        if !reusable {
            if self.backend.take().is_some() {
                log::debug!(
                    "Releasing audio backend for {}",
                    self.bank_url.as_deref().unwrap_or("<unknown>")
                );
            }
            self.bank_url = None;
            match factory.create(bank) {
                Ok(backend) => {
                    log::info!("Audio backend ready for {}", bank.url);
                    self.backend = Some(backend);
                    self.bank_url = Some(bank.url.clone());
                }
                Err(e) => {
                    self.fail(e.clone());
                    return Err(e);
                }
            }
        }

        if let Some(backend) = self.backend.as_mut() {
            backend.load_song_list(std::slice::from_ref(&document));
            backend.set_current_time(0.0);
        }
        self.document = Some(document);
        self.cursor = NoteCursor::new(notes);
        self.position = 0.0;
        self.last_error = None;
        self.state = PlaybackState::Ready;
        Ok(())
    }

    /// Enter `Error`, dropping the document. The backend, if any, is kept for reuse.
    pub fn fail(&mut self, error: PlayerError) {
        self.pause();
        log::warn!("Playback load failed: {}", error);
        self.document = None;
        self.cursor = NoteCursor::default();
        self.position = 0.0;
        self.last_error = Some(error);
        self.state = PlaybackState::Error;
    }

    /// Start the transport. Returns false when not `Ready` (already playing included).
    pub fn play(&mut self) -> bool {
        if self.state != PlaybackState::Ready {
            return false;
        }
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };
        backend.play();
        self.state = PlaybackState::Playing;
        true
    }

    /// Suspend the transport, keeping the position. Returns false unless `Playing`.
    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let duration = self.duration();
        if let Some(backend) = self.backend.as_mut() {
            backend.pause();
            self.position = backend.current_time().clamp(0.0, duration);
        }
        self.state = PlaybackState::Ready;
        true
    }

    pub fn current_time(&self) -> f64 {
        self.position
    }

    /// Seek without changing play/pause state. The position is clamped to the document.
    ///
    /// The note cursor moves with the backend, so the next poll announces notes from
    /// the new position only.
    pub fn set_current_time(&mut self, seconds: f64) -> Result<(), PlayerError> {
        if self.document.is_none() {
            return Err(PlayerError::NoContent);
        }
        let seconds = seconds.clamp(0.0, self.duration());
        if let Some(backend) = self.backend.as_mut() {
            backend.set_current_time(seconds);
        }
        self.cursor.seek(seconds);
        self.position = seconds;
        Ok(())
    }

    /// Read the transport clock and report what happened since the previous poll.
    pub fn poll(&mut self) -> Vec<TransportSignal> {
        if self.state != PlaybackState::Playing {
            return Vec::new();
        }
        let Some(backend) = self.backend.as_mut() else {
            return Vec::new();
        };

        let duration = self.document.as_ref().map_or(0.0, |doc| doc.duration);
        let now = backend.current_time().clamp(0.0, duration);
        let ended = now >= duration || !backend.is_playing();

        let mut signals: Vec<TransportSignal> = self
            .cursor
            .advance(now)
            .iter()
            .copied()
            .map(TransportSignal::Note)
            .collect();
        self.position = now;
        signals.push(TransportSignal::Position(now));

        if ended {
            backend.pause();
            self.state = PlaybackState::Ready;
            signals.push(TransportSignal::Finished);
        }
        signals
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn duration(&self) -> f64 {
        self.document.as_ref().map_or(0.0, |doc| doc.duration)
    }

    pub fn document(&self) -> Option<&Rc<MidiDocument>> {
        self.document.as_ref()
    }

    pub fn bank_url(&self) -> Option<&str> {
        self.bank_url.as_deref()
    }

    pub fn last_error(&self) -> Option<&PlayerError> {
        self.last_error.as_ref()
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }
}
