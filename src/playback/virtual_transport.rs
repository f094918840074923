//! A silent backend driven by a host-advanced clock.
//!
//! `VirtualTransport` keeps transport time the way a real engine would, but its clock
//! only moves when the host calls [`VirtualClock::advance`]. The CLI simulator and the
//! tests use it to run the player deterministically.

use std::cell::Cell;
use std::rc::Rc;

use crate::document::MidiDocument;
use crate::error::PlayerError;

use super::backend::{AudioBackend, BackendFactory, InstrumentBank};

/// Shared wall clock for virtual transports, in seconds.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock(Rc<Cell<f64>>);

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.0.get()
    }

    pub fn advance(&self, seconds: f64) {
        self.0.set(self.0.get() + seconds);
    }
}

#[derive(Debug, Default)]
struct Counters {
    created: Cell<usize>,
    live: Cell<usize>,
    song_loads: Cell<usize>,
}

/// Counts of transports built and still alive, shared with the factory's owner.
#[derive(Debug, Clone, Default)]
pub struct TransportStats(Rc<Counters>);

impl TransportStats {
    pub fn created(&self) -> usize {
        self.0.created.get()
    }

    pub fn live(&self) -> usize {
        self.0.live.get()
    }

    pub fn song_loads(&self) -> usize {
        self.0.song_loads.get()
    }
}

pub struct VirtualTransport {
    clock: VirtualClock,
    stats: TransportStats,
    bank_url: String,
    song: Option<Rc<MidiDocument>>,
    /// Clock reading when the transport last started.
    anchor_clock: f64,
    /// Transport position at `anchor_clock`.
    anchor_position: f64,
    playing: bool,
}

impl VirtualTransport {
    fn new(clock: VirtualClock, stats: TransportStats, bank_url: String) -> Self {
        stats.0.created.set(stats.0.created.get() + 1);
        stats.0.live.set(stats.0.live.get() + 1);
        Self {
            clock,
            stats,
            bank_url,
            song: None,
            anchor_clock: 0.0,
            anchor_position: 0.0,
            playing: false,
        }
    }

    fn song_duration(&self) -> f64 {
        self.song.as_ref().map_or(0.0, |song| song.duration)
    }

    fn raw_time(&self) -> f64 {
        if self.playing {
            self.anchor_position + (self.clock.now() - self.anchor_clock)
        } else {
            self.anchor_position
        }
    }
}

impl Drop for VirtualTransport {
    fn drop(&mut self) {
        log::debug!("Virtual transport for {} released", self.bank_url);
        self.stats.0.live.set(self.stats.0.live.get() - 1);
    }
}

impl AudioBackend for VirtualTransport {
    fn play(&mut self) {
        if !self.playing {
            self.anchor_clock = self.clock.now();
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        if self.playing {
            self.anchor_position = self.current_time();
            self.playing = false;
        }
    }

    fn current_time(&self) -> f64 {
        self.raw_time().min(self.song_duration())
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.anchor_position = seconds.clamp(0.0, self.song_duration());
        self.anchor_clock = self.clock.now();
    }

    fn is_playing(&self) -> bool {
        self.playing && self.raw_time() < self.song_duration()
    }

    fn load_song_list(&mut self, documents: &[Rc<MidiDocument>]) {
        self.stats
            .0
            .song_loads
            .set(self.stats.0.song_loads.get() + 1);
        self.song = documents.first().cloned();
        self.playing = false;
        self.anchor_position = 0.0;
    }
}

/// Builds [`VirtualTransport`]s on a shared clock.
#[derive(Debug, Clone, Default)]
pub struct VirtualTransportFactory {
    clock: VirtualClock,
    stats: TransportStats,
    unavailable: Rc<Cell<bool>>,
}

impl VirtualTransportFactory {
    pub fn new(clock: VirtualClock) -> Self {
        Self {
            clock,
            stats: TransportStats::default(),
            unavailable: Rc::new(Cell::new(false)),
        }
    }

    /// Make subsequent `create` calls fail like a missing audio device would.
    ///
    /// Clones share this switch.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    pub fn stats(&self) -> TransportStats {
        self.stats.clone()
    }
}

impl BackendFactory for VirtualTransportFactory {
    fn create(&mut self, bank: &InstrumentBank) -> Result<Box<dyn AudioBackend>, PlayerError> {
        if self.unavailable.get() {
            return Err(PlayerError::BackendInitFailure(
                "audio output unavailable".to_string(),
            ));
        }
        Ok(Box::new(VirtualTransport::new(
            self.clock.clone(),
            self.stats.clone(),
            bank.url.clone(),
        )))
    }
}
