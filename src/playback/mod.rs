//! # Playback Module
//!
//! Drive an external audio backend from a loaded MIDI document.
//!
//! ## Sub-modules
//! - `backend` - The [`AudioBackend`] / [`BackendFactory`] seam to the synthesis engine
//! - `controller` - [`PlaybackController`], the transport state machine
//! - `virtual_transport` - A silent backend on a host-advanced clock
//!
//! ## Transport States
//! ```text
//! Unloaded -> Loading -> Ready <-> Playing
//!                \-> Error -> Loading ...
//! ```
//! - `play()` only acts in `Ready`; `pause()` only acts in `Playing`.
//! - Seeking is allowed whenever a document is loaded and keeps the play/pause state.
//! - [`PlaybackController::poll`] turns transport progress into [`TransportSignal`]s:
//!   the notes crossed since the last poll, the new position, and `Finished` at the end.
//!
//! ## Backend Ownership
//! The controller holds at most one backend. Reloading with the same instrument bank
//! swaps the song in place; a different bank drops the old backend before the new one
//! is built.

mod backend;
mod controller;
mod virtual_transport;

#[cfg(test)]
mod tests;

pub use backend::{AudioBackend, BackendFactory, InstrumentBank, DEFAULT_INSTRUMENT_BANK_URL};
pub use controller::{PlaybackController, PlaybackState, TransportSignal};
pub use virtual_transport::{
    TransportStats, VirtualClock, VirtualTransport, VirtualTransportFactory,
};
