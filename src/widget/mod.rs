//! # Widget Module
//!
//! An embeddable MIDI player: configuration, content loading, transport controls,
//! lifecycle events and visualizer relay, driven by discrete host calls.
//!
//! ## Sub-modules
//! - `config` - [`WidgetConfig`], [`ConfigPatch`] and the attribute adapter
//! - `player` - [`MidiPlayer`], the widget state machine
//! - `registry` - [`PlaybackRegistry`], the single "currently playing" token
//! - `events` - [`PlayerEvent`] and the [`Visualizer`] trait
//! - `view` - [`ControlPanel`] and [`format_time`]
//!
//! ## Loading
//! Configuration changes never load immediately. The first content change in a tick
//! stops playback and shows the loading state; the host then calls
//! [`MidiPlayer::run_scheduled`] once, gets a [`LoadRequest`], fetches what it names
//! and hands the result to [`MidiPlayer::complete_load`]. A request made stale by a
//! later change completes as [`LoadOutcome::Superseded`] and changes nothing.
//!
//! ```rust
//! use midi_player::{
//!     LoadedResources, MidiDocument, MidiEvent, MidiPlayer, PlaybackRegistry,
//!     PlayerEvent, SmfDecoder, VirtualClock, VirtualTransportFactory,
//! };
//!
//! let registry = PlaybackRegistry::new();
//! let factory = VirtualTransportFactory::new(VirtualClock::new());
//! let player = MidiPlayer::new(registry, Box::new(SmfDecoder), Box::new(factory));
//!
//! player.set_instrument_bank(Some(""));
//! player.set_document(MidiDocument::new(480, vec![vec![
//!     MidiEvent::note_on(0, 0, 60, 100),
//!     MidiEvent::note_off(480, 0, 60),
//! ]]).unwrap());
//!
//! let outcome = player
//!     .reload_with(|request| Ok(LoadedResources {
//!         midi: None,
//!         bank: Some(midi_player::InstrumentBank::new(request.bank_url.clone(), Vec::new())),
//!     }))
//!     .unwrap();
//! assert!(outcome.is_some());
//! assert!(player.start());
//! ```
//!
//! ## Exclusivity
//! Widgets sharing a [`PlaybackRegistry`] never play at the same time. Starting one
//! stops the previous holder first, so its `stop` event precedes the new `start`.
//!
//! ## Events
//! Handlers run with no widget state borrowed, so they may call into any player. Events
//! a widget raises while one of its own handlers runs are delivered after it returns.

mod config;
mod events;
mod player;
mod registry;
mod view;


pub use config::{BankSetting, ConfigChanges, ConfigPatch, WidgetConfig, OBSERVED_ATTRIBUTES};
pub use events::{PlayerEvent, SubscriptionId, Visualizer};
pub use player::{LoadOutcome, LoadRequest, LoadedResources, MidiPlayer};
pub use registry::{PlaybackOwner, PlaybackRegistry, WidgetId};
pub use view::{format_time, ControlPanel, VisualState};
