//! The embeddable player widget.
//!
//! [`MidiPlayer`] is a cheap-to-clone handle around the widget state. All mutation
//! happens on discrete calls from the host: configuration changes, the end of a
//! scheduling tick ([`MidiPlayer::run_scheduled`]), load completions, user input, and
//! transport polls ([`MidiPlayer::tick`]).
//!
//! Events raised while the widget state is borrowed are queued and delivered once it
//! is released. Listeners and visualizers may therefore call back into any player,
//! including the one that raised the event: autoplay on `load` or advancing a playlist
//! on `stop` are ordinary host patterns.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::document::{MidiDecoder, MidiDocument};
use crate::error::PlayerError;
use crate::notes::{extract_notes, NoteTimeline};
use crate::playback::{BackendFactory, InstrumentBank, PlaybackController, TransportSignal};

use super::config::{BankSetting, ConfigChanges, ConfigPatch, WidgetConfig};
use super::events::{Bindings, PlayerEvent, SubscriptionId, Visualizer};
use super::registry::{PlaybackOwner, PlaybackRegistry, WidgetId};
use super::view::{format_time, ControlPanel, VisualState};

/// Work the host must perform before calling [`MidiPlayer::complete_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    generation: u64,
    /// MIDI file to fetch. `None` means the document set with `set_document` is used.
    pub source: Option<String>,
    /// Instrument bank to fetch.
    pub bank_url: String,
    /// The bank is already wired to the backend; fetching it again is optional.
    pub bank_loaded: bool,
}

impl LoadRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What the host fetched for a [`LoadRequest`].
#[derive(Debug, Clone, Default)]
pub struct LoadedResources {
    pub midi: Option<Vec<u8>>,
    pub bank: Option<InstrumentBank>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// A newer reload was requested meanwhile; the result was discarded.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Loading,
    Error(String),
    Ready,
}

#[derive(Debug, Clone, Copy)]
struct SeekDrag {
    /// Resume playback on release.
    resume: bool,
}

struct PlayerCore {
    id: WidgetId,
    registry: Rc<PlaybackRegistry>,
    config: WidgetConfig,
    decoder: Box<dyn MidiDecoder>,
    factory: Box<dyn BackendFactory>,
    controller: PlaybackController,
    direct_document: Option<Rc<MidiDocument>>,
    notes: Rc<NoteTimeline>,
    status: Status,
    playing: bool,
    seeking: Option<SeekDrag>,
    displayed_time: f64,
    generation: u64,
    reload_pending: bool,
    in_flight: Option<u64>,
    /// Events raised but not yet delivered, each with the timeline current at the time.
    pending: Vec<(PlayerEvent, Rc<NoteTimeline>)>,
}

impl PlayerCore {
    fn reconfigure(&mut self, patch: ConfigPatch) -> ConfigChanges {
        let replaces_document = matches!(patch.src, Some(Some(_)));
        let changes = self.config.apply(patch);

        if changes.looping {
            self.controller.set_looping(self.config.loop_playback);
        }
        if changes.content {
            if replaces_document {
                self.direct_document = None;
            }
            self.schedule_reload();
        }
        changes
    }

    fn set_document(&mut self, document: MidiDocument) {
        self.config.src = None;
        self.direct_document = Some(Rc::new(document));
        self.schedule_reload();
    }

    /// Invalidate any load in flight and make sure one reload runs at the end of the
    /// current tick. Only the first call in a tick stops playback.
    fn schedule_reload(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        if !self.reload_pending {
            self.reload_pending = true;
            self.stop();
            self.controller.begin_load();
            self.status = Status::Loading;
        }
    }

    fn run_scheduled(&mut self) -> Result<Option<LoadRequest>, PlayerError> {
        if !self.reload_pending {
            return Ok(None);
        }
        self.reload_pending = false;

        if self.config.src.is_none() && self.direct_document.is_none() {
            return Err(self.fail(PlayerError::NoContent));
        }
        let bank_url = match self.config.bank_setting() {
            BankSetting::Disabled => return Err(self.fail(PlayerError::AudioDisabled)),
            BankSetting::Url(url) => url,
        };

        let request = LoadRequest {
            generation: self.generation,
            source: self.config.src.clone(),
            bank_loaded: self.controller.bank_url() == Some(bank_url.as_str()),
            bank_url,
        };
        self.in_flight = Some(request.generation);
        log::debug!(
            "{} load #{} issued (source: {:?}, bank: {})",
            self.id,
            request.generation,
            request.source,
            request.bank_url
        );
        Ok(Some(request))
    }

    fn complete_load(
        &mut self,
        request: &LoadRequest,
        fetched: Result<LoadedResources, PlayerError>,
    ) -> Result<LoadOutcome, PlayerError> {
        if self.in_flight != Some(request.generation) {
            log::debug!("{} load #{} superseded, dropped", self.id, request.generation);
            return Ok(LoadOutcome::Superseded);
        }
        self.in_flight = None;

        let prepared = fetched.and_then(|resources| self.prepare(request, resources));
        let (document, notes, bank) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return Err(self.fail(e)),
        };

        let wired = self
            .controller
            .load(document, &notes, &bank, self.factory.as_mut());
        if let Err(e) = wired {
            return Err(self.fail(e));
        }
        self.controller.set_looping(self.config.loop_playback);
        self.notes = Rc::new(notes);
        self.displayed_time = 0.0;
        self.status = Status::Ready;
        log::info!(
            "{} loaded {} notes, {:.2}s",
            self.id,
            self.notes.len(),
            self.controller.duration()
        );
        self.emit(PlayerEvent::Load);
        Ok(LoadOutcome::Loaded)
    }

    /// Decode and extract everything a load needs without touching published state.
    fn prepare(
        &self,
        request: &LoadRequest,
        resources: LoadedResources,
    ) -> Result<(Rc<MidiDocument>, NoteTimeline, InstrumentBank), PlayerError> {
        let document = match (resources.midi, &request.source, &self.direct_document) {
            (Some(bytes), _, _) => Rc::new(self.decoder.decode(&bytes)?),
            (None, None, Some(document)) => document.clone(),
            (None, Some(source), _) => {
                return Err(PlayerError::ResourceFetchFailure {
                    resource: source.clone(),
                    message: "no data received".to_string(),
                })
            }
            (None, None, None) => return Err(PlayerError::NoContent),
        };
        let notes = extract_notes(&document)?;

        let bank = match resources.bank {
            Some(bank) => bank,
            None if self.controller.bank_url() == Some(request.bank_url.as_str()) => {
                InstrumentBank::new(request.bank_url.clone(), Vec::new())
            }
            None => {
                return Err(PlayerError::ResourceFetchFailure {
                    resource: request.bank_url.clone(),
                    message: "instrument bank not provided".to_string(),
                })
            }
        };
        Ok((document, notes, bank))
    }

    /// Enter the error state. Published notes are cleared and controls disabled.
    fn fail(&mut self, error: PlayerError) -> PlayerError {
        self.stop();
        self.controller.fail(error.clone());
        self.notes = Rc::new(NoteTimeline::default());
        self.displayed_time = 0.0;
        self.status = Status::Error(error.to_string());
        error
    }

    fn can_start(&self) -> bool {
        self.status == Status::Ready && self.controller.is_loaded() && !self.playing
    }

    /// Start the transport. Claiming the playing token is left to the caller; a loop
    /// restart already holds it.
    fn start(&mut self, looped: bool) -> bool {
        if !self.can_start() {
            return false;
        }

        let mut offset = self.displayed_time;
        if !self.notes.has_notes_after(offset) {
            offset = 0.0;
        }
        if self.controller.set_current_time(offset).is_err() {
            return false;
        }
        self.displayed_time = self.controller.current_time();
        self.playing = true;
        self.controller.play();

        if looped {
            log::debug!("{} looping", self.id);
            self.emit(PlayerEvent::Loop);
        } else {
            self.emit(PlayerEvent::Start);
        }
        true
    }

    fn stop(&mut self) {
        if let Some(drag) = self.seeking.as_mut() {
            drag.resume = false;
        }
        self.controller.pause();
        self.handle_stop(false);
    }

    fn handle_stop(&mut self, finished: bool) {
        if finished {
            if self.controller.is_looping() && self.playing {
                self.playing = false;
                self.emit(PlayerEvent::Stop { finished: true });
                self.displayed_time = 0.0;
                self.start(true);
                return;
            }
            self.displayed_time = self.controller.duration();
        }
        if self.playing {
            self.playing = false;
            self.emit(PlayerEvent::Stop { finished });
        }
    }

    fn tick(&mut self) {
        for signal in self.controller.poll() {
            match signal {
                TransportSignal::Note(note) => {
                    if self.playing {
                        self.emit(PlayerEvent::Note { note });
                    }
                }
                TransportSignal::Position(seconds) => {
                    if self.seeking.is_none() {
                        self.displayed_time = seconds;
                    }
                }
                TransportSignal::Finished => self.handle_stop(true),
            }
        }
    }

    fn begin_seek(&mut self) {
        if self.seeking.is_none() {
            let resume = self.controller.pause();
            self.seeking = Some(SeekDrag { resume });
        }
    }

    fn drag_seek(&mut self, seconds: f64) {
        self.begin_seek();
        self.displayed_time = seconds.clamp(0.0, self.controller.duration());
    }

    fn commit_seek(&mut self) {
        let Some(drag) = self.seeking.take() else {
            return;
        };
        let target = self.displayed_time;
        if self.status == Status::Ready && self.controller.set_current_time(target).is_ok() {
            self.displayed_time = self.controller.current_time();
            if drag.resume && self.playing {
                self.controller.play();
            }
        }
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.displayed_time = seconds.clamp(0.0, self.controller.duration());
        if self.status == Status::Ready && self.controller.set_current_time(seconds).is_ok() {
            self.displayed_time = self.controller.current_time();
        }
    }

    fn visual_state(&self) -> VisualState {
        match self.status {
            Status::Loading => VisualState::Loading,
            Status::Error(_) => VisualState::Error,
            Status::Ready if self.playing => VisualState::ReadyPlaying,
            Status::Ready => VisualState::ReadyStopped,
        }
    }

    fn control_panel(&self) -> ControlPanel {
        let duration = self.controller.duration();
        ControlPanel {
            state: self.visual_state(),
            controls_enabled: self.status == Status::Ready,
            seek_max: duration,
            seek_value: self.displayed_time,
            current_time_label: format_time(self.displayed_time),
            total_time_label: format_time(duration),
            message: match &self.status {
                Status::Error(message) => Some(message.clone()),
                _ => None,
            },
        }
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.pending.push((event, self.notes.clone()));
    }
}

impl Drop for PlayerCore {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

/// Widget state and the host bindings it notifies, kept in separate cells so that
/// handlers never run while the state is borrowed.
struct PlayerShared {
    core: RefCell<PlayerCore>,
    bindings: RefCell<Bindings>,
    dispatching: Cell<bool>,
}

impl PlayerShared {
    /// Run `f` on the widget state, then deliver whatever events it raised.
    fn update<R>(&self, f: impl FnOnce(&mut PlayerCore) -> R) -> R {
        let result = f(&mut self.core.borrow_mut());
        self.dispatch();
        result
    }

    /// Deliver queued events in order. Must be called with no borrow of `core` held.
    ///
    /// A call made while this widget's handlers are already running returns at once;
    /// the outer call picks up the new events after the current handler returns.
    fn dispatch(&self) {
        if self.dispatching.replace(true) {
            return;
        }
        loop {
            let pending = std::mem::take(&mut self.core.borrow_mut().pending);
            if pending.is_empty() {
                break;
            }
            for (event, notes) in pending {
                let targets = self.bindings.borrow().targets();
                targets.deliver(&event, &notes);
            }
        }
        self.dispatching.set(false);
    }
}

impl PlaybackOwner for PlayerShared {
    fn is_playing(&self) -> bool {
        match self.core.try_borrow() {
            Ok(core) => core.playing,
            Err(_) => {
                log::warn!("Player state is busy; assuming it is not playing");
                false
            }
        }
    }

    fn stop_playback(&self) {
        match self.core.try_borrow_mut() {
            Ok(mut core) => core.stop(),
            Err(_) => {
                log::warn!("Player is busy and cannot be stopped");
                return;
            }
        }
        self.dispatch();
    }
}

/// Handle to a player widget. Clones refer to the same widget.
#[derive(Clone)]
pub struct MidiPlayer {
    shared: Rc<PlayerShared>,
}

impl MidiPlayer {
    /// Create a player with the default configuration: no source and audio disabled.
    ///
    /// A reload is scheduled right away, as when a widget is first attached.
    pub fn new(
        registry: Rc<PlaybackRegistry>,
        decoder: Box<dyn MidiDecoder>,
        factory: Box<dyn BackendFactory>,
    ) -> Self {
        Self::with_config(registry, decoder, factory, WidgetConfig::default())
    }

    pub fn with_config(
        registry: Rc<PlaybackRegistry>,
        decoder: Box<dyn MidiDecoder>,
        factory: Box<dyn BackendFactory>,
        config: WidgetConfig,
    ) -> Self {
        let id = registry.allocate_id();
        let mut controller = PlaybackController::new();
        controller.set_looping(config.loop_playback);
        let core = PlayerCore {
            id,
            registry,
            config,
            decoder,
            factory,
            controller,
            direct_document: None,
            notes: Rc::new(NoteTimeline::default()),
            status: Status::Loading,
            playing: false,
            seeking: None,
            displayed_time: 0.0,
            generation: 1,
            reload_pending: true,
            in_flight: None,
            pending: Vec::new(),
        };
        Self {
            shared: Rc::new(PlayerShared {
                core: RefCell::new(core),
                bindings: RefCell::new(Bindings::new()),
                dispatching: Cell::new(false),
            }),
        }
    }

    pub fn id(&self) -> WidgetId {
        self.shared.core.borrow().id
    }

    /// Apply a configuration change. Source or instrument-bank changes schedule a
    /// reload; any number of them before the next [`run_scheduled`](Self::run_scheduled)
    /// coalesce into one.
    pub fn reconfigure(&self, patch: ConfigPatch) -> ConfigChanges {
        let changes = self.shared.update(|core| core.reconfigure(patch));
        if changes.visualizer {
            let dropped = self.shared.bindings.borrow_mut().clear_visualizers();
            log::debug!(
                "{} visualizer selector now {:?}, dropped {} binding(s)",
                self.id(),
                self.shared.core.borrow().config.visualizer,
                dropped
            );
        }
        changes
    }

    /// Attribute-style adapter over [`reconfigure`](Self::reconfigure).
    /// Unknown attributes are ignored and return `None`.
    pub fn set_attribute(&self, name: &str, value: Option<&str>) -> Option<ConfigChanges> {
        ConfigPatch::from_attribute(name, value).map(|patch| self.reconfigure(patch))
    }

    pub fn set_src(&self, src: Option<&str>) -> ConfigChanges {
        self.reconfigure(ConfigPatch::new().src(src))
    }

    pub fn set_instrument_bank(&self, bank: Option<&str>) -> ConfigChanges {
        self.reconfigure(ConfigPatch::new().instrument_bank(bank))
    }

    pub fn set_loop(&self, loop_playback: bool) -> ConfigChanges {
        self.reconfigure(ConfigPatch::new().loop_playback(loop_playback))
    }

    pub fn set_visualizer(&self, selector: Option<&str>) -> ConfigChanges {
        self.reconfigure(ConfigPatch::new().visualizer(selector))
    }

    /// Play an already-decoded document instead of fetching `src`.
    pub fn set_document(&self, document: MidiDocument) {
        self.shared.update(|core| core.set_document(document))
    }

    pub fn config(&self) -> WidgetConfig {
        self.shared.core.borrow().config.clone()
    }

    /// Run the reload scheduled during this tick, if any.
    ///
    /// # Errors
    /// Fails fast, entering the error state, when there is no content to load or audio
    /// is disabled.
    pub fn run_scheduled(&self) -> Result<Option<LoadRequest>, PlayerError> {
        self.shared.update(|core| core.run_scheduled())
    }

    /// Finish a load issued by [`run_scheduled`](Self::run_scheduled).
    ///
    /// Completions for superseded requests are dropped without any effect. Otherwise
    /// the document is decoded, its notes extracted and the backend wired; any failure
    /// puts the widget in its error state and is returned to the caller.
    pub fn complete_load(
        &self,
        request: &LoadRequest,
        fetched: Result<LoadedResources, PlayerError>,
    ) -> Result<LoadOutcome, PlayerError> {
        self.shared.update(|core| core.complete_load(request, fetched))
    }

    /// Run the scheduled reload and complete it with a synchronous `fetch`.
    pub fn reload_with<F>(&self, fetch: F) -> Result<Option<LoadOutcome>, PlayerError>
    where
        F: FnOnce(&LoadRequest) -> Result<LoadedResources, PlayerError>,
    {
        let Some(request) = self.run_scheduled()? else {
            return Ok(None);
        };
        let fetched = fetch(&request);
        self.complete_load(&request, fetched).map(Some)
    }

    /// Start playback, stopping whichever other player holds the playing token.
    /// Returns false when not ready or already playing.
    pub fn start(&self) -> bool {
        let started = self.shared.core.borrow_mut().start(false);
        if started {
            let (id, registry) = {
                let core = self.shared.core.borrow();
                (core.id, core.registry.clone())
            };
            // Claim after starting: handlers of the preempted widget must see this
            // one playing.
            let owner: Weak<dyn PlaybackOwner> = Rc::downgrade(&self.shared) as Weak<PlayerShared>;
            registry.claim(id, owner);
        }
        self.shared.dispatch();
        started
    }

    pub fn stop(&self) {
        self.shared.update(|core| core.stop())
    }

    /// Poll the transport: relay crossed notes, update the displayed position, and
    /// handle the natural end of the content.
    pub fn tick(&self) {
        self.shared.update(|core| core.tick())
    }

    /// The user grabbed the seek bar. The transport pauses until release.
    pub fn begin_seek(&self) {
        self.shared.update(|core| core.begin_seek())
    }

    pub fn drag_seek(&self, seconds: f64) {
        self.shared.update(|core| core.drag_seek(seconds))
    }

    /// The user released the seek bar: seek, then resume if playback was running.
    pub fn commit_seek(&self) {
        self.shared.update(|core| core.commit_seek())
    }

    pub fn is_seeking(&self) -> bool {
        self.shared.core.borrow().seeking.is_some()
    }

    pub fn current_time(&self) -> f64 {
        self.shared.core.borrow().displayed_time
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.shared.update(|core| core.set_current_time(seconds))
    }

    pub fn duration(&self) -> f64 {
        self.shared.core.borrow().controller.duration()
    }

    pub fn is_playing(&self) -> bool {
        self.shared.core.borrow().playing
    }

    pub fn visual_state(&self) -> VisualState {
        self.shared.core.borrow().visual_state()
    }

    pub fn control_panel(&self) -> ControlPanel {
        self.shared.core.borrow().control_panel()
    }

    pub fn error_message(&self) -> Option<String> {
        match &self.shared.core.borrow().status {
            Status::Error(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// The published timeline. Empty until a load succeeds.
    pub fn notes(&self) -> Rc<NoteTimeline> {
        self.shared.core.borrow().notes.clone()
    }

    pub fn document(&self) -> Option<Rc<MidiDocument>> {
        self.shared.core.borrow().controller.document().cloned()
    }

    pub fn subscribe(&self, visualizer: Box<dyn Visualizer>) -> SubscriptionId {
        self.shared.bindings.borrow_mut().subscribe(visualizer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.bindings.borrow_mut().unsubscribe(id)
    }

    pub fn visualizer_count(&self) -> usize {
        self.shared.bindings.borrow().visualizer_count()
    }

    /// Receive every event this player emits. A listener that keeps a clone of this
    /// player keeps the widget alive for as long as the listener is bound.
    pub fn add_listener(&self, listener: impl FnMut(&PlayerEvent) + 'static) {
        self.shared.bindings.borrow_mut().add_listener(Box::new(listener))
    }
}
