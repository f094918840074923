//! Lifecycle events and visualizer bindings.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::notes::{NoteInterval, NoteTimeline};

/// Events a player emits to host listeners, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlayerEvent {
    /// A document and instrument bank finished loading.
    Load,
    Start,
    /// Playback stopped; `finished` is true when the content ran to its end.
    Stop { finished: bool },
    /// Playback restarted from the top because looping is on.
    Loop,
    /// The transport reached a note.
    Note { note: NoteInterval },
}

/// A visual consumer bound to a player.
///
/// Visualizers see `start` (a loop restart counts as one), `stop` and `note`. They are
/// bound and unbound explicitly by the host through
/// [`subscribe`](crate::MidiPlayer::subscribe).
pub trait Visualizer {
    /// Playback started; `notes` is the full timeline being played.
    fn on_start(&mut self, notes: &Rc<NoteTimeline>);
    /// Playback stopped. Active notes should be cleared.
    fn on_stop(&mut self, finished: bool);
    fn on_note(&mut self, note: &NoteInterval);
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

type SharedVisualizer = Rc<RefCell<Box<dyn Visualizer>>>;
type SharedListener = Rc<RefCell<Box<dyn FnMut(&PlayerEvent)>>>;

pub(crate) struct Bindings {
    next_id: u64,
    visualizers: Vec<(SubscriptionId, SharedVisualizer)>,
    listeners: Vec<SharedListener>,
}

impl Bindings {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            visualizers: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, visualizer: Box<dyn Visualizer>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.visualizers.push((id, Rc::new(RefCell::new(visualizer))));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.visualizers.len();
        self.visualizers.retain(|(sub, _)| *sub != id);
        self.visualizers.len() != before
    }

    pub(crate) fn clear_visualizers(&mut self) -> usize {
        let count = self.visualizers.len();
        self.visualizers.clear();
        count
    }

    pub(crate) fn visualizer_count(&self) -> usize {
        self.visualizers.len()
    }

    pub(crate) fn add_listener(&mut self, listener: Box<dyn FnMut(&PlayerEvent)>) {
        self.listeners.push(Rc::new(RefCell::new(listener)));
    }

    /// Everything bound right now. Delivering through the snapshot leaves the bindings
    /// free, so handlers may subscribe, unsubscribe or add listeners.
    pub(crate) fn targets(&self) -> Targets {
        Targets {
            listeners: self.listeners.clone(),
            visualizers: self.visualizers.iter().map(|(_, v)| v.clone()).collect(),
        }
    }
}

pub(crate) struct Targets {
    listeners: Vec<SharedListener>,
    visualizers: Vec<SharedVisualizer>,
}

impl Targets {
    /// Deliver `event` to listeners, then relay it to visualizers.
    pub(crate) fn deliver(&self, event: &PlayerEvent, notes: &Rc<NoteTimeline>) {
        for listener in &self.listeners {
            let mut listener = listener.borrow_mut();
            (*listener)(event);
        }
        for visualizer in &self.visualizers {
            let mut visualizer = visualizer.borrow_mut();
            match event {
                PlayerEvent::Start | PlayerEvent::Loop => visualizer.on_start(notes),
                PlayerEvent::Stop { finished } => visualizer.on_stop(*finished),
                PlayerEvent::Note { note } => visualizer.on_note(note),
                PlayerEvent::Load => {}
            }
        }
    }
}
