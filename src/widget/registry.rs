//! Process-wide "currently playing" ownership.
//!
//! Only one widget may play at a time. The token is held by a [`PlaybackRegistry`]
//! that hosts create once and hand to every widget, rather than hidden global state.
//! Execution is single-threaded, so plain `Cell`/`RefCell` suffice.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Identity of a widget within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Something that can hold the playing token and be asked to give it up.
pub trait PlaybackOwner {
    fn is_playing(&self) -> bool;
    /// Stop playback, running the owner's normal stop sequence.
    fn stop_playback(&self);
}

struct Holder {
    id: WidgetId,
    owner: Weak<dyn PlaybackOwner>,
}

#[derive(Default)]
pub struct PlaybackRegistry {
    next_id: Cell<u64>,
    current: RefCell<Option<Holder>>,
}

impl PlaybackRegistry {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn allocate_id(&self) -> WidgetId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        WidgetId(id)
    }

    /// Make `id` the playing widget, stopping the previous holder if it still plays.
    ///
    /// A widget never preempts itself: re-claiming a token it already holds (as a loop
    /// restart does) leaves it running.
    pub fn claim(&self, id: WidgetId, owner: Weak<dyn PlaybackOwner>) {
        let previous = self.current.borrow_mut().replace(Holder { id, owner });

        let Some(previous) = previous else {
            return;
        };
        if previous.id == id {
            return;
        }
        if let Some(other) = previous.owner.upgrade() {
            if other.is_playing() {
                log::info!("{} preempts {}", id, previous.id);
                other.stop_playback();
            }
        }
    }

    /// The widget that last claimed the token, if it is still alive.
    pub fn current(&self) -> Option<WidgetId> {
        self.current
            .borrow()
            .as_ref()
            .filter(|holder| holder.owner.strong_count() > 0)
            .map(|holder| holder.id)
    }

    /// Drop the token if `id` holds it.
    pub fn release(&self, id: WidgetId) {
        let mut current = self.current.borrow_mut();
        if current.as_ref().is_some_and(|holder| holder.id == id) {
            *current = None;
        }
    }

    /// Forget the current holder. Useful between test cases.
    pub fn reset(&self) {
        self.current.borrow_mut().take();
    }
}
