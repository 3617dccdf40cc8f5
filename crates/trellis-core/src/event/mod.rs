//! Event types and the dispatch machinery.
//!
//! Three propagation models cover every event class. Trickling events
//! (pointer, scroll) descend from the surface root towards leaves and are
//! hit-tested on the way down. Bubbling events (keys) belong to an origin
//! node: they are delivered straight to its handler chain, and an
//! ancestor that wants them registers a listener on the origin. Sticky
//! events (focus and hover transitions) are delivered to exactly one node
//! and never propagate.

mod dispatch;

pub(crate) use dispatch::{dispatch, pointer_moved, set_focus};

use geom::Point;

use crate::state::NodeId;

/// A pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// The primary button.
    Left,
    /// The middle button or wheel press.
    Middle,
    /// The secondary button.
    Right,
}

/// The payload of an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A pointer button was pressed.
    PointerDown {
        /// Position in surface content coordinates.
        pos: Point,
        /// The button pressed.
        button: Button,
    },
    /// A pointer button was released.
    PointerUp {
        /// Position in surface content coordinates.
        pos: Point,
        /// The button released.
        button: Button,
    },
    /// The pointer moved.
    PointerMove {
        /// Position in surface content coordinates.
        pos: Point,
    },
    /// A scroll gesture at a position.
    Scroll {
        /// Position in surface content coordinates.
        pos: Point,
        /// Horizontal scroll delta.
        dx: f32,
        /// Vertical scroll delta.
        dy: f32,
    },
    /// A key was pressed.
    KeyDown {
        /// Platform key code.
        code: u32,
    },
    /// A key was released.
    KeyUp {
        /// Platform key code.
        code: u32,
    },
    /// The node gained focus.
    FocusGained,
    /// The node lost focus.
    FocusLost,
    /// The pointer entered the node's bounds.
    PointerEnter,
    /// The pointer left the node's bounds.
    PointerLeave,
}

/// How an event class travels through the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Root towards leaves, hit-tested by bounds.
    Trickle,
    /// Delivered to the origin node's handler chain.
    Bubble,
    /// Delivered to exactly one node.
    Sticky,
}

/// An event instance offered to widgets and listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The payload.
    pub kind: EventKind,
    /// Origin node for bubbling and sticky events. Ignored for trickling
    /// events, which are addressed by position.
    pub origin: Option<NodeId>,
    /// When set, trickling dispatch offers children back-to-front, so
    /// later siblings (painted on top in a stack) see the event first.
    pub reversed: bool,
}

impl Event {
    /// An event with no origin, offered in normal child order.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            origin: None,
            reversed: false,
        }
    }

    /// Set the origin node.
    pub fn at(mut self, origin: NodeId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Offer children back-to-front during trickling dispatch.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    /// The propagation model for this event's class. Exhaustive by
    /// construction: a new event kind does not compile until it is
    /// assigned a model here.
    pub fn propagation(&self) -> Propagation {
        match self.kind {
            EventKind::PointerDown { .. }
            | EventKind::PointerUp { .. }
            | EventKind::PointerMove { .. }
            | EventKind::Scroll { .. } => Propagation::Trickle,
            EventKind::KeyDown { .. } | EventKind::KeyUp { .. } => Propagation::Bubble,
            EventKind::FocusGained
            | EventKind::FocusLost
            | EventKind::PointerEnter
            | EventKind::PointerLeave => Propagation::Sticky,
        }
    }

    /// May a user listener capture this event? Lifecycle notifications
    /// (focus and hover transitions) are delivered unconditionally; a
    /// capture from a listener is nullified and logged instead of honored.
    pub fn user_capturable(&self) -> bool {
        !matches!(
            self.kind,
            EventKind::FocusGained
                | EventKind::FocusLost
                | EventKind::PointerEnter
                | EventKind::PointerLeave
        )
    }

    /// A stable name for the event's class, used for log rate limiting.
    pub fn class(&self) -> &'static str {
        match self.kind {
            EventKind::PointerDown { .. } => "pointer_down",
            EventKind::PointerUp { .. } => "pointer_up",
            EventKind::PointerMove { .. } => "pointer_move",
            EventKind::Scroll { .. } => "scroll",
            EventKind::KeyDown { .. } => "key_down",
            EventKind::KeyUp { .. } => "key_up",
            EventKind::FocusGained => "focus_gained",
            EventKind::FocusLost => "focus_lost",
            EventKind::PointerEnter => "pointer_enter",
            EventKind::PointerLeave => "pointer_leave",
        }
    }

    /// The event's position, for positional event kinds.
    pub fn pos(&self) -> Option<Point> {
        match self.kind {
            EventKind::PointerDown { pos, .. }
            | EventKind::PointerUp { pos, .. }
            | EventKind::PointerMove { pos }
            | EventKind::Scroll { pos, .. } => Some(pos),
            _ => None,
        }
    }

    /// A copy of this event with its position replaced. Used when dispatch
    /// crosses into a nested surface's coordinate space.
    pub(crate) fn with_pos(&self, pos: Point) -> Self {
        let mut ev = self.clone();
        ev.kind = match ev.kind {
            EventKind::PointerDown { button, .. } => EventKind::PointerDown { pos, button },
            EventKind::PointerUp { button, .. } => EventKind::PointerUp { pos, button },
            EventKind::PointerMove { .. } => EventKind::PointerMove { pos },
            EventKind::Scroll { dx, dy, .. } => EventKind::Scroll { pos, dx, dy },
            other => other,
        };
        ev
    }
}

/// What a widget or listener did with an offered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event was claimed; propagation stops.
    Capture,
    /// The event was not handled; propagation continues.
    Ignore,
}

/// Identity of a registered listener, stable across list mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A registered listener callback.
pub(crate) type ListenerFn = Box<dyn FnMut(&Event, &mut ListenerOps) -> EventOutcome>;

/// A user listener attached to a node.
pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) once: bool,
    pub(crate) f: ListenerFn,
}

/// Mutations a listener may request against its own node's listener list
/// during dispatch. Applied after the callback returns, so the dispatch
/// snapshot taken at delivery time stays valid.
pub struct ListenerOps {
    current: ListenerId,
    pub(crate) removed: Vec<ListenerId>,
    pub(crate) added: Vec<(bool, ListenerFn)>,
}

impl ListenerOps {
    pub(crate) fn new(current: ListenerId) -> Self {
        Self {
            current,
            removed: Vec::new(),
            added: Vec::new(),
        }
    }

    /// Remove a listener from this node by identity.
    pub fn remove(&mut self, id: ListenerId) {
        self.removed.push(id);
    }

    /// Remove the listener currently being invoked.
    pub fn remove_current(&mut self) {
        self.removed.push(self.current);
    }

    /// Register a new listener on this node. It will not see the event
    /// currently being dispatched.
    pub fn listen(&mut self, f: impl FnMut(&Event, &mut ListenerOps) -> EventOutcome + 'static) {
        self.added.push((false, Box::new(f)));
    }
}
