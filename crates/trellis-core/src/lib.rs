//! Trellis is a retained-mode widget tree: an arena of nodes bound to
//! surfaces, with constraint-based flex layout, damage-tracked incremental
//! repainting, and a three-model event dispatch (trickle, bubble, sticky).
//!
//! The core is backend-agnostic. A host embeds it by implementing
//! [`RenderBackend`] for its raster target and feeding events through
//! [`Tree::dispatch`]; widgets implement [`Widget`] and never walk the
//! tree themselves.

pub mod damage;
mod dump;
pub mod error;
pub mod event;
pub mod factory;
pub mod layout;
mod node;
pub mod render;
pub mod state;
mod surface;
mod tree;
pub mod tutils;
mod widget;

pub use geom;

pub use error::{Error, Result};
pub use event::{Button, Event, EventKind, EventOutcome, ListenerId, ListenerOps, Propagation};
pub use layout::{Constraints, LayoutKind};
pub use node::{Dirt, Node};
pub use render::{Canvas, Color, RenderBackend};
pub use state::{NodeId, NodeName, SurfaceId};
pub use surface::{Sizing, Surface};
pub use tree::Tree;
pub use widget::Widget;
