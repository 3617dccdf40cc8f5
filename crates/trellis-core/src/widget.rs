//! The widget behavior trait.

use geom::{Expanse, Rect};

use crate::{
    Result,
    event::{Event, EventOutcome},
    layout::Constraints,
    node::Dirt,
    render::Canvas,
};

/// Behavior attached to a tree node.
///
/// Widgets are deliberately passive: the tree drives layout, painting and
/// dispatch, and calls into the widget at well-defined points. A widget
/// never walks the tree itself.
pub trait Widget {
    /// Compute an intrinsic size within the given constraints. Only called
    /// for leaf nodes; container sizing is derived from children by the
    /// layout driver. The returned size is clamped into the constraints by
    /// the caller, so violating them is harmless.
    fn measure(&mut self, c: Constraints) -> Expanse {
        c.clamp(Expanse::default())
    }

    /// Paint the widget. The canvas is clipped to the dirty region
    /// intersecting the widget's bounds; drawing the full extent is always
    /// safe. Painting must not mutate layout state.
    fn paint(&mut self, canvas: &mut Canvas) -> Result<()> {
        let _ = canvas;
        Ok(())
    }

    /// Offered an event during dispatch. Returning
    /// [`EventOutcome::Capture`] claims the event and stops propagation.
    /// `bounds` is the node's committed bounds in surface content
    /// coordinates.
    fn event(&mut self, ev: &Event, bounds: Rect) -> EventOutcome {
        let _ = (ev, bounds);
        EventOutcome::Ignore
    }

    /// The node transitioned into the Active state. Interaction helpers
    /// (pressed state, hover latches) should reset here.
    fn activated(&mut self) {}

    /// The node transitioned out of the Active state.
    fn deactivated(&mut self) {}

    /// The finalize pass committed new bounds. Runs after all descendants
    /// have final geometry, so container bookkeeping that depends on child
    /// positions belongs here.
    fn bounds_committed(&mut self, old: Rect, new: Rect) {
        let _ = (old, new);
    }

    /// An inherited theme object changed. `None` means assume everything
    /// changed. The returned set tells the tree what to invalidate; a
    /// color-only property should return just [`Dirt::PAINT`].
    fn theme_changed(&mut self, property: Option<&str>) -> Dirt {
        let _ = property;
        Dirt::all()
    }
}
