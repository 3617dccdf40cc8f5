//! A pressable block.

use tracing::trace;
use trellis_core::{
    Canvas, Color, Constraints, Event, EventKind, EventOutcome, Result, Widget,
    geom::{Expanse, Rect},
};

/// A clickable region with pressed-state feedback.
///
/// The button captures its pointer events; click reactions belong in a
/// listener on the same node, which still sees captured events because
/// capture stops propagation beyond the node, not delivery within it.
/// Activation resets the pressed latch, so a button detached mid-press
/// does not come back stuck.
pub struct Button {
    size: Expanse,
    normal: Color,
    pressed_color: Color,
    pressed: bool,
    hovered: bool,
}

impl Button {
    /// A button of the given size and colors.
    pub fn new(size: Expanse, normal: Color, pressed: Color) -> Self {
        Self {
            size,
            normal,
            pressed_color: pressed,
            pressed: false,
            hovered: false,
        }
    }

    /// Is the button currently held down?
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Is the pointer currently over the button?
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }
}

impl Widget for Button {
    fn measure(&mut self, c: Constraints) -> Expanse {
        c.clamp(self.size)
    }

    fn paint(&mut self, canvas: &mut Canvas) -> Result<()> {
        let color = if self.pressed {
            self.pressed_color
        } else {
            self.normal
        };
        canvas.fill_all(color)
    }

    fn event(&mut self, ev: &Event, _bounds: Rect) -> EventOutcome {
        match ev.kind {
            EventKind::PointerDown { .. } => {
                self.pressed = true;
                trace!("button pressed");
                EventOutcome::Capture
            }
            EventKind::PointerUp { .. } => {
                self.pressed = false;
                EventOutcome::Capture
            }
            EventKind::PointerEnter => {
                self.hovered = true;
                EventOutcome::Ignore
            }
            EventKind::PointerLeave => {
                self.hovered = false;
                // Losing the pointer mid-press abandons the press.
                self.pressed = false;
                EventOutcome::Ignore
            }
            _ => EventOutcome::Ignore,
        }
    }

    fn activated(&mut self) {
        self.pressed = false;
        self.hovered = false;
    }
}
