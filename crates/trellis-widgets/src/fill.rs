//! A solid-color block.

use trellis_core::{
    Canvas, Color, Constraints, Dirt, Result, Widget,
    geom::Expanse,
};

/// Fills its entire extent with one color. Expands to whatever space the
/// container offers; give it flex parameters to control how much that is.
pub struct Fill {
    color: Color,
}

impl Fill {
    /// A fill in the given color.
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    /// Change the color. The caller owns repaint scheduling; pair this
    /// with [`trellis_core::Tree::request_paint`].
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

impl Widget for Fill {
    fn measure(&mut self, c: Constraints) -> Expanse {
        let c = c.normalized();
        // As large as allowed; unbounded axes collapse to the minimum.
        Expanse::new(
            if c.max_w.is_finite() { c.max_w } else { c.min_w },
            if c.max_h.is_finite() { c.max_h } else { c.min_h },
        )
    }

    fn paint(&mut self, canvas: &mut Canvas) -> Result<()> {
        canvas.fill_all(self.color)
    }

    fn theme_changed(&mut self, _property: Option<&str>) -> Dirt {
        // Color-only: geometry cannot be affected.
        Dirt::PAINT
    }
}
