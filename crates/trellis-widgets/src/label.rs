//! A single line of text, measured through an injected oracle.
//!
//! The core knows nothing about fonts. A [`TextMeasure`] implementation,
//! typically backed by the host's font stack, turns text into an extent;
//! glyph rasterization itself is the render backend's business. For tests
//! and terminal-like hosts, [`MonoMeasure`] assumes a fixed cell per
//! displayed column.

use trellis_core::{
    Canvas, Color, Constraints, Result, Widget,
    geom::Expanse,
};
use unicode_width::UnicodeWidthStr;

/// Turns a piece of text into the space it needs.
pub trait TextMeasure {
    /// The extent of a single line of text.
    fn measure(&self, text: &str) -> Expanse;
}

/// A measurement oracle for fixed-pitch rendering: every displayed column
/// is one cell. Wide characters count per their Unicode display width.
#[derive(Debug, Clone, Copy)]
pub struct MonoMeasure {
    /// Size of one character cell.
    pub cell: Expanse,
}

impl TextMeasure for MonoMeasure {
    fn measure(&self, text: &str) -> Expanse {
        Expanse::new(text.width() as f32 * self.cell.w, self.cell.h)
    }
}

/// A single line of text with an optional background.
pub struct Label {
    text: String,
    background: Option<Color>,
    measure: Box<dyn TextMeasure>,
}

impl Label {
    /// A label measured by the given oracle.
    pub fn new(text: &str, measure: impl TextMeasure + 'static) -> Self {
        Self {
            text: text.into(),
            background: None,
            measure: Box::new(measure),
        }
    }

    /// Paint a background behind the text.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// The current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text. The caller owns invalidation; the new text may
    /// need a different extent, so pair this with
    /// [`trellis_core::Tree::request_layout`].
    pub fn set_text(&mut self, text: &str) {
        self.text = text.into();
    }
}

impl Widget for Label {
    fn measure(&mut self, c: Constraints) -> Expanse {
        c.clamp(self.measure.measure(&self.text))
    }

    fn paint(&mut self, canvas: &mut Canvas) -> Result<()> {
        if let Some(color) = self.background {
            canvas.fill_all(color)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono() -> MonoMeasure {
        MonoMeasure {
            cell: Expanse::new(8.0, 16.0),
        }
    }

    #[test]
    fn measures_display_width() {
        let mut l = Label::new("hello", mono());
        assert_eq!(
            l.measure(Constraints::unbounded()),
            Expanse::new(40.0, 16.0)
        );
        // Fullwidth characters take two columns.
        l.set_text("日本");
        assert_eq!(
            l.measure(Constraints::unbounded()),
            Expanse::new(32.0, 16.0)
        );
    }

    #[test]
    fn clamps_into_constraints() {
        let mut l = Label::new("a long line of text", mono());
        let size = l.measure(Constraints::new(0.0, 50.0, 0.0, 50.0));
        assert_eq!(size.w, 50.0);
        assert_eq!(size.h, 16.0);
    }
}
