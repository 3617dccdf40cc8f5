//! Test helpers: a recording backend and configurable widgets.

use std::{cell::RefCell, rc::Rc};

use geom::{Expanse, Rect};

use crate::{
    Result,
    error::Error,
    event::{Event, EventOutcome},
    layout::Constraints,
    render::{Canvas, Color, RenderBackend},
    widget::Widget,
};

/// A backend that records every call instead of rasterizing.
#[derive(Debug, Default)]
pub struct TestBackend {
    /// Fills received, in order, in backing coordinates.
    pub fills: Vec<(Rect, Color)>,
    /// Resize requests received.
    pub resizes: Vec<Expanse>,
    /// Number of flushes.
    pub flushes: usize,
    /// When set, the next resize fails with a backend error.
    pub fail_resize: bool,
}

impl TestBackend {
    /// A fresh recording backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for TestBackend {
    fn resize(&mut self, size: Expanse) -> Result<()> {
        if self.fail_resize {
            self.fail_resize = false;
            return Err(Error::Backend("test backend resize refused".into()));
        }
        self.resizes.push(size);
        Ok(())
    }

    fn fill(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.fills.push((rect, color));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// A shared event log for assertions across widgets and listeners.
pub type Log = Rc<RefCell<Vec<String>>>;

/// A fresh shared log.
pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Drain and return the log's contents.
pub fn taken(log: &Log) -> Vec<String> {
    log.borrow_mut().drain(..).collect()
}

/// A configurable widget: fixed intrinsic size, optional solid fill,
/// optional event logging, and a set of event classes it captures.
#[derive(Default)]
pub struct TestWidget {
    size: Expanse,
    color: Option<Color>,
    tag: Option<(String, Log)>,
    capture: Vec<&'static str>,
}

impl TestWidget {
    /// A zero-size, invisible, inert widget.
    pub fn new() -> Self {
        Self::default()
    }

    /// A widget that logs every event it is offered as `tag:class`.
    pub fn logged(tag: &str, log: &Log) -> Self {
        Self {
            size: Expanse::new(10.0, 10.0),
            tag: Some((tag.into(), log.clone())),
            ..Self::default()
        }
    }

    /// Set the intrinsic size.
    pub fn sized(mut self, size: Expanse) -> Self {
        self.size = size;
        self
    }

    /// Paint the full extent in a solid color.
    pub fn filled(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Capture events of the given class.
    pub fn capturing(mut self, class: &'static str) -> Self {
        self.capture.push(class);
        self
    }
}

impl Widget for TestWidget {
    fn measure(&mut self, c: Constraints) -> Expanse {
        c.clamp(self.size)
    }

    fn paint(&mut self, canvas: &mut Canvas) -> Result<()> {
        if let Some(color) = self.color {
            canvas.fill_all(color)?;
        }
        Ok(())
    }

    fn event(&mut self, ev: &Event, _bounds: Rect) -> EventOutcome {
        if let Some((tag, log)) = &self.tag {
            log.borrow_mut().push(format!("{}:{}", tag, ev.class()));
        }
        if self.capture.contains(&ev.class()) {
            EventOutcome::Capture
        } else {
            EventOutcome::Ignore
        }
    }
}

/// A widget that records activation transitions as `tag:on` / `tag:off`.
pub struct Lifecycle {
    tag: String,
    log: Log,
}

impl Lifecycle {
    /// A lifecycle recorder with the given tag.
    pub fn new(tag: &str, log: &Log) -> Self {
        Self {
            tag: tag.into(),
            log: log.clone(),
        }
    }
}

impl Widget for Lifecycle {
    fn activated(&mut self) {
        self.log.borrow_mut().push(format!("{}:on", self.tag));
    }

    fn deactivated(&mut self) {
        self.log.borrow_mut().push(format!("{}:off", self.tag));
    }
}
