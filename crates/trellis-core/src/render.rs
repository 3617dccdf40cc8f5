//! The raster backend trait and the clipped canvas handed to widgets.

use geom::{Expanse, Point, Rect};

use crate::Result;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Construct an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
}

/// The trait implemented by raster surfaces that trellis paints onto.
///
/// A backend is a dumb pixel target: allocation failures surface as
/// [`crate::Error::Backend`] and are fatal for the surface concerned.
pub trait RenderBackend {
    /// Reallocate the backing store for a new pixel size. Called when an
    /// owning surface's layout pass reports a resize.
    fn resize(&mut self, size: Expanse) -> Result<()>;

    /// Fill a rectangle, given in backing coordinates, with a solid color.
    /// The rectangle has already been clipped; it never extends outside the
    /// backing store.
    fn fill(&mut self, rect: Rect, color: Color) -> Result<()>;

    /// Present the accumulated draws. Called once at the end of a paint
    /// pass that actually painted something.
    fn flush(&mut self) -> Result<()>;
}

/// A painting handle passed to widgets, restricted to a clip rectangle.
///
/// Widgets draw in their own local coordinate space: (0, 0) is the widget's
/// top-left corner. Draw operations falling outside the current dirty clip
/// are silently dropped, so widgets can always paint their full extent.
pub struct Canvas<'a> {
    /// The raster target.
    backend: &'a mut dyn RenderBackend,
    /// Clip rectangle in backing coordinates.
    clip: Rect,
    /// Backing coordinates of the widget's local origin.
    origin: Point,
    /// The widget's extent.
    size: Expanse,
}

impl<'a> Canvas<'a> {
    /// Construct a canvas for a widget whose local origin sits at `origin`
    /// in backing coordinates, clipped to `clip`.
    pub(crate) fn new(
        backend: &'a mut dyn RenderBackend,
        clip: Rect,
        origin: Point,
        size: Expanse,
    ) -> Self {
        Self {
            backend,
            clip,
            origin,
            size,
        }
    }

    /// The widget's extent, so widgets do not need to retain their own
    /// resolved bounds to paint.
    pub fn size(&self) -> Expanse {
        self.size
    }

    /// Fill a rectangle in widget-local coordinates.
    pub fn fill(&mut self, rect: Rect, color: Color) -> Result<()> {
        let backing = rect.translate(self.origin.x, self.origin.y);
        if let Some(clipped) = backing.intersect(&self.clip) {
            self.backend.fill(clipped, color)?;
        }
        Ok(())
    }

    /// Fill the widget's entire extent.
    pub fn fill_all(&mut self, color: Color) -> Result<()> {
        self.fill(self.size.rect(), color)
    }
}
