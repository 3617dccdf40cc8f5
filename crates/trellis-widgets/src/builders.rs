//! Shorthand constructors for common container layouts.

use trellis_core::{
    LayoutKind,
    geom::Axis,
    layout::flex::FlexSpec,
};

/// A horizontal flex container with the given spacing between children.
pub fn row(spacing: f32) -> LayoutKind {
    LayoutKind::Flex(FlexSpec::new(Axis::Horizontal).spacing(spacing))
}

/// A vertical flex container with the given spacing between children.
pub fn column(spacing: f32) -> LayoutKind {
    LayoutKind::Flex(FlexSpec::new(Axis::Vertical).spacing(spacing))
}

/// A layered container: children share the container's origin and paint
/// in child order, so the last child is on top. Dispatch pointer events
/// with [`trellis_core::Event::reversed`] to offer the top layer first.
pub fn layers() -> LayoutKind {
    LayoutKind::Stack
}
