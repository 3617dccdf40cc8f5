//! Geometry primitives used across trellis.
//!
//! All types are plain `f32` value types with no identity. Every operation is
//! total: malformed inputs (negative extents, swapped bounds) are normalized
//! or treated as empty rather than rejected.

/// Width/height size type.
mod expanse;
/// Point helpers.
mod point;
/// Rectangle operations, including damage-merge utilities.
mod rect;

pub use expanse::Expanse;
pub use point::Point;
pub use rect::{Rect, merge, merge_overlapping};

/// The two layout axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Main axis runs left to right.
    Horizontal,
    /// Main axis runs top to bottom.
    Vertical,
}

impl Axis {
    /// The perpendicular axis.
    pub fn cross(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}
