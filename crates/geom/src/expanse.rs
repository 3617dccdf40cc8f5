use super::{Point, Rect};

/// An `Expanse` is a rectangle that has a width and height but no location.
/// Useful when we want to deal with `Rect`s abstractly, or to mandate that
/// the location of a `Rect` is (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Expanse {
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Expanse {
    /// Construct an expanse. Negative extents are clamped to zero.
    pub fn new(w: f32, h: f32) -> Self {
        Self {
            w: w.max(0.0),
            h: h.max(0.0),
        }
    }

    /// True if either extent is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Return a `Rect` with the same dimensions as the `Expanse`, located at
    /// (0, 0).
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.w, self.h)
    }

    /// Return a `Rect` with these dimensions at the given location.
    pub fn at(&self, tl: Point) -> Rect {
        Rect::new(tl.x, tl.y, self.w, self.h)
    }

    /// True if this expanse can completely enclose the other in both
    /// dimensions.
    pub fn contains(&self, other: &Self) -> bool {
        self.w >= other.w && self.h >= other.h
    }

    /// The per-axis maximum of two expanses.
    pub fn max(&self, other: Self) -> Self {
        Self {
            w: self.w.max(other.w),
            h: self.h.max(other.h),
        }
    }
}

impl From<Rect> for Expanse {
    fn from(r: Rect) -> Self {
        Self { w: r.w, h: r.h }
    }
}

impl From<(f32, f32)> for Expanse {
    fn from(v: (f32, f32)) -> Self {
        Self::new(v.0, v.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        let e = Expanse::new(-3.0, 4.0);
        assert_eq!(e.w, 0.0);
        assert!(e.is_empty());
        assert_eq!(Expanse::new(2.0, 3.0).rect(), Rect::new(0.0, 0.0, 2.0, 3.0));
    }

    #[test]
    fn contains() {
        assert!(Expanse::new(5.0, 5.0).contains(&Expanse::new(5.0, 4.0)));
        assert!(!Expanse::new(5.0, 5.0).contains(&Expanse::new(6.0, 1.0)));
    }
}
