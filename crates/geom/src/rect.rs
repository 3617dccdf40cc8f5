use super::{Expanse, Point};

/// An axis-aligned rectangle with half-open extents: a point on the right or
/// bottom edge is outside the rectangle, and two rectangles that merely touch
/// do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Rect {
    /// Construct a rectangle.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// The top-left corner.
    pub fn tl(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The exclusive right edge.
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// The exclusive bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// The size of this rectangle.
    pub fn expanse(&self) -> Expanse {
        Expanse::new(self.w, self.h)
    }

    /// True if either extent is zero or negative. Empty rectangles contain
    /// nothing and overlap nothing.
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Does this rectangle contain the point? Half-open on both axes.
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Does this rectangle completely enclose the other? Empty rectangles are
    /// enclosed by anything.
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.right() <= self.right()
                && other.y >= self.y
                && other.bottom() <= self.bottom())
    }

    /// Half-open overlap test on both axes. Touching edges do not count as
    /// overlapping, and empty rectangles overlap nothing.
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// The overlapping region of two rectangles, if any.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        Some(Self {
            x,
            y,
            w: self.right().min(other.right()) - x,
            h: self.bottom().min(other.bottom()) - y,
        })
    }

    /// The smallest rectangle enclosing both self and other. An empty
    /// rectangle contributes nothing.
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            w: self.right().max(other.right()) - x,
            h: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Shift the rectangle by an offset, keeping its size.
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            w: self.w,
            h: self.h,
        }
    }

    /// This rectangle relocated to the given top-left corner.
    pub fn at(&self, tl: Point) -> Self {
        Self {
            x: tl.x,
            y: tl.y,
            w: self.w,
            h: self.h,
        }
    }
}

/// The smallest axis-aligned rectangle containing all inputs. Empty inputs
/// contribute nothing; an empty slice yields an empty rectangle.
pub fn merge(rects: &[Rect]) -> Rect {
    rects.iter().fold(Rect::default(), |acc, r| acc.union(r))
}

/// Repeatedly cluster and merge any two overlapping rectangles until no pair
/// overlaps. Empty inputs are dropped. Output order is not stable, but the
/// result contains no overlapping pair, and re-running the merge on an
/// already-merged set is a no-op.
pub fn merge_overlapping(rects: Vec<Rect>) -> Vec<Rect> {
    let mut pending: Vec<Rect> = rects.into_iter().filter(|r| !r.is_empty()).collect();
    loop {
        let mut merged_any = false;
        let mut out: Vec<Rect> = Vec::with_capacity(pending.len());
        'next: for r in pending.drain(..) {
            for existing in &mut out {
                if existing.overlaps(&r) {
                    *existing = existing.union(&r);
                    merged_any = true;
                    continue 'next;
                }
            }
            out.push(r);
        }
        pending = out;
        // Merging can create fresh overlaps with rectangles already emitted,
        // so iterate to a fixed point.
        if !merged_any {
            return pending;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_half_open() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Rect::new(9.0, 9.0, 5.0, 5.0)));
        // Touching edges don't overlap.
        assert!(!a.overlaps(&Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(!a.overlaps(&Rect::new(0.0, 10.0, 5.0, 5.0)));
        // Empty rects overlap nothing, even when positioned inside.
        assert!(!a.overlaps(&Rect::new(5.0, 5.0, 0.0, 5.0)));
        assert!(!a.overlaps(&Rect::new(5.0, 5.0, -1.0, 5.0)));
    }

    #[test]
    fn contains() {
        let a = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert!(a.contains_point(Point::new(10.0, 10.0)));
        assert!(!a.contains_point(Point::new(20.0, 10.0)));
        assert!(a.contains_rect(&a));
        assert!(a.contains_rect(&Rect::new(12.0, 12.0, 2.0, 2.0)));
        assert!(!a.contains_rect(&Rect::new(12.0, 12.0, 20.0, 2.0)));
        // Empty rects are trivially contained.
        assert!(a.contains_rect(&Rect::default()));
    }

    #[test]
    fn intersect_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 15.0, 15.0));
        assert_eq!(a.intersect(&Rect::new(20.0, 20.0, 5.0, 5.0)), None);
        // Union with an empty rect leaves the other side untouched.
        assert_eq!(a.union(&Rect::default()), a);
    }

    #[test]
    fn merge_slice() {
        assert!(merge(&[]).is_empty());
        assert_eq!(
            merge(&[Rect::new(0.0, 0.0, 2.0, 2.0), Rect::new(8.0, 8.0, 2.0, 2.0)]),
            Rect::new(0.0, 0.0, 10.0, 10.0)
        );
    }

    #[test]
    fn merge_overlapping_clusters() {
        // Two overlapping clusters plus one isolated rect.
        let out = merge_overlapping(vec![
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Rect::new(2.0, 2.0, 4.0, 4.0),
            Rect::new(100.0, 0.0, 4.0, 4.0),
            Rect::new(103.0, 3.0, 4.0, 4.0),
            Rect::new(50.0, 50.0, 1.0, 1.0),
        ]);
        assert_eq!(out.len(), 3);
        for (i, a) in out.iter().enumerate() {
            for b in &out[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn merge_overlapping_chains() {
        // A chain where the last merge overlaps the first output rect, forcing
        // a second fixed-point round.
        let out = merge_overlapping(vec![
            Rect::new(0.0, 0.0, 3.0, 10.0),
            Rect::new(6.0, 0.0, 3.0, 10.0),
            Rect::new(2.0, 0.0, 5.0, 10.0),
        ]);
        assert_eq!(out, vec![Rect::new(0.0, 0.0, 9.0, 10.0)]);
    }

    #[test]
    fn merge_overlapping_drops_empty() {
        let out = merge_overlapping(vec![Rect::new(1.0, 1.0, 0.0, 5.0), Rect::default()]);
        assert!(out.is_empty());
    }
}
