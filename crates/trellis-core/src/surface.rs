//! Surfaces: the bridge between a widget subtree and a raster target.
//!
//! A surface owns a placement rectangle, a scroll offset, and a damage
//! tracker. Top-level surfaces own their backing store; nested surfaces
//! may instead inherit the backing of an owning ancestor, in which case
//! their damage is forwarded upward and painting is driven through the
//! ancestor's backing with a composed coordinate transform.

use geom::{Point, Rect};

use crate::{
    damage::DamageTracker,
    state::{NodeId, SurfaceId},
};

/// How a surface's placement rectangle responds to layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// The placement rectangle is authoritative; the root subtree is laid
    /// out with tight constraints matching it.
    Fixed,
    /// The root subtree is laid out unconstrained and the placement
    /// rectangle adopts the resolved content size.
    Content,
}

/// A viewport over a widget subtree.
pub struct Surface {
    /// Placement rectangle. For a nested surface this is in the host
    /// surface's content coordinates; for a top-level surface the origin is
    /// a window position the core does not interpret.
    pub(crate) rect: Rect,
    /// Scroll offset: the content coordinate visible at the placement
    /// rectangle's top-left.
    pub(crate) offset: Point,
    /// Whether content coordinates are anchored to the visible window
    /// (true) or to an absolute content plane the window slides over.
    pub(crate) relative: bool,
    /// Sizing policy.
    pub(crate) sizing: Sizing,
    /// Whether this surface owns a backing store. When false, damage and
    /// painting route through the nearest owning ancestor.
    pub(crate) owns_backing: bool,
    /// Pending repaint state.
    pub(crate) damage: DamageTracker,
    /// The surface a non-owning surface forwards damage to. Set while the
    /// host node is attached.
    pub(crate) parent: Option<SurfaceId>,
    /// The node embedding this surface, for nested surfaces.
    pub(crate) host: Option<NodeId>,
    /// Root of the content subtree.
    pub(crate) root: Option<NodeId>,
    /// An owning surface whose size changed since the backend last saw it.
    pub(crate) needs_resize: bool,
}

impl Surface {
    pub(crate) fn new(rect: Rect, sizing: Sizing, relative: bool, owns_backing: bool) -> Self {
        let mut s = Self {
            rect,
            offset: Point::zero(),
            relative,
            sizing,
            owns_backing,
            damage: DamageTracker::default(),
            parent: None,
            host: None,
            root: None,
            needs_resize: owns_backing,
        };
        s.damage.set_area(s.visible_area());
        s
    }

    /// The placement rectangle.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The current scroll offset.
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// The sizing policy.
    pub fn sizing(&self) -> Sizing {
        self.sizing
    }

    /// Does this surface own a backing store?
    pub fn owns_backing(&self) -> bool {
        self.owns_backing
    }

    /// Root of the content subtree, if one is bound.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The window onto content, in content coordinates. For a relative
    /// surface the window is anchored at the scroll offset; for an
    /// absolute surface the placement rectangle slides by the offset.
    pub fn visible_area(&self) -> Rect {
        if self.relative {
            Rect::new(self.offset.x, self.offset.y, self.rect.w, self.rect.h)
        } else {
            self.rect.translate(self.offset.x, self.offset.y)
        }
    }

    /// Map a point from this surface's content coordinates into the host
    /// surface's content coordinates.
    pub(crate) fn to_parent(&self, p: Point) -> Point {
        let v = self.visible_area().tl();
        Point::new(self.rect.x + (p.x - v.x), self.rect.y + (p.y - v.y))
    }

    /// Map a point from the host surface's content coordinates into this
    /// surface's content coordinates. Inverse of [`Surface::to_parent`].
    pub(crate) fn from_parent(&self, p: Point) -> Point {
        let v = self.visible_area().tl();
        Point::new(v.x + (p.x - self.rect.x), v.y + (p.y - self.rect.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_area_follows_offset() {
        let mut s = Surface::new(Rect::new(10.0, 20.0, 100.0, 50.0), Sizing::Fixed, true, true);
        assert_eq!(s.visible_area(), Rect::new(0.0, 0.0, 100.0, 50.0));
        s.offset = Point::new(0.0, 30.0);
        assert_eq!(s.visible_area(), Rect::new(0.0, 30.0, 100.0, 50.0));

        let mut s = Surface::new(Rect::new(10.0, 20.0, 100.0, 50.0), Sizing::Fixed, false, true);
        assert_eq!(s.visible_area(), Rect::new(10.0, 20.0, 100.0, 50.0));
        s.offset = Point::new(5.0, 0.0);
        assert_eq!(s.visible_area(), Rect::new(15.0, 20.0, 100.0, 50.0));
    }

    #[test]
    fn parent_mapping_round_trips() {
        let mut s = Surface::new(Rect::new(10.0, 20.0, 100.0, 50.0), Sizing::Fixed, true, false);
        s.offset = Point::new(3.0, 7.0);
        let p = Point::new(30.0, 40.0);
        assert_eq!(s.from_parent(s.to_parent(p)), p);
        // The content point at the scroll offset sits at the placement
        // rectangle's top-left in parent coordinates.
        assert_eq!(s.to_parent(Point::new(3.0, 7.0)), Point::new(10.0, 20.0));
    }
}
