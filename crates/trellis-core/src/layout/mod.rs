//! Layout resolution: constraints, the per-frame pass driver, and the flex
//! container algorithm.
//!
//! Layout is total. Contradictory constraints from a misbehaving caller are
//! resolved by clamping (min down to max), never by erroring: every pass
//! terminates with a valid rectangle for every node.

pub mod flex;

use geom::{Axis, Expanse, Point};

use crate::{
    state::NodeId,
    tree::Tree,
};

/// Min/max bounds a parent hands a node during dimension resolution.
///
/// Constraints are normalized before use: negative bounds are clamped to
/// zero and a minimum above its maximum is clamped down to the maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    /// Minimum width.
    pub min_w: f32,
    /// Maximum width. May be infinite.
    pub max_w: f32,
    /// Minimum height.
    pub min_h: f32,
    /// Maximum height. May be infinite.
    pub max_h: f32,
}

impl Constraints {
    /// Construct constraints from raw bounds.
    pub fn new(min_w: f32, max_w: f32, min_h: f32, max_h: f32) -> Self {
        Self {
            min_w,
            max_w,
            min_h,
            max_h,
        }
    }

    /// Constraints that admit exactly one size.
    pub fn tight(size: Expanse) -> Self {
        Self::new(size.w, size.w, size.h, size.h)
    }

    /// Constraints from zero up to the given size.
    pub fn loose(size: Expanse) -> Self {
        Self::new(0.0, size.w, 0.0, size.h)
    }

    /// Completely unconstrained.
    pub fn unbounded() -> Self {
        Self::new(0.0, f32::INFINITY, 0.0, f32::INFINITY)
    }

    /// Constraints that admit only the zero size. Used to resolve disabled
    /// subtrees without recursing into them normally.
    pub fn zero() -> Self {
        Self::tight(Expanse::default())
    }

    /// Resolve contradictory or negative bounds. Minimums are clamped down
    /// to their maximums, per the error policy: layout never rejects
    /// caller-supplied geometry.
    pub fn normalized(self) -> Self {
        let max_w = self.max_w.max(0.0);
        let max_h = self.max_h.max(0.0);
        Self {
            min_w: self.min_w.clamp(0.0, max_w),
            max_w,
            min_h: self.min_h.clamp(0.0, max_h),
            max_h,
        }
    }

    /// Clamp a size into these constraints.
    pub fn clamp(&self, size: Expanse) -> Expanse {
        let n = self.normalized();
        Expanse {
            w: size.w.clamp(n.min_w, n.max_w),
            h: size.h.clamp(n.min_h, n.max_h),
        }
    }

    /// Build constraints from per-axis bounds.
    pub fn from_axes(axis: Axis, main: (f32, f32), cross: (f32, f32)) -> Self {
        match axis {
            Axis::Horizontal => Self::new(main.0, main.1, cross.0, cross.1),
            Axis::Vertical => Self::new(cross.0, cross.1, main.0, main.1),
        }
    }

    /// The (min, max) pair along the given axis.
    pub fn along(&self, axis: Axis) -> (f32, f32) {
        match axis {
            Axis::Horizontal => (self.min_w, self.max_w),
            Axis::Vertical => (self.min_h, self.max_h),
        }
    }
}

/// The main-axis component of a size.
pub(crate) fn main_of(size: Expanse, axis: Axis) -> f32 {
    match axis {
        Axis::Horizontal => size.w,
        Axis::Vertical => size.h,
    }
}

/// The cross-axis component of a size.
pub(crate) fn cross_of(size: Expanse, axis: Axis) -> f32 {
    match axis {
        Axis::Horizontal => size.h,
        Axis::Vertical => size.w,
    }
}

/// Compose a size from main and cross components.
pub(crate) fn expanse_of(main: f32, cross: f32, axis: Axis) -> Expanse {
    match axis {
        Axis::Horizontal => Expanse::new(main, cross),
        Axis::Vertical => Expanse::new(cross, main),
    }
}

/// How a node arranges its children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutKind {
    /// No children participate in sizing; the widget's intrinsic
    /// measurement decides.
    Leaf,
    /// Single-axis flex container.
    Flex(flex::FlexSpec),
    /// Layered container: children share the container's origin and the
    /// container adopts the largest child size.
    Stack,
}

/// Bottom-up dirty aggregation. Each node ORs its own dirty flag with its
/// children's, so a leaf's size change propagates upward without a global
/// dirty list. Returns the node's aggregated flag.
pub(crate) fn pre_layout(tree: &mut Tree, id: NodeId) -> bool {
    let children = tree.nodes[id].children.clone();
    let mut dirty = tree.nodes[id].layout_dirty;
    for child in children {
        dirty |= pre_layout(tree, child);
    }
    tree.nodes[id].layout_dirty = dirty;
    dirty
}

/// Top-down dimension resolution. The node is handed min/max bounds and
/// produces ideal dimensions within (or clamped to) that range. Disabled
/// nodes are resolved with zero-size constraints rather than skipped, so
/// their cached state stays internally consistent.
pub(crate) fn resolve_dimensions(tree: &mut Tree, id: NodeId, c: Constraints) -> Expanse {
    let c = if tree.nodes[id].enabled {
        c.normalized()
    } else {
        Constraints::zero()
    };

    let size = if tree.nodes[id].hosted.is_some() {
        // Nodes hosting a nested surface size like a leaf; the nested
        // surface follows the host's committed bounds and resolves its own
        // content in its own pass.
        let measured = tree.nodes[id].widget.measure(c);
        c.clamp(measured)
    } else {
        match tree.nodes[id].layout {
            LayoutKind::Leaf => {
                let measured = tree.nodes[id].widget.measure(c);
                c.clamp(measured)
            }
            LayoutKind::Flex(spec) => flex::resolve(tree, id, spec, c),
            LayoutKind::Stack => resolve_stack(tree, id, c),
        }
    };

    let node = &mut tree.nodes[id];
    node.ideal.w = size.w;
    node.ideal.h = size.h;
    node.layout_dirty = false;
    size
}

/// Stack containers give every child the same loose constraints and adopt
/// the largest resolved child size.
fn resolve_stack(tree: &mut Tree, id: NodeId, c: Constraints) -> Expanse {
    let children = tree.nodes[id].children.clone();
    let loose = Constraints::new(0.0, c.max_w, 0.0, c.max_h);
    let mut size = Expanse::default();
    for child in children {
        let resolved = resolve_dimensions(tree, child, loose);
        if tree.nodes[child].enabled {
            size = size.max(resolved);
        }
    }
    c.clamp(size)
}

/// Top-down position resolution. Each node places itself at the given
/// anchor and then places its children relative to itself, applying any
/// alignment computed during dimension resolution.
pub(crate) fn resolve_position(tree: &mut Tree, id: NodeId, origin: Point) {
    let node = &mut tree.nodes[id];
    node.ideal.x = origin.x;
    node.ideal.y = origin.y;

    if node.hosted.is_some() {
        return;
    }
    match node.layout {
        LayoutKind::Leaf => {}
        LayoutKind::Stack => {
            let children = tree.nodes[id].children.clone();
            for child in children {
                resolve_position(tree, child, origin);
            }
        }
        LayoutKind::Flex(spec) => flex::position(tree, id, spec, origin),
    }
}

/// Bottom-up finalize pass: commit ideal geometry into public bounds, mark
/// damage for anything that moved, and let widgets run bookkeeping once
/// children have final geometry.
pub(crate) fn finalize(tree: &mut Tree, id: NodeId) {
    let children = tree.nodes[id].children.clone();
    for child in children {
        finalize(tree, child);
    }

    let node = &mut tree.nodes[id];
    let old = node.bounds;
    let new = node.ideal;
    if old == new {
        return;
    }
    node.bounds = new;
    node.widget.bounds_committed(old, new);

    if let Some(hosted) = tree.nodes[id].hosted {
        tree.set_surface_rect(hosted, new);
    }
    if let Some(sid) = tree.nodes[id].surface {
        tree.mark_damage(sid, old.union(&new));
    }
}
