//! The single-axis flex container algorithm.
//!
//! A simplified cousin of CSS flexbox over one axis pair: a measure pass
//! with loose constraints, free-space distribution by grow weights, and an
//! iterative weighted-shrink relaxation for overflow. The relaxation is
//! capped rather than run to full convergence, so a capped run may leave a
//! small residual; tests assert behavior, never bit-exact equality after a
//! capped run.

use geom::{Axis, Expanse, Point};

use crate::{
    layout::{Constraints, cross_of, expanse_of, main_of, resolve_dimensions, resolve_position},
    state::NodeId,
    tree::Tree,
};

/// Iteration cap for the shrink relaxation loop. A tunable constant, not a
/// load-bearing invariant.
pub const SHRINK_ITER_CAP: usize = 8;

/// Imbalance below which the shrink relaxation stops early.
pub const SHRINK_EPSILON: f32 = 1e-6;

/// Flex inputs a child presents to its flex parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlexParams {
    /// Weight for absorbing positive free space.
    pub grow: f32,
    /// Weight for absorbing negative free space.
    pub shrink: f32,
    /// Fixed starting main-axis length, overriding the natural measured
    /// length.
    pub basis: Option<f32>,
    /// Floor for the child's main-axis length. The shrink relaxation
    /// freezes the child here instead of collapsing it further.
    pub min_main: f32,
    /// Per-child cross alignment, overriding the container's.
    pub cross: Option<CrossAlign>,
}

impl Default for FlexParams {
    fn default() -> Self {
        Self {
            grow: 0.0,
            shrink: 1.0,
            basis: None,
            min_main: 0.0,
            cross: None,
        }
    }
}

impl FlexParams {
    /// A child that absorbs free space with the given weight.
    pub fn grow(weight: f32) -> Self {
        Self {
            grow: weight,
            ..Self::default()
        }
    }

    /// A child pinned to a fixed starting length.
    pub fn basis(len: f32) -> Self {
        Self {
            basis: Some(len),
            ..Self::default()
        }
    }
}

/// Main-axis alignment of children within leftover space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MainAlign {
    /// Pack children at the start.
    #[default]
    Start,
    /// Center the packed children.
    Center,
    /// Pack children at the end.
    End,
    /// Distribute leftover space between children.
    SpaceBetween,
    /// Distribute leftover space around children.
    SpaceAround,
}

/// Cross-axis alignment of a child within the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossAlign {
    /// Align to the cross-axis start.
    #[default]
    Start,
    /// Center on the cross axis.
    Center,
    /// Align to the cross-axis end.
    End,
    /// Force the child to the container's cross length.
    Stretch,
}

/// Configuration for a flex container node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlexSpec {
    /// The main axis.
    pub axis: Axis,
    /// Gap between each pair of adjacent enabled children. Disabled
    /// children are skipped entirely, not given zero size and a gap.
    pub spacing: f32,
    /// Main-axis alignment.
    pub main_align: MainAlign,
    /// Default cross-axis alignment for children.
    pub cross_align: CrossAlign,
}

impl FlexSpec {
    /// A flex container along the given axis with no spacing and start
    /// alignment.
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            spacing: 0.0,
            main_align: MainAlign::Start,
            cross_align: CrossAlign::Start,
        }
    }

    /// Set the inter-child spacing.
    pub fn spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Set the main-axis alignment.
    pub fn main_align(mut self, align: MainAlign) -> Self {
        self.main_align = align;
        self
    }

    /// Set the default cross-axis alignment.
    pub fn cross_align(mut self, align: CrossAlign) -> Self {
        self.cross_align = align;
        self
    }
}

/// Container bookkeeping from the last resolution pass. Needed later for
/// alignment-based positioning; recomputed every pass.
#[derive(Debug, Clone, Default)]
pub struct FlexState {
    /// Target length minus what the committed children and spacing consume.
    pub unused: f32,
    /// Committed main-axis length per enabled child, in child order.
    pub main_lengths: Vec<f32>,
    /// Number of enabled children in the last pass.
    pub enabled_children: usize,
}

/// Resolve dimensions for a flex container and its children. Returns the
/// container's own ideal size.
pub(crate) fn resolve(tree: &mut Tree, id: NodeId, spec: FlexSpec, c: Constraints) -> Expanse {
    let c = c.normalized();
    let axis = spec.axis;
    let (min_main, max_main) = c.along(axis);
    let (min_cross, max_cross) = c.along(axis.cross());

    let children = tree.nodes[id].children.clone();
    let mut enabled: Vec<(NodeId, FlexParams)> = Vec::with_capacity(children.len());
    for child in children {
        if tree.nodes[child].enabled {
            enabled.push((child, tree.nodes[child].flex));
        } else {
            // Disabled subtrees are resolved with zero-size constraints so
            // their cached state stays consistent; they contribute nothing.
            resolve_dimensions(tree, child, Constraints::zero());
        }
    }

    let n = enabled.len();
    if n == 0 {
        tree.nodes[id].flex_state = Some(FlexState::default());
        return c.clamp(Expanse::default());
    }

    // Measure pass: loose main constraints, or pinned to the flex basis.
    let spacing_total = spec.spacing * (n - 1) as f32;
    let mut basis_len: Vec<f32> = Vec::with_capacity(n);
    let mut cross_len = 0.0f32;
    let mut used = spacing_total;
    let mut unshrinkable = spacing_total;
    let mut total_grow = 0.0f32;
    let mut total_shrink = 0.0f32;
    for (child, p) in &enabled {
        let main_bounds = match p.basis {
            Some(b) => {
                let b = b.max(p.min_main);
                (b, b)
            }
            None => (p.min_main, f32::INFINITY),
        };
        let sz = resolve_dimensions(
            tree,
            *child,
            Constraints::from_axes(axis, main_bounds, (0.0, max_cross)),
        );
        // A growing child without an explicit basis starts from its floor
        // and absorbs free space; its natural length is ignored.
        let len = if p.basis.is_none() && p.grow > 0.0 {
            p.min_main
        } else {
            main_of(sz, axis)
        };
        basis_len.push(len);
        cross_len = cross_len.max(cross_of(sz, axis));
        used += len;
        if p.shrink <= 0.0 {
            unshrinkable += len;
        }
        total_grow += p.grow.max(0.0);
        total_shrink += p.shrink.max(0.0);
    }

    let target = used.clamp(min_main, max_main);
    let free = target - used;

    let finals: Vec<f32> = if !free.is_finite()
        || free == 0.0
        || (free < 0.0 && total_shrink <= 0.0)
        || (free > 0.0 && total_grow <= 0.0)
    {
        // No redistribution: children keep their measured lengths, clipped
        // first-fit so later children are squeezed once the target is
        // consumed.
        first_fit(&basis_len, None, target, spec.spacing)
    } else if free > 0.0 {
        basis_len
            .iter()
            .zip(&enabled)
            .map(|(len, (_, p))| len + free * p.grow.max(0.0) / total_grow)
            .collect()
    } else if unshrinkable >= target {
        // No room at all: shrinkable children collapse to zero and the
        // unshrinkable remainder is truncated first-fit.
        let shrinkable: Vec<bool> = enabled.iter().map(|(_, p)| p.shrink > 0.0).collect();
        first_fit(&basis_len, Some(&shrinkable), target, spec.spacing)
    } else {
        relax(&basis_len, &enabled, -free)
    };

    // Commit pass: strict main constraints and the container's resolved
    // cross-axis constraint.
    let container_cross = if spec.cross_align == CrossAlign::Stretch && max_cross.is_finite() {
        max_cross.max(min_cross)
    } else {
        cross_len.clamp(min_cross, max_cross)
    };
    for ((child, p), len) in enabled.iter().zip(&finals) {
        let eff = p.cross.unwrap_or(spec.cross_align);
        let cross_bounds = if eff == CrossAlign::Stretch {
            (container_cross, container_cross)
        } else {
            (0.0, container_cross)
        };
        resolve_dimensions(
            tree,
            *child,
            Constraints::from_axes(axis, (*len, *len), cross_bounds),
        );
    }

    let consumed: f32 = finals.iter().sum::<f32>() + spacing_total;
    let container_main = if target.is_finite() { target } else { consumed };
    tree.nodes[id].flex_state = Some(FlexState {
        unused: (container_main - consumed).max(0.0),
        main_lengths: finals,
        enabled_children: n,
    });
    expanse_of(container_main, container_cross, axis)
}

/// Clip lengths first-fit into the remaining space. When `collapse` is given,
/// children flagged true are pinned to zero instead of fitted.
fn first_fit(lengths: &[f32], collapse: Option<&[bool]>, target: f32, spacing: f32) -> Vec<f32> {
    let mut remaining = target;
    let mut out = Vec::with_capacity(lengths.len());
    for (i, &len) in lengths.iter().enumerate() {
        if i > 0 {
            remaining -= spacing;
        }
        if collapse.is_some_and(|c| c[i]) {
            out.push(0.0);
            continue;
        }
        let fitted = len.min(remaining.max(0.0));
        out.push(fitted);
        remaining -= fitted;
    }
    out
}

/// Iterative weighted-shrink relaxation, the fixed-point loop of the
/// standard flexbox shrink algorithm, capped at [`SHRINK_ITER_CAP`]
/// iterations for performance predictability.
///
/// Each round computes a scaled shrink factor (`shrink × basis length`) per
/// unfrozen child, shrinks each proportionally to its share of the
/// remaining deficit, and freezes any child that reaches its floor; the
/// surplus such children could not give up is redistributed in the next
/// round.
fn relax(basis_len: &[f32], enabled: &[(NodeId, FlexParams)], deficit: f32) -> Vec<f32> {
    let n = basis_len.len();
    let mut finals = basis_len.to_vec();
    let mut frozen = vec![false; n];
    let mut deficit = deficit;

    for _ in 0..SHRINK_ITER_CAP {
        if deficit <= SHRINK_EPSILON {
            break;
        }
        let mut scaled = 0.0f32;
        for i in 0..n {
            if !frozen[i] {
                scaled += enabled[i].1.shrink.max(0.0) * basis_len[i];
            }
        }
        if scaled <= 0.0 {
            break;
        }
        let mut recovered = 0.0f32;
        for i in 0..n {
            if frozen[i] {
                continue;
            }
            let p = enabled[i].1;
            let share = deficit * (p.shrink.max(0.0) * basis_len[i]) / scaled;
            let floor = p.min_main.max(0.0);
            let next = finals[i] - share;
            if next <= floor {
                recovered += finals[i] - floor;
                finals[i] = floor;
                frozen[i] = true;
            } else {
                finals[i] = next;
                recovered += share;
            }
        }
        deficit -= recovered;
    }
    finals
}

/// Position a flex container's children, distributing unused space per the
/// main-axis alignment and offsetting each child per its cross alignment.
pub(crate) fn position(tree: &mut Tree, id: NodeId, spec: FlexSpec, origin: Point) {
    let axis = spec.axis;
    let state = tree.nodes[id].flex_state.clone().unwrap_or_default();
    let n = state.enabled_children;
    let container_cross = cross_of(tree.nodes[id].ideal.expanse(), axis);

    let (leading, extra_gap) = match spec.main_align {
        MainAlign::Start => (0.0, 0.0),
        MainAlign::Center => (state.unused * 0.5, 0.0),
        MainAlign::End => (state.unused, 0.0),
        MainAlign::SpaceBetween => {
            if n > 1 {
                (0.0, state.unused / (n - 1) as f32)
            } else {
                (0.0, 0.0)
            }
        }
        MainAlign::SpaceAround => {
            if n > 0 {
                (state.unused / (2 * n) as f32, state.unused / n as f32)
            } else {
                (0.0, 0.0)
            }
        }
    };

    let mut cursor = point_main(origin, axis) + leading;
    let mut idx = 0usize;
    let children = tree.nodes[id].children.clone();
    for child in children {
        if !tree.nodes[child].enabled {
            resolve_position(tree, child, origin);
            continue;
        }
        let len = state.main_lengths.get(idx).copied().unwrap_or(0.0);
        let p = tree.nodes[child].flex;
        let eff = p.cross.unwrap_or(spec.cross_align);
        let child_cross = cross_of(tree.nodes[child].ideal.expanse(), axis);
        let off = match eff {
            CrossAlign::Start | CrossAlign::Stretch => 0.0,
            CrossAlign::Center => ((container_cross - child_cross) * 0.5).max(0.0),
            CrossAlign::End => (container_cross - child_cross).max(0.0),
        };
        let pos = compose_point(cursor, point_cross(origin, axis) + off, axis);
        resolve_position(tree, child, pos);
        cursor += len + spec.spacing + extra_gap;
        idx += 1;
    }
}


/// The main-axis coordinate of a point.
fn point_main(p: Point, axis: Axis) -> f32 {
    match axis {
        Axis::Horizontal => p.x,
        Axis::Vertical => p.y,
    }
}

/// The cross-axis coordinate of a point.
fn point_cross(p: Point, axis: Axis) -> f32 {
    match axis {
        Axis::Horizontal => p.y,
        Axis::Vertical => p.x,
    }
}

/// Compose a point from main and cross coordinates.
fn compose_point(main: f32, cross: f32, axis: Axis) -> Point {
    match axis {
        Axis::Horizontal => Point::new(main, cross),
        Axis::Vertical => Point::new(cross, main),
    }
}
