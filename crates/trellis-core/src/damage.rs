//! Per-surface dirty rectangle accumulation.

use geom::{Rect, merge_overlapping};

/// Accumulates "this region needs repaint" rectangles between paint passes.
///
/// The tracker is owned exclusively by its surface. Rectangles are clipped
/// to the tracked area as they arrive; malformed (empty or negative-size)
/// rectangles are dropped. The tracker cannot fail.
#[derive(Debug, Default)]
pub struct DamageTracker {
    /// The area damage is clipped to, in surface content coordinates.
    area: Rect,
    /// Pending dirty rectangles, unmerged.
    pending: Vec<Rect>,
    /// When set, the whole area is dirty and individual rectangles are no
    /// longer tracked.
    whole: bool,
}

impl DamageTracker {
    /// Create a tracker covering the given area.
    pub fn new(area: Rect) -> Self {
        Self {
            area,
            pending: Vec::new(),
            whole: false,
        }
    }

    /// The area this tracker clips to.
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Update the clipped area, marking everything dirty. Called when the
    /// owning surface resizes or moves.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
        self.mark_all();
    }

    /// Mark a region dirty. The rectangle is clipped to the tracked area;
    /// if nothing remains it is discarded.
    pub fn mark(&mut self, rect: Rect) {
        if self.whole {
            return;
        }
        if let Some(clipped) = rect.intersect(&self.area) {
            self.pending.push(clipped);
        }
    }

    /// Mark the entire area dirty. Cheaper than tracking individual
    /// rectangles when most of the surface changed.
    pub fn mark_all(&mut self) {
        self.whole = true;
        self.pending.clear();
    }

    /// Is anything pending?
    pub fn is_dirty(&self) -> bool {
        self.whole || !self.pending.is_empty()
    }

    /// Return the merged set of pending rectangles and clear pending state.
    /// A second call without intervening marks returns an empty set.
    pub fn take(&mut self) -> Vec<Rect> {
        if self.whole {
            self.whole = false;
            self.pending.clear();
            if self.area.is_empty() {
                return Vec::new();
            }
            return vec![self.area];
        }
        merge_overlapping(std::mem::take(&mut self.pending))
    }
}
