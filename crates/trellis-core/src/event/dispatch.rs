//! Event routing over the node tree.

use geom::Point;

use crate::{
    Result,
    error::Error,
    event::{Event, EventKind, EventOutcome, ListenerOps, Propagation},
    state::{NodeId, SurfaceId},
    tree::Tree,
};

/// Route an event into a surface, returning the capturing node if any.
/// Trickling events descend from the surface root; bubbling and sticky
/// events require an origin node.
pub(crate) fn dispatch(tree: &mut Tree, sid: SurfaceId, ev: Event) -> Result<Option<NodeId>> {
    match ev.propagation() {
        Propagation::Trickle => {
            let surface = tree
                .surfaces
                .get(sid)
                .ok_or_else(|| Error::Dispatch("no such surface".into()))?;
            let Some(root) = surface.root else {
                return Ok(None);
            };
            Ok(trickle(tree, root, &ev))
        }
        Propagation::Bubble => {
            let origin = ev
                .origin
                .ok_or_else(|| Error::Dispatch(format!("{} event without origin", ev.class())))?;
            if !tree.nodes.contains_key(origin) {
                return Err(Error::Dispatch("origin node no longer exists".into()));
            }
            // Bubbling is delivered directly to the origin's handler
            // chain; ancestors interested in these events register a
            // listener on the origin rather than relying on a tree walk.
            if tree.nodes[origin].enabled && deliver(tree, origin, &ev, true) {
                Ok(Some(origin))
            } else {
                Ok(None)
            }
        }
        Propagation::Sticky => {
            let origin = ev
                .origin
                .ok_or_else(|| Error::Dispatch(format!("{} event without origin", ev.class())))?;
            if tree.nodes.contains_key(origin) {
                deliver(tree, origin, &ev, false);
            }
            Ok(None)
        }
    }
}

/// Root-to-leaf descent. Children are offered before the node itself, so
/// the deepest hit node sees the event first; sibling order follows child
/// order, reversed on request so overlay children painted last are offered
/// first. Returns the capturing node.
fn trickle(tree: &mut Tree, id: NodeId, ev: &Event) -> Option<NodeId> {
    if !tree.nodes[id].enabled {
        return None;
    }
    if let Some(pos) = ev.pos()
        && !tree.nodes[id].bounds.contains_point(pos)
    {
        return None;
    }

    if let Some(hosted) = tree.nodes[id].hosted {
        // Crossing into a nested surface: translate the position into the
        // nested content space and descend into its root.
        if let Some(root) = tree.surfaces[hosted].root {
            let inner = match ev.pos() {
                Some(pos) => ev.with_pos(tree.surfaces[hosted].from_parent(pos)),
                None => ev.clone(),
            };
            if let Some(capturer) = trickle(tree, root, &inner) {
                return Some(capturer);
            }
        }
        return deliver(tree, id, ev, true).then_some(id);
    }

    let children = tree.nodes[id].children.clone();
    let offer = |tree: &mut Tree, child: NodeId| trickle(tree, child, ev);
    if ev.reversed {
        for child in children.into_iter().rev() {
            if let Some(capturer) = offer(tree, child) {
                return Some(capturer);
            }
        }
    } else {
        for child in children {
            if let Some(capturer) = offer(tree, child) {
                return Some(capturer);
            }
        }
    }
    deliver(tree, id, ev, true).then_some(id)
}

/// Offer an event to one node: the widget first, then user listeners.
/// Returns whether the node captured the event.
///
/// For capturable events, a widget capture does not starve the node's own
/// listeners; it stops propagation beyond the node, not delivery within
/// it. For uncapturable (sticky) events a widget capture instead
/// suppresses the node's remaining handlers for this dispatch.
fn deliver(tree: &mut Tree, id: NodeId, ev: &Event, capture_allowed: bool) -> bool {
    let bounds = tree.nodes[id].bounds;
    let widget_captured = tree.nodes[id].widget.event(ev, bounds) == EventOutcome::Capture;
    if !capture_allowed && widget_captured {
        return false;
    }
    let listener_captured = run_listeners(tree, id, ev, capture_allowed);
    capture_allowed && (widget_captured || listener_captured)
}

/// Run a node's listeners against an event, returning whether one of them
/// captured it.
///
/// Listener identity, not list position, decides who runs: the set of ids
/// present at delivery time is snapshotted, and each listener is removed
/// from the node for the duration of its own call. Listeners added during
/// dispatch do not see the current event; listeners removed during
/// dispatch are not invoked even if the snapshot still names them.
fn run_listeners(tree: &mut Tree, id: NodeId, ev: &Event, capture_allowed: bool) -> bool {
    let snapshot: Vec<_> = tree.nodes[id].listeners.iter().map(|l| l.id).collect();
    for lid in snapshot {
        let Some(node) = tree.nodes.get_mut(id) else {
            // The node was removed by an earlier listener.
            return false;
        };
        let Some(idx) = node.listeners.iter().position(|l| l.id == lid) else {
            continue;
        };
        let mut listener = node.listeners.remove(idx);
        let mut ops = ListenerOps::new(lid);
        let outcome = (listener.f)(ev, &mut ops);

        if let Some(node) = tree.nodes.get_mut(id) {
            if !listener.once && !ops.removed.contains(&lid) {
                let at = idx.min(node.listeners.len());
                node.listeners.insert(at, listener);
            }
            node.listeners.retain(|l| !ops.removed.contains(&l.id));
            for (once, f) in ops.added {
                let lid = tree.next_listener_id();
                tree.nodes[id].listeners.push(crate::event::Listener {
                    id: lid,
                    once,
                    f,
                });
            }
        }

        if outcome == EventOutcome::Capture {
            if capture_allowed && ev.user_capturable() {
                return true;
            }
            warn_capture(tree, ev.class());
        }
    }
    false
}

/// Log a nullified capture, at most once per event class per tree. The
/// condition is a listener bug that would otherwise flood the log on every
/// focus or hover transition.
fn warn_capture(tree: &mut Tree, class: &'static str) {
    if tree.dispatch.warned.insert(class) {
        tracing::warn!(class, "capture ignored: event class is not capturable");
    }
}

/// Move focus, emitting sticky transition events. The old holder is told
/// first; delivery is unconditional and uncapturable.
pub(crate) fn set_focus(tree: &mut Tree, target: Option<NodeId>) -> Result<()> {
    let old = tree.dispatch.focus;
    if old == target {
        return Ok(());
    }
    tree.dispatch.focus = target;
    if let Some(old) = old
        && tree.nodes.contains_key(old)
    {
        dispatch_sticky(tree, old, EventKind::FocusLost);
    }
    if let Some(new) = target {
        if !tree.nodes.contains_key(new) {
            tree.dispatch.focus = None;
            return Err(Error::Dispatch("focus target no longer exists".into()));
        }
        dispatch_sticky(tree, new, EventKind::FocusGained);
    }
    Ok(())
}

/// Feed a pointer position: synthesize enter/leave transitions against the
/// hit-tested topmost node, then trickle the move itself. The move is
/// offered back-to-front, matching the hit-test's preference for later
/// siblings, so the node that just gained hover is also first in line to
/// capture the move.
pub(crate) fn pointer_moved(tree: &mut Tree, sid: SurfaceId, pos: Point) -> Result<Option<NodeId>> {
    let hit = tree
        .surfaces
        .get(sid)
        .ok_or_else(|| Error::Dispatch("no such surface".into()))?
        .root
        .and_then(|root| hit_test(tree, root, pos));

    let old = tree.dispatch.hover;
    if old != hit {
        tree.dispatch.hover = hit;
        if let Some(old) = old
            && tree.nodes.contains_key(old)
        {
            dispatch_sticky(tree, old, EventKind::PointerLeave);
        }
        if let Some(new) = hit {
            dispatch_sticky(tree, new, EventKind::PointerEnter);
        }
    }
    dispatch(tree, sid, Event::new(EventKind::PointerMove { pos }).reversed())
}

fn dispatch_sticky(tree: &mut Tree, origin: NodeId, kind: EventKind) {
    deliver(tree, origin, &Event::new(kind).at(origin), false);
}

/// The deepest enabled node whose bounds contain the position, preferring
/// later siblings, which paint on top. Crosses into nested surfaces.
fn hit_test(tree: &Tree, id: NodeId, pos: Point) -> Option<NodeId> {
    let node = tree.nodes.get(id)?;
    if !node.enabled || !node.bounds.contains_point(pos) {
        return None;
    }
    if let Some(hosted) = node.hosted {
        let inner = tree.surfaces[hosted].from_parent(pos);
        if let Some(hit) = tree.surfaces[hosted]
            .root
            .and_then(|root| hit_test(tree, root, inner))
        {
            return Some(hit);
        }
        return Some(id);
    }
    for child in node.children.iter().rev() {
        if let Some(hit) = hit_test(tree, *child, pos) {
            return Some(hit);
        }
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use geom::{Expanse, Point, Rect};

    use crate::{
        Result,
        event::{Button, Event, EventKind, EventOutcome},
        layout::LayoutKind,
        surface::Sizing,
        tree::Tree,
        tutils::{TestWidget, log, taken},
    };

    fn down(x: f32, y: f32) -> Event {
        Event::new(EventKind::PointerDown {
            pos: Point::new(x, y),
            button: Button::Left,
        })
    }

    /// Three siblings under a stack root; the middle one captures. The
    /// trickle must stop without offering the remaining sibling or the
    /// root, and must report the capturer.
    #[test]
    fn capture_short_circuits() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 100.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add("root", TestWidget::logged("root", &events), LayoutKind::Stack);
        tree.set_surface_root(sid, root)?;
        let mut ids = Vec::new();
        for (tag, capture) in [("a", false), ("b", true), ("c", false)] {
            let mut w = TestWidget::logged(tag, &events);
            if capture {
                w = w.capturing("pointer_down");
            }
            let id = tree.add(tag, w, LayoutKind::Leaf);
            tree.add_child(root, id)?;
            ids.push(id);
        }
        tree.layout_surface(sid)?;

        // Reversed offer order: c, then b captures; a and root never see it.
        let capturer = tree.dispatch(sid, down(5.0, 5.0).reversed())?;
        assert_eq!(capturer, Some(ids[1]));
        assert_eq!(taken(&events), vec!["c:pointer_down", "b:pointer_down"]);
        Ok(())
    }

    #[test]
    fn trickle_skips_disabled_and_misses() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 100.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add("root", TestWidget::logged("root", &events), LayoutKind::Stack);
        tree.set_surface_root(sid, root)?;
        let a = tree.add(
            "a",
            TestWidget::logged("a", &events).sized(Expanse::new(10.0, 10.0)),
            LayoutKind::Leaf,
        );
        tree.add_child(root, a)?;
        tree.layout_surface(sid)?;

        // Outside the leaf but inside the root.
        tree.dispatch(sid, down(50.0, 50.0))?;
        assert_eq!(taken(&events), vec!["root:pointer_down"]);

        tree.set_enabled(a, false)?;
        tree.layout_surface(sid)?;
        tree.dispatch(sid, down(5.0, 5.0))?;
        assert_eq!(taken(&events), vec!["root:pointer_down"]);
        Ok(())
    }

    /// Key events go straight to the origin's handler chain; an ancestor
    /// that wants them registers a listener on the origin.
    #[test]
    fn bubble_delivers_at_origin() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 100.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add("root", TestWidget::logged("root", &events), LayoutKind::Stack);
        let leaf = tree.add(
            "leaf",
            TestWidget::logged("leaf", &events).capturing("key_down"),
            LayoutKind::Leaf,
        );
        tree.set_surface_root(sid, root)?;
        tree.add_child(root, leaf)?;

        let ancestor = events.clone();
        tree.listen(leaf, move |ev, _| {
            ancestor.borrow_mut().push(format!("root_interest:{}", ev.class()));
            EventOutcome::Ignore
        })?;

        let capturer = tree.dispatch(sid, Event::new(EventKind::KeyDown { code: 13 }).at(leaf))?;
        assert_eq!(capturer, Some(leaf));
        // The origin's widget and its listeners run; the root widget is
        // never offered the event.
        assert_eq!(taken(&events), vec!["leaf:key_down", "root_interest:key_down"]);
        Ok(())
    }

    #[test]
    fn bubble_without_origin_is_an_error() {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 10.0, 10.0), Sizing::Fixed);
        assert!(
            tree.dispatch(sid, Event::new(EventKind::KeyDown { code: 1 }))
                .is_err()
        );
    }

    /// A listener that captures a sticky event has its capture nullified:
    /// remaining listeners still run and no capturer is reported.
    #[test]
    fn sticky_capture_is_nullified() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 100.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add("root", TestWidget::logged("root", &events), LayoutKind::Leaf);
        tree.set_surface_root(sid, root)?;

        let first = events.clone();
        tree.listen(root, move |_, _| {
            first.borrow_mut().push("first".into());
            EventOutcome::Capture
        })?;
        let second = events.clone();
        tree.listen(root, move |_, _| {
            second.borrow_mut().push("second".into());
            EventOutcome::Ignore
        })?;

        tree.set_focus(Some(root))?;
        assert_eq!(taken(&events), vec!["root:focus_gained", "first", "second"]);
        Ok(())
    }

    /// A widget that captures a sticky event suppresses the node's
    /// remaining handlers for that dispatch.
    #[test]
    fn sticky_widget_capture_suppresses_listeners() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 100.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add(
            "root",
            TestWidget::logged("root", &events).capturing("focus_gained"),
            LayoutKind::Leaf,
        );
        tree.set_surface_root(sid, root)?;
        let silenced = events.clone();
        tree.listen(root, move |_, _| {
            silenced.borrow_mut().push("listener".into());
            EventOutcome::Ignore
        })?;

        tree.set_focus(Some(root))?;
        assert_eq!(taken(&events), vec!["root:focus_gained"]);
        Ok(())
    }

    /// Listener list mutation during dispatch: a once listener runs a
    /// single time, a listener removed mid-dispatch is not invoked, and a
    /// listener added mid-dispatch does not see the current event.
    #[test]
    fn listener_mutation_mid_dispatch() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 100.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add("root", TestWidget::new(), LayoutKind::Leaf);
        tree.set_surface_root(sid, root)?;
        tree.layout_surface(sid)?;

        let once_log = events.clone();
        tree.listen_once(root, move |_, _| {
            once_log.borrow_mut().push("once".into());
            EventOutcome::Ignore
        })?;

        let victim_log = events.clone();
        let victim = tree.listen(root, move |_, _| {
            victim_log.borrow_mut().push("victim".into());
            EventOutcome::Ignore
        })?;

        let adder_log = events.clone();
        let added_log = events.clone();
        tree.listen(root, move |_, ops| {
            adder_log.borrow_mut().push("adder".into());
            ops.remove(victim);
            let added_log = added_log.clone();
            ops.listen(move |_, _| {
                added_log.borrow_mut().push("added".into());
                EventOutcome::Ignore
            });
            EventOutcome::Ignore
        })?;

        // The victim precedes the adder in the snapshot, so it still fires
        // this round; the removal takes effect on the next dispatch.
        tree.dispatch(sid, down(5.0, 5.0))?;
        assert_eq!(taken(&events), vec!["once", "victim", "adder"]);

        tree.dispatch(sid, down(5.0, 5.0))?;
        assert_eq!(taken(&events), vec!["adder", "added"]);
        Ok(())
    }

    #[test]
    fn hover_synthesis() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 100.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add("root", TestWidget::logged("root", &events), LayoutKind::Stack);
        tree.set_surface_root(sid, root)?;
        let a = tree.add(
            "a",
            TestWidget::logged("a", &events).sized(Expanse::new(10.0, 10.0)),
            LayoutKind::Leaf,
        );
        tree.add_child(root, a)?;
        tree.layout_surface(sid)?;

        tree.pointer_moved(sid, Point::new(5.0, 5.0))?;
        assert_eq!(
            taken(&events),
            vec!["a:pointer_enter", "a:pointer_move", "root:pointer_move"]
        );

        // Moving off the leaf but staying on the root swaps the hover.
        tree.pointer_moved(sid, Point::new(50.0, 50.0))?;
        assert_eq!(
            taken(&events),
            vec!["a:pointer_leave", "root:pointer_enter", "root:pointer_move"]
        );
        Ok(())
    }

    /// With overlapping siblings, the node the hit-test awards hover to is
    /// also the first offered the synthesized move: both prefer the later
    /// sibling, which paints on top.
    #[test]
    fn pointer_move_prefers_the_top_layer() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 100.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add("root", TestWidget::new(), LayoutKind::Stack);
        tree.set_surface_root(sid, root)?;
        let bottom = tree.add(
            "bottom",
            TestWidget::logged("bottom", &events).capturing("pointer_move"),
            LayoutKind::Leaf,
        );
        let top = tree.add(
            "top",
            TestWidget::logged("top", &events).capturing("pointer_move"),
            LayoutKind::Leaf,
        );
        tree.add_child(root, bottom)?;
        tree.add_child(root, top)?;
        tree.layout_surface(sid)?;

        let capturer = tree.pointer_moved(sid, Point::new(5.0, 5.0))?;
        assert_eq!(tree.hover(), Some(top));
        assert_eq!(capturer, Some(top));
        assert_eq!(taken(&events), vec!["top:pointer_enter", "top:pointer_move"]);
        Ok(())
    }

    /// A listener can retire itself from inside its own callback.
    #[test]
    fn a_listener_can_remove_itself() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 100.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add("root", TestWidget::new(), LayoutKind::Leaf);
        tree.set_surface_root(sid, root)?;
        tree.layout_surface(sid)?;

        let seen = events.clone();
        tree.listen(root, move |_, ops| {
            seen.borrow_mut().push("fired".into());
            ops.remove_current();
            EventOutcome::Ignore
        })?;

        tree.dispatch(sid, down(5.0, 5.0))?;
        assert_eq!(taken(&events), vec!["fired"]);
        tree.dispatch(sid, down(5.0, 5.0))?;
        assert!(taken(&events).is_empty());
        Ok(())
    }

    #[test]
    fn focus_transitions() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 100.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add("root", TestWidget::new(), LayoutKind::Stack);
        tree.set_surface_root(sid, root)?;
        let a = tree.add("a", TestWidget::logged("a", &events), LayoutKind::Leaf);
        let b = tree.add("b", TestWidget::logged("b", &events), LayoutKind::Leaf);
        tree.add_child(root, a)?;
        tree.add_child(root, b)?;

        tree.set_focus(Some(a))?;
        tree.set_focus(Some(b))?;
        // Refocusing the holder is a no-op.
        tree.set_focus(Some(b))?;
        tree.set_focus(None)?;
        assert_eq!(
            taken(&events),
            vec![
                "a:focus_gained",
                "a:focus_lost",
                "b:focus_gained",
                "b:focus_lost"
            ]
        );
        Ok(())
    }

    #[test]
    fn normalized_coordinates_scale_to_the_surface() -> Result<()> {
        let mut tree = Tree::new();
        let sid = tree.add_surface(Rect::new(0.0, 0.0, 200.0, 100.0), Sizing::Fixed);
        let events = log();
        let root = tree.add("root", TestWidget::new(), LayoutKind::Stack);
        tree.set_surface_root(sid, root)?;
        let a = tree.add(
            "a",
            TestWidget::logged("a", &events).sized(Expanse::new(20.0, 20.0)),
            LayoutKind::Leaf,
        );
        tree.add_child(root, a)?;
        tree.layout_surface(sid)?;

        // (0.05, 0.1) of a 200x100 surface is (10, 10): inside the leaf.
        let capturer =
            tree.dispatch_normalized(sid, down(0.05, 0.1))?;
        assert_eq!(capturer, None);
        assert_eq!(taken(&events), vec!["a:pointer_down"]);
        Ok(())
    }
}
