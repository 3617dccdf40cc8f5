//! Core node data stored in the arena.

use bitflags::bitflags;
use geom::Rect;

use crate::{
    event::Listener,
    layout::{LayoutKind, flex::{FlexParams, FlexState}},
    state::{NodeId, NodeName, SurfaceId},
    widget::Widget,
};

bitflags! {
    /// What a state change invalidated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Dirt: u8 {
        /// Sizes or positions may have changed; run a layout pass.
        const LAYOUT = 1;
        /// Pixels may have changed; repaint the node's bounds.
        const PAINT = 2;
    }
}

/// Core node data stored in the arena.
///
/// A node is created detached. The child vector is the single ownership
/// record; `parent` is a plain back-key, cleared on detach. `surface` is set
/// while the node is attached and names the surface the node draws to and
/// reports damage to.
pub struct Node {
    /// Widget behavior and state.
    pub(crate) widget: Box<dyn Widget>,
    /// Node name for dumps and factory lookup.
    pub(crate) name: NodeName,

    /// Parent in the arena tree.
    pub(crate) parent: Option<NodeId>,
    /// Children in the arena tree.
    pub(crate) children: Vec<NodeId>,

    /// The surface this node is bound to while attached.
    pub(crate) surface: Option<SurfaceId>,
    /// A nested surface owned by this node. Descendants bind to it instead
    /// of the node's own surface.
    pub(crate) hosted: Option<SurfaceId>,

    /// How this node lays out its children.
    pub(crate) layout: LayoutKind,
    /// Flex inputs this node presents to a flex parent.
    pub(crate) flex: FlexParams,

    /// Enabled flag. Disabled nodes are skipped by layout accounting and
    /// event delivery.
    pub(crate) enabled: bool,
    /// Cached "attached and enabled along the entire ancestor chain".
    pub(crate) active: bool,
    /// Set when this node's layout inputs changed since the last pass.
    pub(crate) layout_dirty: bool,

    /// Position and size resolved by the current layout pass, in surface
    /// content coordinates. Valid whenever `layout_dirty` is false.
    pub(crate) ideal: Rect,
    /// Bounds committed by the last finalize pass.
    pub(crate) bounds: Rect,

    /// Container bookkeeping from the last flex resolution. Recomputed
    /// every pass; never persisted across frames.
    pub(crate) flex_state: Option<FlexState>,

    /// User-supplied event listeners.
    pub(crate) listeners: Vec<Listener>,
}

impl Node {
    pub(crate) fn new(widget: Box<dyn Widget>, name: NodeName, layout: LayoutKind) -> Self {
        Self {
            widget,
            name,
            parent: None,
            children: Vec::new(),
            surface: None,
            hosted: None,
            layout,
            flex: FlexParams::default(),
            enabled: true,
            active: false,
            layout_dirty: true,
            ideal: Rect::default(),
            bounds: Rect::default(),
            flex_state: None,
            listeners: Vec::new(),
        }
    }

    /// The node's name.
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// The node's parent, if attached under one.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node's children, in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The surface this node is bound to, while attached.
    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    /// Is the node enabled?
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Is the node attached and enabled along its entire ancestor chain?
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Bounds committed by the last finalize pass, in surface content
    /// coordinates.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The flex inputs this node presents to a flex parent.
    pub fn flex(&self) -> FlexParams {
        self.flex
    }

    /// How this node lays out its children.
    pub fn layout(&self) -> &LayoutKind {
        &self.layout
    }
}
