//! Debug dump of tree structure and geometry.

use std::fmt::Write;

use crate::{state::NodeId, tree::Tree};

impl Tree {
    /// Render a subtree as an indented listing of names, committed bounds
    /// and state flags, for debugging and test failure output.
    pub fn dump(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_node(id, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let b = node.bounds;
        let _ = write!(
            out,
            "{:indent$}{} [{},{} {}x{}]",
            "",
            node.name,
            b.x,
            b.y,
            b.w,
            b.h,
            indent = depth * 2
        );
        if !node.enabled {
            out.push_str(" disabled");
        } else if !node.active {
            out.push_str(" inactive");
        }
        if node.layout_dirty {
            out.push_str(" dirty");
        }
        if node.hosted.is_some() {
            out.push_str(" host");
        }
        out.push('\n');
        for child in &node.children {
            self.dump_node(*child, depth + 1, out);
        }
    }
}
