//! Node identity, tree storage, and dirty-flag bubbling for the caliper
//! layout engine.
//!
//! The engine stores every node behind a [`NodeId`] in a [`NodeArena`]; the
//! measuring crate downcasts to its concrete node type through
//! [`NodeArena::with_node`]. Dirty flags propagate to the root with
//! [`bubble_layout_dirty`] so that a single O(1) check on the root tells a
//! caller whether anything in the tree needs a new pass.

use std::any::Any;

/// Identifier for a node stored in a [`NodeArena`].
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    Missing { id: NodeId },
    TypeMismatch { id: NodeId, expected: &'static str },
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeError::Missing { id } => write!(f, "node {id} missing"),
            NodeError::TypeMismatch { id, expected } => {
                write!(f, "node {id} type mismatch; expected {expected}")
            }
        }
    }
}

impl std::error::Error for NodeError {}

/// Behavior shared by every node the arena can hold.
///
/// Concrete node types keep their own state (measure policy, cached sizes,
/// dirty flags); the trait exposes only what tree maintenance and dirty
/// bubbling need.
pub trait Node: Any {
    fn insert_child(&mut self, _child: NodeId) {}
    fn remove_child(&mut self, _child: NodeId) {}
    fn children(&self) -> Vec<NodeId> {
        Vec::new()
    }
    /// Called after the node is created to record its own ID.
    fn set_node_id(&mut self, _id: NodeId) {}
    /// Called when this node is attached to a parent.
    fn on_attached_to_parent(&mut self, _parent: NodeId) {}
    /// Called when this node is removed from its parent.
    fn on_removed_from_parent(&mut self) {}
    /// Returns this node's parent, if it tracks one.
    fn parent(&self) -> Option<NodeId> {
        None
    }
    /// Mark this node as needing layout. Called during dirty bubbling.
    fn mark_needs_layout(&self) {}
    /// Check whether this node needs layout.
    fn needs_layout(&self) -> bool {
        false
    }
}

impl dyn Node {
    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Slot-vector storage for layout nodes.
///
/// Removed slots stay as `None`; IDs are never reused within an arena, so a
/// stale [`NodeId`] surfaces as [`NodeError::Missing`] instead of aliasing a
/// new node.
#[derive(Default)]
pub struct NodeArena {
    nodes: Vec<Option<Box<dyn Node>>>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn create(&mut self, mut node: Box<dyn Node>) -> NodeId {
        let id = self.nodes.len();
        node.set_node_id(id);
        self.nodes.push(Some(node));
        id
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut dyn Node, NodeError> {
        let slot = self
            .nodes
            .get_mut(id)
            .ok_or(NodeError::Missing { id })?
            .as_deref_mut()
            .ok_or(NodeError::Missing { id })?;
        Ok(slot)
    }

    /// Runs `f` against the node downcast to its concrete type `N`.
    pub fn with_node<N: Node + 'static, R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut N) -> R,
    ) -> Result<R, NodeError> {
        let slot = self
            .nodes
            .get_mut(id)
            .ok_or(NodeError::Missing { id })?
            .as_deref_mut()
            .ok_or(NodeError::Missing { id })?;
        let typed = slot
            .as_any_mut()
            .downcast_mut::<N>()
            .ok_or(NodeError::TypeMismatch {
                id,
                expected: std::any::type_name::<N>(),
            })?;
        Ok(f(typed))
    }

    /// Removes the node and, recursively, its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), NodeError> {
        let children = {
            let slot = self.nodes.get(id).ok_or(NodeError::Missing { id })?;
            match slot {
                Some(node) => node.children(),
                None => return Err(NodeError::Missing { id }),
            }
        };

        for child_id in children {
            // A child may already be gone if it was removed individually.
            let _ = self.remove(child_id);
        }

        let slot = self.nodes.get_mut(id).ok_or(NodeError::Missing { id })?;
        slot.take();
        Ok(())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id), Some(Some(_)))
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the subtree under `root` as an indented debug listing.
    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        if let Some(Some(node)) = self.nodes.get(id) {
            let type_name = std::any::type_name_of_val(&**node);
            output.push_str(&format!("{}[{}] {}\n", indent, id, type_name));
            for child_id in node.children() {
                self.dump_node(output, child_id, depth + 1);
            }
        } else {
            output.push_str(&format!("{}[{}] (missing)\n", indent, id));
        }
    }
}

/// Bubbles layout dirtiness from `node_id` to the root.
///
/// Marks the starting node, then walks the parent chain marking each ancestor
/// until one is already dirty or the root is reached. The early exit keeps
/// repeated invalidations of the same subtree O(1).
pub fn bubble_layout_dirty(arena: &mut NodeArena, mut node_id: NodeId) {
    if let Ok(node) = arena.get_mut(node_id) {
        node.mark_needs_layout();
    }

    loop {
        let parent_id = match arena.get_mut(node_id) {
            Ok(node) => node.parent(),
            Err(_) => None,
        };

        match parent_id {
            Some(pid) => {
                if let Ok(parent) = arena.get_mut(pid) {
                    if !parent.needs_layout() {
                        parent.mark_needs_layout();
                        node_id = pid;
                    } else {
                        log::trace!("bubble_layout_dirty: ancestor {pid} already dirty");
                        break;
                    }
                } else {
                    break;
                }
            }
            None => break,
        }
    }
}

#[cfg(test)]
#[path = "tests/arena_tests.rs"]
mod tests;
