//! The pass driver owning the layout tree.

use caliper_core::{bubble_layout_dirty, NodeArena, NodeError, NodeId};
use caliper_ui_layout::{Constraints, MeasurePolicy, Point, Size};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::measure::{place_subtree, MeasurePass};
use crate::node::LayoutNode;

static NEXT_PASS_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Owns a layout tree and drives its measure/placement passes.
///
/// Invalidation is batched: [`request_remeasure`] only marks dirty flags and
/// bubbles them to the root; nothing is recomputed until
/// [`measure_and_layout`] runs. A single call resolves every dirty node
/// reachable from the root, synchronously, on the calling thread.
///
/// [`request_remeasure`]: MeasureAndLayoutDelegate::request_remeasure
/// [`measure_and_layout`]: MeasureAndLayoutDelegate::measure_and_layout
pub struct MeasureAndLayoutDelegate {
    arena: Rc<RefCell<NodeArena>>,
    root: NodeId,
    root_constraints: Constraints,
}

impl MeasureAndLayoutDelegate {
    /// Creates a delegate with a fresh tree whose root uses `root_policy`.
    pub fn new(root_policy: Rc<dyn MeasurePolicy>, root_constraints: Constraints) -> Self {
        root_constraints.assert_valid();
        let arena = Rc::new(RefCell::new(NodeArena::new()));
        let root = arena
            .borrow_mut()
            .create(Box::new(LayoutNode::new(root_policy)));
        Self {
            arena,
            root,
            root_constraints,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Replaces the constraints the root is measured against.
    pub fn set_root_constraints(&mut self, constraints: Constraints) -> Result<(), NodeError> {
        constraints.assert_valid();
        if constraints != self.root_constraints {
            self.root_constraints = constraints;
            let mut arena = self.arena.borrow_mut();
            arena.with_node::<LayoutNode, _>(self.root, |node| node.mark_needs_measure())?;
        }
        Ok(())
    }

    /// Creates `node` in the tree as the last child of `parent`.
    ///
    /// The structural change dirties `parent` and its ancestors; the new
    /// subtree is picked up by the next pass.
    pub fn insert(&self, parent: NodeId, node: LayoutNode) -> Result<NodeId, NodeError> {
        let mut arena = self.arena.borrow_mut();
        if !arena.contains(parent) {
            return Err(NodeError::Missing { id: parent });
        }
        let id = arena.create(Box::new(node));
        arena.get_mut(parent)?.insert_child(id);
        arena.get_mut(id)?.on_attached_to_parent(parent);
        bubble_layout_dirty(&mut arena, parent);
        Ok(id)
    }

    /// Detaches `node_id` from its parent and drops its whole subtree.
    pub fn remove(&self, node_id: NodeId) -> Result<(), NodeError> {
        assert!(node_id != self.root, "cannot remove the root node");
        let mut arena = self.arena.borrow_mut();
        let parent = arena.get_mut(node_id)?.parent();
        if let Some(parent_id) = parent {
            arena.get_mut(parent_id)?.remove_child(node_id);
            arena.get_mut(node_id)?.on_removed_from_parent();
            bubble_layout_dirty(&mut arena, parent_id);
        }
        arena.remove(node_id)
    }

    /// Runs `f` against the layout node behind `id`.
    pub fn with_node<R>(
        &self,
        id: NodeId,
        f: impl FnOnce(&mut LayoutNode) -> R,
    ) -> Result<R, NodeError> {
        self.arena.borrow_mut().with_node::<LayoutNode, _>(id, f)
    }

    /// Marks `id` as needing measure and bubbles dirtiness to the root.
    ///
    /// Ancestors are dirtied too: a child's size change can change any
    /// ancestor's size, and the pass gate is the root's dirty flag. No pass
    /// runs here; invalidations batch until [`measure_and_layout`].
    ///
    /// A subtree whose parent's policy never measures it keeps its dirty
    /// flags from creation; invalidating a node inside it stops bubbling at
    /// that already-dirty ancestor and schedules no pass. Such a subtree has
    /// no measured size to update and stays inert until a measured node is
    /// invalidated.
    ///
    /// [`measure_and_layout`]: MeasureAndLayoutDelegate::measure_and_layout
    pub fn request_remeasure(&self, id: NodeId) -> Result<(), NodeError> {
        let mut arena = self.arena.borrow_mut();
        arena.with_node::<LayoutNode, _>(id, |node| node.mark_needs_measure())?;
        bubble_layout_dirty(&mut arena, id);
        log::trace!("request_remeasure: node {id} queued for next pass");
        Ok(())
    }

    /// Resolves all pending invalidations in one synchronous pass and
    /// returns the root's measured size.
    ///
    /// With a clean tree this is an O(1) skip: dirty flags bubble to the
    /// root, so a clean root means a clean tree and the previous sizes are
    /// returned untouched (consecutive calls are idempotent).
    pub fn measure_and_layout(&self) -> Result<Size, NodeError> {
        let needs_pass = self
            .arena
            .borrow_mut()
            .with_node::<LayoutNode, _>(self.root, |node| node.needs_layout())?;
        if !needs_pass {
            log::trace!("measure_and_layout: tree clean, skipping pass");
            return self.with_node(self.root, |node| node.size());
        }

        let epoch = NEXT_PASS_EPOCH.fetch_add(1, Ordering::Relaxed);
        let pass = MeasurePass::new(Rc::clone(&self.arena), epoch);
        let size = pass.measure_node(self.root, self.root_constraints)?;

        // The delegate owns the root and always places it at the origin.
        place_subtree(&mut self.arena.borrow_mut(), self.root, Point::ORIGIN, true)?;

        log::debug!(
            "measure pass {epoch}: root resolved to {}x{}",
            size.width,
            size.height
        );
        debug_assert!(
            !self.with_node(self.root, |node| node.needs_layout())?,
            "measure pass left the root dirty"
        );
        Ok(size)
    }

    /// Measured size of a node, valid whether or not the node was placed.
    pub fn size_of(&self, id: NodeId) -> Result<Size, NodeError> {
        self.with_node(id, |node| node.size())
    }

    /// Whether the node was positioned during the last pass that reached it.
    pub fn is_placed(&self, id: NodeId) -> Result<bool, NodeError> {
        self.with_node(id, |node| node.is_placed())
    }

    /// Position within the parent; meaningful only for placed nodes.
    pub fn position_of(&self, id: NodeId) -> Result<Point, NodeError> {
        self.with_node(id, |node| node.position())
    }
}

#[cfg(test)]
#[path = "tests/delegate_tests.rs"]
mod tests;
