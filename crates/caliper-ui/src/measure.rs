//! Recursive measure driver.
//!
//! A [`MeasurePass`] resolves sizes bottom-up: measuring a node runs its
//! policy, which measures children through [`LayoutChildMeasurable`] handles
//! before the policy returns its own size. Placement decisions are only
//! recorded here; they take effect in the top-down [`place_subtree`] sweep,
//! so a child measured by a never-placed parent stays unplaced while its
//! size remains readable.

use caliper_core::{NodeArena, NodeError, NodeId};
use caliper_ui_layout::{Constraints, Measurable, Placeable, Point, Size};
use std::cell::RefCell;
use std::rc::Rc;

use crate::node::{IntrinsicKind, LayoutNode, MeasureCacheHandles};

#[derive(Clone)]
pub(crate) struct MeasurePass {
    arena: Rc<RefCell<NodeArena>>,
    epoch: u64,
}

impl MeasurePass {
    pub(crate) fn new(arena: Rc<RefCell<NodeArena>>, epoch: u64) -> Self {
        Self { arena, epoch }
    }

    /// Measures `node_id` under `constraints`, returning its resolved size.
    ///
    /// Re-entrant through policy callbacks: no arena borrow is held while a
    /// measure policy runs.
    pub(crate) fn measure_node(
        &self,
        node_id: NodeId,
        constraints: Constraints,
    ) -> Result<Size, NodeError> {
        constraints.assert_valid();

        let (policy, children, cache) =
            self.arena
                .borrow_mut()
                .with_node::<LayoutNode, _>(node_id, |node| {
                    (
                        node.measure_policy(),
                        node.children.iter().copied().collect::<Vec<_>>(),
                        node.cache_handles(),
                    )
                })?;

        cache.activate(self.epoch);
        if let Some(size) = cache.get_measurement(constraints) {
            return Ok(size);
        }

        let error: Rc<RefCell<Option<NodeError>>> = Rc::new(RefCell::new(None));
        let mut records: Vec<(NodeId, Rc<RefCell<Option<Point>>>)> =
            Vec::with_capacity(children.len());
        let mut measurables: Vec<Box<dyn Measurable>> = Vec::with_capacity(children.len());

        for &child_id in &children {
            let child_cache = self
                .arena
                .borrow_mut()
                .with_node::<LayoutNode, _>(child_id, |child| child.cache_handles())?;
            child_cache.activate(self.epoch);

            let last_position = Rc::new(RefCell::new(None));
            records.push((child_id, Rc::clone(&last_position)));
            measurables.push(Box::new(LayoutChildMeasurable {
                pass: self.clone(),
                node_id: child_id,
                measured: Rc::new(RefCell::new(None)),
                last_position,
                error: Rc::clone(&error),
                cache: child_cache,
            }));
        }

        let result = policy.measure(&measurables, constraints);
        if let Some(err) = error.borrow_mut().take() {
            return Err(err);
        }

        // Record where the policy chose to put each child: an explicit
        // Placement entry wins, otherwise the position captured by a
        // Placeable::place call. Children with neither stay unplaced.
        let mut pending: Vec<(NodeId, Point)> = Vec::new();
        for (child_id, last_position) in &records {
            let position = result
                .placements
                .iter()
                .find(|placement| placement.node_id == *child_id)
                .map(|placement| placement.position())
                .or_else(|| *last_position.borrow());
            if let Some(position) = position {
                pending.push((*child_id, position));
            }
        }

        let size = result.size;
        self.arena
            .borrow_mut()
            .with_node::<LayoutNode, _>(node_id, |node| {
                node.set_size(size);
                node.set_pending_placements(pending);
                node.clear_needs_measure();
                node.clear_needs_layout();
            })?;
        cache.store_measurement(constraints, size);
        Ok(size)
    }
}

/// Top-down placement sweep.
///
/// A node's recorded placement decisions only apply while the node itself is
/// placed; an unplaced node unplaces its entire subtree, whatever its
/// children recorded.
pub(crate) fn place_subtree(
    arena: &mut NodeArena,
    node_id: NodeId,
    position: Point,
    placed: bool,
) -> Result<(), NodeError> {
    let children = arena.with_node::<LayoutNode, _>(node_id, |node| {
        node.set_placed(placed);
        if placed {
            node.set_position(position);
        }
        node.children.iter().copied().collect::<Vec<_>>()
    })?;

    for child in children {
        let child_position = if placed {
            arena.with_node::<LayoutNode, _>(node_id, |node| node.pending_placement_of(child))?
        } else {
            None
        };
        match child_position {
            Some(point) => place_subtree(arena, child, point, true)?,
            None => place_subtree(arena, child, Point::ORIGIN, false)?,
        }
    }
    Ok(())
}

struct LayoutChildMeasurable {
    pass: MeasurePass,
    node_id: NodeId,
    measured: Rc<RefCell<Option<Size>>>,
    last_position: Rc<RefCell<Option<Point>>>,
    error: Rc<RefCell<Option<NodeError>>>,
    cache: MeasureCacheHandles,
}

impl LayoutChildMeasurable {
    fn record_error(&self, err: NodeError) {
        let mut slot = self.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn intrinsic_measure(&self, constraints: Constraints) -> Option<Size> {
        match self.pass.measure_node(self.node_id, constraints) {
            Ok(size) => Some(size),
            Err(err) => {
                self.record_error(err);
                None
            }
        }
    }
}

impl Measurable for LayoutChildMeasurable {
    fn measure(&self, constraints: Constraints) -> Box<dyn Placeable> {
        self.cache.activate(self.pass.epoch);
        if let Some(size) = self.cache.get_measurement(constraints) {
            *self.measured.borrow_mut() = Some(size);
        } else {
            match self.pass.measure_node(self.node_id, constraints) {
                Ok(size) => {
                    *self.measured.borrow_mut() = Some(size);
                }
                Err(err) => {
                    self.record_error(err);
                    self.measured.borrow_mut().take();
                }
            }
        }
        Box::new(LayoutChildPlaceable {
            node_id: self.node_id,
            measured: Rc::clone(&self.measured),
            last_position: Rc::clone(&self.last_position),
        })
    }

    fn min_intrinsic_width(&self, height: f32) -> f32 {
        let kind = IntrinsicKind::MinWidth(height);
        self.cache.activate(self.pass.epoch);
        if let Some(value) = self.cache.get_intrinsic(&kind) {
            return value;
        }
        let constraints = Constraints::new(0.0, f32::INFINITY, height, height);
        if let Some(size) = self.intrinsic_measure(constraints) {
            self.cache.store_intrinsic(kind, size.width);
            size.width
        } else {
            0.0
        }
    }

    fn max_intrinsic_width(&self, height: f32) -> f32 {
        let kind = IntrinsicKind::MaxWidth(height);
        self.cache.activate(self.pass.epoch);
        if let Some(value) = self.cache.get_intrinsic(&kind) {
            return value;
        }
        let constraints = Constraints::new(0.0, f32::INFINITY, 0.0, height);
        if let Some(size) = self.intrinsic_measure(constraints) {
            self.cache.store_intrinsic(kind, size.width);
            size.width
        } else {
            0.0
        }
    }

    fn min_intrinsic_height(&self, width: f32) -> f32 {
        let kind = IntrinsicKind::MinHeight(width);
        self.cache.activate(self.pass.epoch);
        if let Some(value) = self.cache.get_intrinsic(&kind) {
            return value;
        }
        let constraints = Constraints::new(width, width, 0.0, f32::INFINITY);
        if let Some(size) = self.intrinsic_measure(constraints) {
            self.cache.store_intrinsic(kind, size.height);
            size.height
        } else {
            0.0
        }
    }

    fn max_intrinsic_height(&self, width: f32) -> f32 {
        let kind = IntrinsicKind::MaxHeight(width);
        self.cache.activate(self.pass.epoch);
        if let Some(value) = self.cache.get_intrinsic(&kind) {
            return value;
        }
        let constraints = Constraints::new(0.0, width, 0.0, f32::INFINITY);
        if let Some(size) = self.intrinsic_measure(constraints) {
            self.cache.store_intrinsic(kind, size.height);
            size.height
        } else {
            0.0
        }
    }
}

struct LayoutChildPlaceable {
    node_id: NodeId,
    measured: Rc<RefCell<Option<Size>>>,
    last_position: Rc<RefCell<Option<Point>>>,
}

impl Placeable for LayoutChildPlaceable {
    fn place(&self, x: f32, y: f32) {
        *self.last_position.borrow_mut() = Some(Point::new(x, y));
    }

    fn width(&self) -> f32 {
        self.measured
            .borrow()
            .as_ref()
            .map(|size| size.width)
            .unwrap_or(0.0)
    }

    fn height(&self) -> f32 {
        self.measured
            .borrow()
            .as_ref()
            .map(|size| size.height)
            .unwrap_or(0.0)
    }

    fn node_id(&self) -> NodeId {
        self.node_id
    }
}

#[cfg(test)]
#[path = "tests/measure_tests.rs"]
mod tests;
