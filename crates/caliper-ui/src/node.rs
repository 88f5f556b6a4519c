use caliper_core::{Node, NodeId};
use caliper_ui_layout::{Constraints, MeasurePolicy, Point, Size};
use indexmap::IndexSet;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone)]
struct MeasurementCacheEntry {
    constraints: Constraints,
    size: Size,
}

/// Cache key for intrinsic measurements.
#[derive(Clone, Copy, Debug)]
pub(crate) enum IntrinsicKind {
    MinWidth(f32),
    MaxWidth(f32),
    MinHeight(f32),
    MaxHeight(f32),
}

impl IntrinsicKind {
    fn discriminant(&self) -> u8 {
        match self {
            IntrinsicKind::MinWidth(_) => 0,
            IntrinsicKind::MaxWidth(_) => 1,
            IntrinsicKind::MinHeight(_) => 2,
            IntrinsicKind::MaxHeight(_) => 3,
        }
    }

    fn value_bits(&self) -> u32 {
        match self {
            IntrinsicKind::MinWidth(value)
            | IntrinsicKind::MaxWidth(value)
            | IntrinsicKind::MinHeight(value)
            | IntrinsicKind::MaxHeight(value) => value.to_bits(),
        }
    }
}

impl PartialEq for IntrinsicKind {
    fn eq(&self, other: &Self) -> bool {
        self.discriminant() == other.discriminant() && self.value_bits() == other.value_bits()
    }
}

impl Eq for IntrinsicKind {}

#[derive(Default)]
struct NodeCacheState {
    epoch: u64,
    measurements: Vec<MeasurementCacheEntry>,
    intrinsics: Vec<(IntrinsicKind, f32)>,
}

/// Shared handle to a node's per-pass measurement cache.
///
/// Entries are valid for a single pass epoch; activating a new epoch drops
/// them. Within a pass, measuring the same node under identical constraints
/// reuses the stored size instead of re-running its policy.
#[derive(Clone, Default)]
pub(crate) struct MeasureCacheHandles {
    state: Rc<RefCell<NodeCacheState>>,
}

impl MeasureCacheHandles {
    pub(crate) fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.measurements.clear();
        state.intrinsics.clear();
        state.epoch = 0;
    }

    pub(crate) fn activate(&self, epoch: u64) {
        let mut state = self.state.borrow_mut();
        if state.epoch != epoch {
            state.measurements.clear();
            state.intrinsics.clear();
            state.epoch = epoch;
        }
    }

    pub(crate) fn get_measurement(&self, constraints: Constraints) -> Option<Size> {
        let state = self.state.borrow();
        state
            .measurements
            .iter()
            .find(|entry| entry.constraints == constraints)
            .map(|entry| entry.size)
    }

    pub(crate) fn store_measurement(&self, constraints: Constraints, size: Size) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state
            .measurements
            .iter_mut()
            .find(|entry| entry.constraints == constraints)
        {
            entry.size = size;
        } else {
            state
                .measurements
                .push(MeasurementCacheEntry { constraints, size });
        }
    }

    pub(crate) fn get_intrinsic(&self, kind: &IntrinsicKind) -> Option<f32> {
        let state = self.state.borrow();
        state
            .intrinsics
            .iter()
            .find(|(stored_kind, _)| stored_kind == kind)
            .map(|(_, value)| *value)
    }

    pub(crate) fn store_intrinsic(&self, kind: IntrinsicKind, value: f32) {
        let mut state = self.state.borrow_mut();
        if let Some((_, existing)) = state
            .intrinsics
            .iter_mut()
            .find(|(stored_kind, _)| stored_kind == &kind)
        {
            *existing = value;
        } else {
            state.intrinsics.push((kind, value));
        }
    }
}

/// A node in the layout tree.
///
/// Behavior is carried by a [`MeasurePolicy`] value rather than a node
/// subclass, so every node is the same struct. Measured size and the placed
/// flag are independent fields: `size` is valid as soon as the node's policy
/// returns, while `placed` only becomes true if an ancestor chain actually
/// positioned the node during the pass.
pub struct LayoutNode {
    measure_policy: Rc<dyn MeasurePolicy>,
    pub children: IndexSet<NodeId>,
    cache: MeasureCacheHandles,
    needs_measure: Cell<bool>,
    needs_layout: Cell<bool>,
    placed: Cell<bool>,
    size: Cell<Size>,
    position: Cell<Point>,
    // Placement decisions from this node's last measure, applied by the
    // top-down placement sweep only if this node itself ends up placed.
    pending_placements: RefCell<Vec<(NodeId, Point)>>,
    parent: Cell<Option<NodeId>>,
    id: Cell<Option<NodeId>>,
}

impl LayoutNode {
    pub fn new(measure_policy: Rc<dyn MeasurePolicy>) -> Self {
        Self {
            measure_policy,
            children: IndexSet::new(),
            cache: MeasureCacheHandles::default(),
            needs_measure: Cell::new(true), // new nodes need an initial measure
            needs_layout: Cell::new(true),
            placed: Cell::new(false),
            size: Cell::new(Size::ZERO),
            position: Cell::new(Point::ORIGIN),
            pending_placements: RefCell::new(Vec::new()),
            parent: Cell::new(None),
            id: Cell::new(None),
        }
    }

    pub fn measure_policy(&self) -> Rc<dyn MeasurePolicy> {
        Rc::clone(&self.measure_policy)
    }

    pub fn set_measure_policy(&mut self, policy: Rc<dyn MeasurePolicy>) {
        // Only mark dirty if the policy actually changed (pointer comparison).
        if !Rc::ptr_eq(&self.measure_policy, &policy) {
            self.measure_policy = policy;
            self.cache.clear();
            self.mark_needs_measure();
        }
    }

    /// Mark this node as needing measure. Also marks it as needing layout.
    pub fn mark_needs_measure(&self) {
        self.needs_measure.set(true);
        self.needs_layout.set(true);
    }

    pub fn needs_measure(&self) -> bool {
        self.needs_measure.get()
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout.get()
    }

    pub(crate) fn clear_needs_measure(&self) {
        self.needs_measure.set(false);
    }

    pub(crate) fn clear_needs_layout(&self) {
        self.needs_layout.set(false);
    }

    /// Measured size from the last pass. Valid independent of placement.
    pub fn size(&self) -> Size {
        self.size.get()
    }

    pub(crate) fn set_size(&self, size: Size) {
        self.size.set(size);
    }

    /// Whether an ancestor chain positioned this node during its last pass.
    pub fn is_placed(&self) -> bool {
        self.placed.get()
    }

    pub(crate) fn set_placed(&self, placed: bool) {
        self.placed.set(placed);
    }

    /// Position within the parent, meaningful only while [`is_placed`] is true.
    ///
    /// [`is_placed`]: LayoutNode::is_placed
    pub fn position(&self) -> Point {
        self.position.get()
    }

    pub(crate) fn set_position(&self, position: Point) {
        self.position.set(position);
    }

    pub(crate) fn set_pending_placements(&self, placements: Vec<(NodeId, Point)>) {
        *self.pending_placements.borrow_mut() = placements;
    }

    pub(crate) fn pending_placement_of(&self, child: NodeId) -> Option<Point> {
        self.pending_placements
            .borrow()
            .iter()
            .find(|(id, _)| *id == child)
            .map(|(_, position)| *position)
    }

    pub fn node_id(&self) -> Option<NodeId> {
        self.id.get()
    }

    pub(crate) fn cache_handles(&self) -> MeasureCacheHandles {
        self.cache.clone()
    }
}

impl Node for LayoutNode {
    fn insert_child(&mut self, child: NodeId) {
        self.children.insert(child);
        self.cache.clear();
        self.mark_needs_measure();
    }

    fn remove_child(&mut self, child: NodeId) {
        self.children.shift_remove(&child);
        self.pending_placements
            .borrow_mut()
            .retain(|(id, _)| *id != child);
        self.cache.clear();
        self.mark_needs_measure();
    }

    fn children(&self) -> Vec<NodeId> {
        self.children.iter().copied().collect()
    }

    fn set_node_id(&mut self, id: NodeId) {
        self.id.set(Some(id));
    }

    fn on_attached_to_parent(&mut self, parent: NodeId) {
        self.parent.set(Some(parent));
    }

    fn on_removed_from_parent(&mut self) {
        self.parent.set(None);
        self.placed.set(false);
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent.get()
    }

    fn mark_needs_layout(&self) {
        self.needs_layout.set(true);
    }

    fn needs_layout(&self) -> bool {
        self.needs_layout.get()
    }
}

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod tests;
