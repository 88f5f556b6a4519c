use super::*;
use caliper_core::NodeId;
use std::cell::RefCell;
use std::rc::Rc;

/// Child stand-in that conforms to whatever constraints it is measured with.
struct StubMeasurable {
    id: NodeId,
    size: Size,
    placed_at: Rc<RefCell<Vec<(NodeId, f32, f32)>>>,
}

impl StubMeasurable {
    fn boxed(
        id: NodeId,
        width: f32,
        height: f32,
        placed_at: &Rc<RefCell<Vec<(NodeId, f32, f32)>>>,
    ) -> Box<dyn Measurable> {
        Box::new(Self {
            id,
            size: Size::new(width, height),
            placed_at: Rc::clone(placed_at),
        })
    }
}

impl Measurable for StubMeasurable {
    fn measure(&self, constraints: Constraints) -> Box<dyn Placeable> {
        let (width, height) = constraints.constrain(self.size.width, self.size.height);
        Box::new(StubPlaceable {
            id: self.id,
            size: Size::new(width, height),
            placed_at: Rc::clone(&self.placed_at),
        })
    }

    fn min_intrinsic_width(&self, _height: f32) -> f32 {
        self.size.width
    }

    fn max_intrinsic_width(&self, _height: f32) -> f32 {
        self.size.width
    }

    fn min_intrinsic_height(&self, _width: f32) -> f32 {
        self.size.height
    }

    fn max_intrinsic_height(&self, _width: f32) -> f32 {
        self.size.height
    }
}

struct StubPlaceable {
    id: NodeId,
    size: Size,
    placed_at: Rc<RefCell<Vec<(NodeId, f32, f32)>>>,
}

impl Placeable for StubPlaceable {
    fn place(&self, x: f32, y: f32) {
        self.placed_at.borrow_mut().push((self.id, x, y));
    }

    fn width(&self) -> f32 {
        self.size.width
    }

    fn height(&self) -> f32 {
        self.size.height
    }

    fn node_id(&self) -> NodeId {
        self.id
    }
}

fn placement_log() -> Rc<RefCell<Vec<(NodeId, f32, f32)>>> {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn fixed_size_reports_configured_size_under_any_constraints() {
    let policy = FixedSizePolicy::new(10.0, 10.0);
    let result = policy.measure(&[], Constraints::tight(5.0, 5.0));
    assert_eq!(result.size, Size::new(10.0, 10.0));
    assert!(result.placements.is_empty());

    assert_eq!(policy.min_intrinsic_width(&[], 0.0), 10.0);
    assert_eq!(policy.max_intrinsic_height(&[], 0.0), 10.0);
}

#[test]
fn empty_policy_reports_constraint_minimums() {
    let policy = EmptyMeasurePolicy;
    let result = policy.measure(&[], Constraints::new(3.0, 10.0, 4.0, 10.0));
    assert_eq!(result.size, Size::new(3.0, 4.0));
    assert!(result.placements.is_empty());
}

#[test]
fn wrap_content_sizes_to_the_largest_child() {
    let log = placement_log();
    let children = vec![
        StubMeasurable::boxed(1, 10.0, 10.0, &log),
        StubMeasurable::boxed(2, 30.0, 5.0, &log),
    ];

    let result = WrapContentPolicy.measure(&children, Constraints::loose(100.0, 100.0));
    assert_eq!(result.size, Size::new(30.0, 10.0));

    // Every child is placed at the origin, both through the placeable and
    // through an explicit placement entry.
    assert_eq!(&*log.borrow(), &[(1, 0.0, 0.0), (2, 0.0, 0.0)]);
    assert_eq!(result.placements.len(), 2);
    assert!(result
        .placements
        .iter()
        .all(|p| p.x == 0.0 && p.y == 0.0));
}

#[test]
fn wrap_content_clamps_into_incoming_constraints() {
    let log = placement_log();
    let children = vec![StubMeasurable::boxed(1, 30.0, 5.0, &log)];

    let result = WrapContentPolicy.measure(&children, Constraints::new(0.0, 20.0, 8.0, 100.0));
    assert_eq!(result.size, Size::new(20.0, 8.0));
}

#[test]
fn wrap_content_measures_children_with_loosened_constraints() {
    let log = placement_log();
    let children = vec![StubMeasurable::boxed(1, 10.0, 10.0, &log)];

    // Under tight constraints the child still wraps to its own size because
    // the policy loosens before measuring; only the result is forced tight.
    let result = WrapContentPolicy.measure(&children, Constraints::tight(50.0, 50.0));
    assert_eq!(result.size, Size::new(50.0, 50.0));
    assert_eq!(
        result.placements.first().map(|p| p.node_id),
        Some(1),
        "child is still placed even when smaller than the forced size"
    );
}

#[test]
fn wrap_content_intrinsics_take_the_max_over_children() {
    let log = placement_log();
    let children = vec![
        StubMeasurable::boxed(1, 10.0, 10.0, &log),
        StubMeasurable::boxed(2, 30.0, 5.0, &log),
    ];

    let policy = WrapContentPolicy;
    assert_eq!(policy.min_intrinsic_width(&children, 100.0), 30.0);
    assert_eq!(policy.max_intrinsic_width(&children, 100.0), 30.0);
    assert_eq!(policy.min_intrinsic_height(&children, 100.0), 10.0);
    assert_eq!(policy.max_intrinsic_height(&children, 100.0), 10.0);
}
