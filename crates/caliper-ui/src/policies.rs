//! Built-in measure policies.

use caliper_ui_layout::{
    Constraints, Measurable, MeasurePolicy, MeasureResult, Placeable, Placement, Size,
};
use smallvec::SmallVec;

/// Reports a fixed size, ignoring incoming constraints.
///
/// This is a deliberate override: even when the constraints are narrower
/// than the configured size, the policy reports the configured size. Parents
/// that need a conforming child must clamp the reported size themselves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedSizePolicy {
    pub size: Size,
}

impl FixedSizePolicy {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
        }
    }
}

impl MeasurePolicy for FixedSizePolicy {
    fn measure(
        &self,
        _measurables: &[Box<dyn Measurable>],
        _constraints: Constraints,
    ) -> MeasureResult {
        MeasureResult::unplaced(self.size)
    }

    fn min_intrinsic_width(&self, _measurables: &[Box<dyn Measurable>], _height: f32) -> f32 {
        self.size.width
    }

    fn max_intrinsic_width(&self, _measurables: &[Box<dyn Measurable>], _height: f32) -> f32 {
        self.size.width
    }

    fn min_intrinsic_height(&self, _measurables: &[Box<dyn Measurable>], _width: f32) -> f32 {
        self.size.height
    }

    fn max_intrinsic_height(&self, _measurables: &[Box<dyn Measurable>], _width: f32) -> f32 {
        self.size.height
    }
}

/// Sizes to the largest child and places every child at the origin.
///
/// Children are measured with loosened constraints; the resulting size is
/// clamped back into the incoming constraints.
#[derive(Clone, Copy, Debug, Default)]
pub struct WrapContentPolicy;

impl MeasurePolicy for WrapContentPolicy {
    fn measure(
        &self,
        measurables: &[Box<dyn Measurable>],
        constraints: Constraints,
    ) -> MeasureResult {
        let child_constraints = constraints.loosen();

        let mut max_width = 0.0_f32;
        let mut max_height = 0.0_f32;
        let mut placeables: SmallVec<[Box<dyn Placeable>; 4]> =
            SmallVec::with_capacity(measurables.len());

        for measurable in measurables {
            let placeable = measurable.measure(child_constraints);
            max_width = max_width.max(placeable.width());
            max_height = max_height.max(placeable.height());
            placeables.push(placeable);
        }

        let (width, height) = constraints.constrain(max_width, max_height);

        let mut placements = Vec::with_capacity(placeables.len());
        for placeable in placeables {
            placeable.place(0.0, 0.0);
            placements.push(Placement::new(placeable.node_id(), 0.0, 0.0));
        }

        MeasureResult::new(Size::new(width, height), placements)
    }

    fn min_intrinsic_width(&self, measurables: &[Box<dyn Measurable>], height: f32) -> f32 {
        measurables
            .iter()
            .map(|m| m.min_intrinsic_width(height))
            .fold(0.0, f32::max)
    }

    fn max_intrinsic_width(&self, measurables: &[Box<dyn Measurable>], height: f32) -> f32 {
        measurables
            .iter()
            .map(|m| m.max_intrinsic_width(height))
            .fold(0.0, f32::max)
    }

    fn min_intrinsic_height(&self, measurables: &[Box<dyn Measurable>], width: f32) -> f32 {
        measurables
            .iter()
            .map(|m| m.min_intrinsic_height(width))
            .fold(0.0, f32::max)
    }

    fn max_intrinsic_height(&self, measurables: &[Box<dyn Measurable>], width: f32) -> f32 {
        measurables
            .iter()
            .map(|m| m.max_intrinsic_height(width))
            .fold(0.0, f32::max)
    }
}

/// Leaf policy: reports the constraint minimums.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyMeasurePolicy;

impl MeasurePolicy for EmptyMeasurePolicy {
    fn measure(
        &self,
        _measurables: &[Box<dyn Measurable>],
        constraints: Constraints,
    ) -> MeasureResult {
        MeasureResult::unplaced(Size::new(constraints.min_width, constraints.min_height))
    }

    fn min_intrinsic_width(&self, _measurables: &[Box<dyn Measurable>], _height: f32) -> f32 {
        0.0
    }

    fn max_intrinsic_width(&self, _measurables: &[Box<dyn Measurable>], _height: f32) -> f32 {
        0.0
    }

    fn min_intrinsic_height(&self, _measurables: &[Box<dyn Measurable>], _width: f32) -> f32 {
        0.0
    }

    fn max_intrinsic_height(&self, _measurables: &[Box<dyn Measurable>], _width: f32) -> f32 {
        0.0
    }
}

#[cfg(test)]
#[path = "tests/policy_tests.rs"]
mod tests;
