//! Layout constraints system

/// Constraints used during layout measurement.
///
/// Bounds are inclusive and `min <= max` must hold for each axis. A range
/// with `min > max` is a caller contract violation and trips an assertion in
/// every constructor; constraints are never silently normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constraints {
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
}

impl Constraints {
    /// Creates constraints from explicit bounds.
    pub fn new(min_width: f32, max_width: f32, min_height: f32, max_height: f32) -> Self {
        let constraints = Self {
            min_width,
            max_width,
            min_height,
            max_height,
        };
        constraints.assert_valid();
        constraints
    }

    /// Creates constraints with exact width and height.
    pub fn tight(width: f32, height: f32) -> Self {
        Self::new(width, width, height, height)
    }

    /// Creates constraints with loose bounds (min = 0, max = given values).
    pub fn loose(max_width: f32, max_height: f32) -> Self {
        Self::new(0.0, max_width, 0.0, max_height)
    }

    /// Creates fully unbounded constraints.
    pub fn unbounded() -> Self {
        Self::new(0.0, f32::INFINITY, 0.0, f32::INFINITY)
    }

    /// Returns true if these constraints have a single size that satisfies them.
    pub fn is_tight(&self) -> bool {
        self.min_width == self.max_width && self.min_height == self.max_height
    }

    /// Returns true if all bounds are finite.
    pub fn is_bounded(&self) -> bool {
        self.max_width.is_finite() && self.max_height.is_finite()
    }

    /// Returns true if the width is bounded (max_width is finite).
    #[inline]
    pub fn has_bounded_width(&self) -> bool {
        self.max_width.is_finite()
    }

    /// Returns true if the height is bounded (max_height is finite).
    #[inline]
    pub fn has_bounded_height(&self) -> bool {
        self.max_height.is_finite()
    }

    /// Returns true if both ranges are well formed (`min <= max`, minimums
    /// non-negative).
    pub fn is_valid(&self) -> bool {
        self.min_width >= 0.0
            && self.min_height >= 0.0
            && self.min_width <= self.max_width
            && self.min_height <= self.max_height
    }

    /// Panics if the constraint ranges are malformed.
    #[track_caller]
    pub fn assert_valid(&self) {
        assert!(
            self.is_valid(),
            "malformed constraints: width [{}, {}], height [{}, {}]",
            self.min_width,
            self.max_width,
            self.min_height,
            self.max_height
        );
    }

    /// Constrains the provided width and height to fit within these constraints.
    pub fn constrain(&self, width: f32, height: f32) -> (f32, f32) {
        (
            width.clamp(self.min_width, self.max_width),
            height.clamp(self.min_height, self.max_height),
        )
    }

    /// Creates new constraints with loosened minimums (min = 0).
    pub fn loosen(self) -> Self {
        Self {
            min_width: 0.0,
            min_height: 0.0,
            ..self
        }
    }
}

#[cfg(test)]
#[path = "tests/constraints_tests.rs"]
mod tests;
