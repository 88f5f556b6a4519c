//! Layout contracts & constraint types for caliper

mod constraints;
mod core;
mod geometry;

pub use constraints::*;
pub use core::*;
pub use geometry::*;

pub mod prelude {
    pub use crate::constraints::Constraints;
    pub use crate::core::{Measurable, MeasurePolicy, MeasureResult, Placeable, Placement};
    pub use crate::geometry::{Point, Size};
}
