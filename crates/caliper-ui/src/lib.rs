//! Measure and placement engine for caliper layout trees.
//!
//! Measurement and placement are decoupled: measuring a node yields a size
//! the parent can read immediately, while placement is a separate, optional
//! step. A parent's policy may measure a child purely to derive its own size
//! and never place it; the child's size stays valid and later re-measures of
//! the child still propagate through the unplaced parent.
//!
//! The [`MeasureAndLayoutDelegate`] owns the tree and batches invalidations:
//! [`MeasureAndLayoutDelegate::request_remeasure`] marks dirty flags,
//! [`MeasureAndLayoutDelegate::measure_and_layout`] resolves them in one
//! synchronous pass.

mod delegate;
mod measure;
mod node;
pub mod policies;

pub use delegate::MeasureAndLayoutDelegate;
pub use node::LayoutNode;

pub use caliper_core::{NodeError, NodeId};
pub use caliper_ui_layout::{
    Constraints, Measurable, MeasurePolicy, MeasureResult, Placeable, Placement, Point, Size,
};
