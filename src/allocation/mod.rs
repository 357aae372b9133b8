//! Allocation of historical warehouse shares onto projected totals

mod engine;
mod reconcile;

pub use engine::{
    allocate, to_projection_table, to_share_table, Allocation, AllocationMode, MissingEntry,
    ProjectionTable, ShapeMismatchPolicy, ShareTable,
};
pub use reconcile::{distinct_pairs, exclude_mismatched, reconcile};
