//! Core data model: feature tables, frames, layers and frame stacking.
//!
//! - [`FeatureTable`] - Checked per-row feature columns
//! - [`Frame`] / [`Geometry`] - One timepoint of points or a surface
//! - [`Layer`] / [`LayerData`] / [`LayerKind`] - Viewer-side unit of exchange
//! - [`stack`] / [`unstack`] - 4D time-indexed representation

mod features;
mod frame;
mod layer;
mod stack;

pub use features::*;
pub use frame::*;
pub use layer::*;
pub use stack::*;
