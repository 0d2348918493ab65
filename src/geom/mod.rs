//! Mesh-engine side: the polydata object and its conversions to and from
//! the layer model.

mod adapter;
mod polydata;

pub use adapter::*;
pub use polydata::*;
