//! Viewer-facing entry points: reader dispatch and loading, and writing
//! layers back to disk.
//!
//! - [`detect`] - Choose the points or surfaces reader for an input
//! - [`load`] / [`load_with`] - Read files into one 3D or 4D [`Layer`](crate::core::Layer)
//! - [`write`] / [`write_with`] - One file for 3D layers, a numbered directory for 4D

mod reader;
mod writer;

pub use reader::*;
pub use writer::*;
