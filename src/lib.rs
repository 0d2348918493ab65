//! # layerbridge
//!
//! Moves point clouds and triangle surfaces between a layer-based viewer
//! model and mesh files (OBJ, PLY, STL, legacy VTK and VTP).
//!
//! A single file loads as a 3D layer. A sequence of files, one per
//! timepoint, loads as one 4D layer whose first coordinate column is the
//! time index, and is written back as a directory of numbered frame files.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math and binary scalar types
//! - [`core`] - Feature tables, frames, layers and stack/unstack
//! - [`geom`] - Mesh-engine polydata and the adapter to and from frames
//! - [`formats`] - File format codecs and single-frame read/write
//! - [`config`] - Reader and writer settings
//! - [`plugin`] - Reader dispatch, loading and writing of layers
//!
//! ## Example
//!
//! ```ignore
//! use layerbridge::prelude::*;
//!
//! // Directory of 000.vtp, 001.vtp, ... -> one 4D layer
//! let layer = load("tracks")?;
//! assert!(layer.is_4d());
//!
//! // And back out as tracks_out/000.ply, tracks_out/001.ply, ...
//! let written = write("tracks_out.ply", &layer)?;
//! ```

pub mod util;
pub mod core;
pub mod geom;
pub mod formats;
pub mod config;
pub mod plugin;

// Re-export commonly used types
pub use util::{Error, Result};
pub use config::Config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::config::Config;
    pub use crate::core::{
        stack, unstack, Coordinates, FeatureTable, Frame, Geometry, Layer, LayerData, LayerKind,
        LayerMetadata, StackedFrame,
    };
    pub use crate::formats::{read_frame, write_frame, write_frame_with, FileFormat};
    pub use crate::plugin::{
        detect, load, load_with, write, write_points, write_surfaces, write_with, ReadInput,
        ReaderKind,
    };
}

/// Build date and time stamped by the build script.
pub fn build_info() -> (&'static str, &'static str) {
    (
        option_env!("LAYERBRIDGE_BUILD_DATE").unwrap_or("unknown"),
        option_env!("LAYERBRIDGE_BUILD_TIME").unwrap_or("unknown"),
    )
}
