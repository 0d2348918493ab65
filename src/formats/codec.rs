//! Single-frame read and write.

use std::path::Path;

use tracing::debug;

use super::{read_polydata, write_polydata};
use crate::config::Config;
use crate::core::Frame;
use crate::geom::{frame_to_polydata, polydata_to_frame};
use crate::util::Result;

/// Read one mesh file as a frame.
///
/// Point arrays with a single component become feature columns. Files with
/// polygon or line cells become surfaces, anything else a point cloud.
pub fn read_frame(path: impl AsRef<Path>) -> Result<Frame> {
    let path = path.as_ref();
    let pd = read_polydata(path)?;
    let frame = polydata_to_frame(&pd)?;
    debug!(
        "{}: {} {} rows, {} faces, {} features",
        path.display(),
        frame.kind(),
        frame.num_rows(),
        frame.faces().len(),
        frame.features().len()
    );
    Ok(frame)
}

/// Write one frame with default settings.
pub fn write_frame(path: impl AsRef<Path>, frame: &Frame) -> Result<()> {
    write_frame_with(path, frame, &Config::default())
}

/// Write one frame. Every feature column is stored as a per-point array
/// where the format allows it.
pub fn write_frame_with(path: impl AsRef<Path>, frame: &Frame, config: &Config) -> Result<()> {
    let pd = frame_to_polydata(frame)?;
    write_polydata(path, &pd, config)
}
