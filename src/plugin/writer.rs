//! Writing layers to mesh files.
//!
//! A 3D layer is written to the given path. A 4D layer is split by time
//! index and each frame goes to its own numbered file in a directory named
//! after the path's stem:
//!
//! ```text
//! out/cells.vtp  ->  out/cells/000.vtp, out/cells/001.vtp, ...
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::Config;
use crate::core::{Layer, LayerKind};
use crate::formats::{format_of, write_frame_with};
use crate::geom::layer_to_frames;
use crate::util::{Error, Result};

/// Write a layer with default settings. Returns the written paths in frame
/// order.
pub fn write(path: impl AsRef<Path>, layer: &Layer) -> Result<Vec<PathBuf>> {
    write_with(path, layer, &Config::default())
}

/// Write a layer. Returns the written paths in frame order.
///
/// Existing files are overwritten. Frames left over from an earlier, longer
/// write to the same directory are not removed.
pub fn write_with(path: impl AsRef<Path>, layer: &Layer, config: &Config) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let format = format_of(path)?;
    if layer.kind() == LayerKind::Points && !format.supports_points() {
        return Err(Error::UnsupportedFormat(format!(
            "{} cannot store points",
            format
        )));
    }

    let frames = layer_to_frames(layer)?;
    if frames.len() <= 1 {
        let frame = frames.first().ok_or(Error::EmptyInput)?;
        write_frame_with(path, frame, config)?;
        info!("wrote {} {} rows to {}", layer.kind(), frame.num_rows(), path.display());
        return Ok(vec![path.to_path_buf()]);
    }

    let dir = stack_dir(path)?;
    std::fs::create_dir_all(&dir)?;
    let mut written = Vec::with_capacity(frames.len());
    for (i, frame) in frames.iter().enumerate() {
        let file = dir.join(frame_file_name(i, format.extension(), config.frame_digits));
        write_frame_with(&file, frame, config)?;
        debug!("frame {} -> {}", i, file.display());
        written.push(file);
    }
    info!(
        "wrote {} {} frames to {}",
        written.len(),
        layer.kind(),
        dir.display()
    );
    Ok(written)
}

/// Write a points layer; surfaces are rejected.
pub fn write_points(path: impl AsRef<Path>, layer: &Layer, config: &Config) -> Result<Vec<PathBuf>> {
    expect_kind(layer, LayerKind::Points)?;
    write_with(path, layer, config)
}

/// Write a surface layer; points are rejected.
pub fn write_surfaces(path: impl AsRef<Path>, layer: &Layer, config: &Config) -> Result<Vec<PathBuf>> {
    expect_kind(layer, LayerKind::Surface)?;
    write_with(path, layer, config)
}

fn expect_kind(layer: &Layer, expected: LayerKind) -> Result<()> {
    if layer.kind() != expected {
        return Err(Error::KindMismatch {
            expected: expected.as_str(),
            actual: layer.kind().as_str(),
        });
    }
    Ok(())
}

/// `parent/stem` for `parent/stem.ext`.
fn stack_dir(path: &Path) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
    Ok(path.parent().unwrap_or(Path::new("")).join(stem))
}

/// Zero padded frame file name, e.g. `007.vtp`. Ordinals wider than
/// `digits` are written in full.
pub fn frame_file_name(index: usize, extension: &str, digits: usize) -> String {
    format!("{:0width$}.{}", index, extension, width = digits)
}
