//! Mesh file formats.
//!
//! Each format module parses a file into a [`PolyData`] and serializes a
//! [`PolyData`] back out. What survives a round trip depends on the format:
//!
//! | Format | Points | Surfaces | Per-point arrays |
//! |--------|--------|----------|------------------|
//! | VTP    | yes    | yes      | yes              |
//! | VTK    | yes    | yes      | yes              |
//! | PLY    | yes    | yes      | yes              |
//! | OBJ    | yes    | yes      | no               |
//! | STL    | no     | yes      | no               |
//!
//! [`read_frame`] and [`write_frame`] sit on top and convert through the
//! adapter in [`crate::geom`].

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::geom::PolyData;
use crate::util::{Error, Result};

mod codec;
pub mod obj;
pub mod ply;
pub mod stl;
mod text;
mod vtk_model;
pub mod vtk;
pub mod vtp;

pub use codec::*;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Vtp,
    Vtk,
    Obj,
    Ply,
    Stl,
}

impl FileFormat {
    /// All formats, in the order readers try them when listing directories.
    pub const ALL: [FileFormat; 5] = [Self::Vtp, Self::Vtk, Self::Obj, Self::Ply, Self::Stl];

    /// Parse a file extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "vtp" => Some(Self::Vtp),
            "vtk" => Some(Self::Vtk),
            "obj" => Some(Self::Obj),
            "ply" => Some(Self::Ply),
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    /// Detect format from the extension of `path`.
    ///
    /// Returns `None` if the path has no extension, the extension is not
    /// valid UTF-8, or it is not a known format.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Lowercase file extension.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Vtp => "vtp",
            Self::Vtk => "vtk",
            Self::Obj => "obj",
            Self::Ply => "ply",
            Self::Stl => "stl",
        }
    }

    /// Human readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vtp => "VTP",
            Self::Vtk => "VTK",
            Self::Obj => "OBJ",
            Self::Ply => "PLY",
            Self::Stl => "STL",
        }
    }

    /// Whether the format can store a point cloud without faces.
    pub const fn supports_points(self) -> bool {
        !matches!(self, Self::Stl)
    }

    /// Whether the format stores named per-point arrays.
    pub const fn supports_point_data(self) -> bool {
        matches!(self, Self::Vtp | Self::Vtk | Self::Ply)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format of `path`, or [`Error::UnsupportedFormat`].
pub fn format_of(path: &Path) -> Result<FileFormat> {
    FileFormat::from_path(path)
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))
}

/// Read a mesh file into polydata, picking the parser from the extension.
pub fn read_polydata(path: impl AsRef<Path>) -> Result<PolyData> {
    let path = path.as_ref();
    let format = format_of(path)?;
    debug!("reading {} as {}", path.display(), format);

    let bytes = std::fs::read(path)?;
    let pd = match format {
        FileFormat::Vtp => vtp::parse(&bytes, path)?,
        FileFormat::Vtk => vtk::parse(&bytes, path)?,
        FileFormat::Obj => obj::parse(&bytes, path)?,
        FileFormat::Ply => ply::parse(&bytes, path)?,
        FileFormat::Stl => stl::parse(&bytes, path)?,
    };
    pd.validate()
        .map_err(|e| Error::format(path, format.name(), e.to_string()))?;
    Ok(pd)
}

/// Write polydata to `path` in the format given by its extension.
/// Overwrites the file if it already exists.
pub fn write_polydata(path: impl AsRef<Path>, pd: &PolyData, config: &Config) -> Result<()> {
    let path = path.as_ref();
    let format = format_of(path)?;
    if format == FileFormat::Stl && pd.polys.is_empty() {
        return Err(Error::UnsupportedFormat(format!(
            "{}: STL cannot store a point cloud",
            path.display()
        )));
    }
    debug!("writing {} points to {} as {}", pd.num_points(), path.display(), format);

    let mut w = BufWriter::new(File::create(path)?);
    match format {
        FileFormat::Vtp => vtp::write(&mut w, pd)?,
        FileFormat::Vtk => vtk::write(&mut w, pd)?,
        FileFormat::Obj => obj::write(&mut w, pd)?,
        FileFormat::Ply => ply::write(&mut w, pd, config.ply_encoding)?,
        FileFormat::Stl => stl::write(&mut w, pd)?,
    }
    w.flush()?;
    Ok(())
}
