//! Reading mesh files into layers.
//!
//! Input is a single file, a list of files or a directory. Several files are
//! ordered by the integer value of their stems and stacked into one 4D
//! layer; a single file becomes a 3D layer.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{Layer, LayerKind, LayerMetadata};
use crate::formats::{format_of, read_frame, FileFormat};
use crate::geom::frames_to_layer;
use crate::util::{Error, Result};

/// What a reader is asked to open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadInput {
    /// A mesh file or a directory of mesh files.
    Path(PathBuf),
    /// An explicit list of mesh files, one per frame.
    Paths(Vec<PathBuf>),
}

impl From<PathBuf> for ReadInput {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<&Path> for ReadInput {
    fn from(p: &Path) -> Self {
        Self::Path(p.to_path_buf())
    }
}

impl From<&str> for ReadInput {
    fn from(p: &str) -> Self {
        Self::Path(PathBuf::from(p))
    }
}

impl From<Vec<PathBuf>> for ReadInput {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self::Paths(paths)
    }
}

impl From<&[PathBuf]> for ReadInput {
    fn from(paths: &[PathBuf]) -> Self {
        Self::Paths(paths.to_vec())
    }
}

impl ReadInput {
    /// Expand into an ordered list of mesh files.
    ///
    /// Directories contribute their files with a supported extension, other
    /// entries are skipped. An explicitly named file with an unknown
    /// extension is an error.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = match self {
            Self::Path(p) if p.is_dir() => list_dir(p)?,
            Self::Path(p) => {
                format_of(p)?;
                vec![p.clone()]
            }
            Self::Paths(paths) => {
                for p in paths {
                    format_of(p)?;
                }
                paths.clone()
            }
        };
        if files.is_empty() {
            return Err(Error::EmptyInput);
        }
        sort_by_stem(&mut files);
        Ok(files)
    }

    /// Name for the loaded layer: the file stem for one file, otherwise the
    /// name of the containing directory.
    fn layer_name(&self, files: &[PathBuf]) -> Option<String> {
        let dir = match self {
            Self::Path(p) if p.is_dir() => p.as_path(),
            _ if files.len() == 1 => return file_stem(&files[0]).map(str::to_string),
            _ => files.first()?.parent()?,
        };
        dir.file_name().and_then(|n| n.to_str()).map(str::to_string)
    }
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && FileFormat::from_path(&path).is_some() {
            files.push(path);
        } else {
            debug!("skipping {}", path.display());
        }
    }
    Ok(files)
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// Sort files by the integer value of their stems, so `10.vtp` follows
/// `9.vtp` whatever the zero padding. Stems that are not integers sort
/// after all numbered files, by name.
pub fn sort_by_stem(files: &mut [PathBuf]) {
    let key = |p: &PathBuf| {
        let stem = file_stem(p).unwrap_or_default();
        (stem.parse::<u64>().ok(), stem.to_string())
    };
    let unnumbered = files.iter().filter(|p| key(p).0.is_none()).count();
    if unnumbered > 0 {
        warn!("{} file(s) without an integer stem sorted last", unnumbered);
    }
    files.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        match (ka.0, kb.0) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| ka.1.cmp(&kb.1)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => ka.1.cmp(&kb.1),
        }
    });
}

/// The two readers a path can be dispatched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderKind {
    Points,
    Surfaces,
}

impl ReaderKind {
    /// Layer kind this reader produces.
    pub fn layer_kind(self) -> LayerKind {
        match self {
            Self::Points => LayerKind::Points,
            Self::Surfaces => LayerKind::Surface,
        }
    }

    fn from_layer_kind(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Points => Self::Points,
            LayerKind::Surface => Self::Surfaces,
        }
    }

    /// Load `input` and check that it holds this reader's kind of data.
    pub fn read(self, input: &ReadInput, config: &Config) -> Result<Layer> {
        let layer = load_with(input, config)?;
        let expected = self.layer_kind();
        if layer.kind() != expected {
            return Err(Error::KindMismatch {
                expected: expected.as_str(),
                actual: layer.kind().as_str(),
            });
        }
        Ok(layer)
    }
}

/// Pick a reader for `input`, or `None` when it cannot be read.
///
/// The first file (after sorting) is read to decide between points and
/// surfaces. Nothing is reported as an error.
pub fn detect(input: &ReadInput) -> Option<ReaderKind> {
    let files = match input.files() {
        Ok(files) => files,
        Err(e) => {
            debug!("no reader: {}", e);
            return None;
        }
    };
    match read_frame(&files[0]) {
        Ok(frame) => Some(ReaderKind::from_layer_kind(frame.kind())),
        Err(e) => {
            debug!("no reader for {}: {}", files[0].display(), e);
            None
        }
    }
}

/// Load `input` as one layer with default settings.
pub fn load(input: impl Into<ReadInput>) -> Result<Layer> {
    load_with(&input.into(), &Config::default())
}

/// Load `input` as one layer.
///
/// One file gives a 3D layer. Several files are read in stem order and
/// stacked into a 4D layer whose first coordinate column is the frame
/// ordinal.
pub fn load_with(input: &ReadInput, config: &Config) -> Result<Layer> {
    let files = input.files()?;
    let frames = files
        .iter()
        .map(read_frame)
        .collect::<Result<Vec<_>>>()?;

    let kind = frames[0].kind();
    let mut metadata = LayerMetadata {
        name: input.layer_name(&files),
        ..Default::default()
    };
    if kind == LayerKind::Points {
        metadata.point_size = Some(config.point_size);
    }

    let mut layer = frames_to_layer(frames, metadata)?;
    if config.color_by_first_feature {
        let first = layer.features().first_name().map(str::to_string);
        layer.set_color_by(first)?;
    }

    info!(
        "loaded {} {} frame(s) as {} layer with {} rows",
        files.len(),
        kind,
        if layer.is_4d() { "4D" } else { "3D" },
        layer.data().num_rows()
    );
    Ok(layer)
}
