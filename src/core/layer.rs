//! Viewer-side layer model.
//!
//! A layer is exchanged with the viewer as a `(data, metadata, kind)` triple.
//! [`Layer`] keeps the three together and checks that they agree: the data
//! variant matches the kind, faces index existing vertices, and the feature
//! table has one row per vertex or point.

use std::fmt;
use std::str::FromStr;

use crate::core::FeatureTable;
use crate::util::{DVec3, Error, Result};

/// The two layer kinds this crate exchanges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Points,
    Surface,
}

impl LayerKind {
    /// Kind string used at the viewer boundary.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Surface => "surface",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "points" => Ok(Self::Points),
            "surface" => Ok(Self::Surface),
            other => Err(Error::InvalidKind(other.to_string())),
        }
    }
}

/// Row-major coordinate matrix with 3 (`x y z`) or 4 (`t x y z`) columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Coordinates {
    ndim: usize,
    values: Vec<f64>,
}

impl Coordinates {
    /// Wrap a flat row-major buffer. `ndim` must be 3 or 4 and divide the
    /// buffer length.
    pub fn new(ndim: usize, values: Vec<f64>) -> Result<Self> {
        if ndim != 3 && ndim != 4 {
            return Err(Error::invalid(format!(
                "coordinates must have 3 or 4 columns, got {}",
                ndim
            )));
        }
        if values.len() % ndim != 0 {
            return Err(Error::invalid(format!(
                "{} values do not form rows of {}",
                values.len(),
                ndim
            )));
        }
        Ok(Self { ndim, values })
    }

    /// 3-column coordinates from positions.
    pub fn from_points(points: &[DVec3]) -> Self {
        Self {
            ndim: 3,
            values: points.iter().flat_map(|p| p.to_array()).collect(),
        }
    }

    /// 4-column coordinates from `[t, x, y, z]` rows.
    pub fn from_rows4(rows: impl IntoIterator<Item = [f64; 4]>) -> Self {
        Self {
            ndim: 4,
            values: rows.into_iter().flatten().collect(),
        }
    }

    /// Number of columns (3 or 4).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim.max(3)
    }

    /// True when the first column is a time index.
    #[inline]
    pub fn is_4d(&self) -> bool {
        self.ndim() == 4
    }

    pub fn num_rows(&self) -> usize {
        self.values.len() / self.ndim()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.ndim();
        &self.values[i * n..(i + 1) * n]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.values.chunks_exact(self.ndim())
    }

    /// Flat row-major values.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Spatial part of every row (the last three columns).
    pub fn positions(&self) -> Vec<DVec3> {
        let skip = self.ndim() - 3;
        self.rows()
            .map(|r| DVec3::new(r[skip], r[skip + 1], r[skip + 2]))
            .collect()
    }

    /// Time column of a 4-column matrix, `None` for 3 columns.
    pub fn time_column(&self) -> Option<Vec<f64>> {
        self.is_4d().then(|| self.rows().map(|r| r[0]).collect())
    }
}

/// Geometry payload of a layer.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerData {
    /// Point cloud.
    Points(Coordinates),
    /// Triangle surface. Faces index rows of `vertices`.
    Surface {
        vertices: Coordinates,
        faces: Vec<[u32; 3]>,
    },
}

impl LayerData {
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Points(_) => LayerKind::Points,
            Self::Surface { .. } => LayerKind::Surface,
        }
    }

    /// Point coordinates, or vertex coordinates for surfaces.
    pub fn coordinates(&self) -> &Coordinates {
        match self {
            Self::Points(c) => c,
            Self::Surface { vertices, .. } => vertices,
        }
    }

    /// Faces of a surface; empty for points.
    pub fn faces(&self) -> &[[u32; 3]] {
        match self {
            Self::Points(_) => &[],
            Self::Surface { faces, .. } => faces,
        }
    }

    /// Number of points or vertices.
    pub fn num_rows(&self) -> usize {
        self.coordinates().num_rows()
    }

    /// True when coordinate rows carry a leading time column.
    pub fn is_4d(&self) -> bool {
        self.coordinates().is_4d()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let n = self.num_rows();
        if let Some(face) = self.faces().iter().find(|f| f.iter().any(|&i| i as usize >= n)) {
            return Err(Error::invalid(format!(
                "face {:?} references a vertex outside 0..{}",
                face, n
            )));
        }
        Ok(())
    }
}

/// Metadata mapping that travels with a layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerMetadata {
    /// Display name.
    pub name: Option<String>,
    /// Per-vertex / per-point features.
    pub features: FeatureTable,
    /// Feature used as the default coloring attribute.
    pub color_by: Option<String>,
    /// Point size hint for point layers.
    pub point_size: Option<f64>,
}

impl LayerMetadata {
    pub fn with_features(features: FeatureTable) -> Self {
        Self {
            features,
            ..Default::default()
        }
    }
}

/// A viewer layer: data, metadata and kind.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    data: LayerData,
    metadata: LayerMetadata,
}

impl Layer {
    /// Create a layer, checking face ranges and feature row counts.
    pub fn new(data: LayerData, metadata: LayerMetadata) -> Result<Self> {
        data.validate()?;
        let LayerMetadata {
            name,
            features,
            color_by,
            point_size,
        } = metadata;
        let features = features.bind_rows(data.num_rows())?;
        Ok(Self {
            data,
            metadata: LayerMetadata {
                name,
                features,
                color_by,
                point_size,
            },
        })
    }

    /// Point layer without metadata.
    pub fn points(coords: Coordinates) -> Self {
        let rows = coords.num_rows();
        Self {
            data: LayerData::Points(coords),
            metadata: LayerMetadata::with_features(FeatureTable::new(rows)),
        }
    }

    /// Surface layer without metadata.
    pub fn surface(vertices: Coordinates, faces: Vec<[u32; 3]>) -> Result<Self> {
        Self::new(LayerData::Surface { vertices, faces }, LayerMetadata::default())
    }

    /// Build a layer from the viewer's tuple form. The kind string must match
    /// the data variant.
    pub fn from_tuple(data: LayerData, metadata: LayerMetadata, kind: &str) -> Result<Self> {
        let kind: LayerKind = kind.parse()?;
        if kind != data.kind() {
            return Err(Error::KindMismatch {
                expected: kind.as_str(),
                actual: data.kind().as_str(),
            });
        }
        Self::new(data, metadata)
    }

    /// Split into the viewer's tuple form.
    pub fn into_tuple(self) -> (LayerData, LayerMetadata, &'static str) {
        let kind = self.kind().as_str();
        (self.data, self.metadata, kind)
    }

    pub fn kind(&self) -> LayerKind {
        self.data.kind()
    }

    pub fn data(&self) -> &LayerData {
        &self.data
    }

    pub fn metadata(&self) -> &LayerMetadata {
        &self.metadata
    }

    pub fn features(&self) -> &FeatureTable {
        &self.metadata.features
    }

    /// Replace the feature table, checking its row count.
    pub fn set_features(&mut self, features: FeatureTable) -> Result<()> {
        self.metadata.features = features.bind_rows(self.data.num_rows())?;
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.metadata.name = Some(name.into());
    }

    /// Set the coloring feature. Unknown feature names are rejected.
    pub fn set_color_by(&mut self, name: Option<String>) -> Result<()> {
        if let Some(n) = &name {
            if !self.metadata.features.contains(n) {
                return Err(Error::invalid(format!("no feature named '{}'", n)));
            }
        }
        self.metadata.color_by = name;
        Ok(())
    }

    pub fn is_4d(&self) -> bool {
        self.data.is_4d()
    }
}
