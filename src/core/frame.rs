//! Single-timepoint geometry.

use crate::core::{FeatureTable, LayerKind};
use crate::util::{BBox3d, DVec3, Error, Result};

/// Geometry of one frame: a point cloud or a triangle surface.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Points(Vec<DVec3>),
    Surface {
        vertices: Vec<DVec3>,
        faces: Vec<[u32; 3]>,
    },
}

impl Geometry {
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Points(_) => LayerKind::Points,
            Self::Surface { .. } => LayerKind::Surface,
        }
    }

    /// Points, or surface vertices.
    pub fn positions(&self) -> &[DVec3] {
        match self {
            Self::Points(p) => p,
            Self::Surface { vertices, .. } => vertices,
        }
    }

    /// Surface faces; empty for points.
    pub fn faces(&self) -> &[[u32; 3]] {
        match self {
            Self::Points(_) => &[],
            Self::Surface { faces, .. } => faces,
        }
    }

    /// Number of points or vertices.
    pub fn num_rows(&self) -> usize {
        self.positions().len()
    }
}

/// One timepoint: geometry plus a feature table with one row per point or
/// vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    geometry: Geometry,
    features: FeatureTable,
}

impl Frame {
    /// Create a frame. Fails if a face references a missing vertex or the
    /// feature table's row count differs from the geometry's.
    pub fn new(geometry: Geometry, features: FeatureTable) -> Result<Self> {
        let n = geometry.num_rows();
        if let Some(face) = geometry
            .faces()
            .iter()
            .find(|f| f.iter().any(|&i| i as usize >= n))
        {
            return Err(Error::invalid(format!(
                "face {:?} references a vertex outside 0..{}",
                face, n
            )));
        }
        let features = features.bind_rows(n)?;
        Ok(Self { geometry, features })
    }

    /// Point cloud frame without features.
    pub fn points(points: Vec<DVec3>) -> Self {
        let rows = points.len();
        Self {
            geometry: Geometry::Points(points),
            features: FeatureTable::new(rows),
        }
    }

    /// Surface frame without features.
    pub fn surface(vertices: Vec<DVec3>, faces: Vec<[u32; 3]>) -> Result<Self> {
        Self::new(Geometry::Surface { vertices, faces }, FeatureTable::default())
    }

    /// Replace the feature table.
    pub fn with_features(self, features: FeatureTable) -> Result<Self> {
        Self::new(self.geometry, features)
    }

    pub fn kind(&self) -> LayerKind {
        self.geometry.kind()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn positions(&self) -> &[DVec3] {
        self.geometry.positions()
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        self.geometry.faces()
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    /// Mutable access to the features. The table keeps its row count, so
    /// insertions stay checked against the geometry.
    pub fn features_mut(&mut self) -> &mut FeatureTable {
        &mut self.features
    }

    pub fn num_rows(&self) -> usize {
        self.geometry.num_rows()
    }

    pub fn bounds(&self) -> BBox3d {
        BBox3d::from_points(self.positions())
    }

    pub fn into_parts(self) -> (Geometry, FeatureTable) {
        (self.geometry, self.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Vec<DVec3> {
        vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_surface_frame() {
        let f = Frame::surface(quad(), vec![[0, 1, 2], [0, 2, 3]]).unwrap();
        assert_eq!(f.kind(), LayerKind::Surface);
        assert_eq!(f.num_rows(), 4);
        assert_eq!(f.faces().len(), 2);
        assert_eq!(f.features().num_rows(), 4);
        assert_eq!(f.bounds().max, DVec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_bad_face() {
        assert!(Frame::surface(quad(), vec![[0, 1, 4]]).is_err());
    }

    #[test]
    fn test_features_checked() {
        let mut f = Frame::points(quad());
        assert!(f.features_mut().insert("a", vec![1.0; 3]).is_err());
        f.features_mut().insert("a", vec![1.0; 4]).unwrap();

        let table = FeatureTable::from_columns([("b", vec![0.0; 2])]).unwrap();
        assert!(f.with_features(table).is_err());
    }
}
