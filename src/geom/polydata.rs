//! Mesh-engine object: points, cells and named per-point arrays.
//!
//! [`PolyData`] is what the file parsers produce and the serializers consume.
//! It is deliberately looser than [`Frame`](crate::core::Frame): cells may be
//! polygons of any size, vertex and line cells are kept, and point arrays may
//! carry several components per point (colors, normals).

use crate::util::{BBox3d, DVec3, Error, Result};

/// Named per-point array with a fixed number of components per point.
#[derive(Clone, Debug, PartialEq)]
pub struct DataArray {
    name: String,
    components: usize,
    values: Vec<f64>,
}

impl DataArray {
    /// Create an array of `values.len() / components` tuples.
    pub fn new(name: impl Into<String>, components: usize, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if components == 0 || values.len() % components != 0 {
            return Err(Error::invalid(format!(
                "array '{}' has {} values, not a multiple of {} components",
                name,
                values.len(),
                components
            )));
        }
        Ok(Self {
            name,
            components,
            values,
        })
    }

    /// One-component array.
    pub fn scalar(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            components: 1,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_components(&self) -> usize {
        self.components
    }

    /// Number of tuples (points covered).
    pub fn num_tuples(&self) -> usize {
        self.values.len() / self.components
    }

    pub fn is_scalar(&self) -> bool {
        self.components == 1
    }

    /// Flat tuple-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Polygonal dataset: points plus vertex, line and polygon cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolyData {
    pub points: Vec<DVec3>,
    /// Vertex cells (usually one point each).
    pub verts: Vec<Vec<u32>>,
    /// Polyline cells.
    pub lines: Vec<Vec<u32>>,
    /// Polygon cells.
    pub polys: Vec<Vec<u32>>,
    point_data: Vec<DataArray>,
}

impl PolyData {
    pub fn new(points: Vec<DVec3>) -> Self {
        Self {
            points,
            ..Default::default()
        }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// True when the dataset has polygon or line cells.
    pub fn has_topology(&self) -> bool {
        !self.polys.is_empty() || !self.lines.is_empty()
    }

    /// One vertex cell per point.
    pub fn set_point_cells(&mut self) {
        self.verts = (0..self.points.len() as u32).map(|i| vec![i]).collect();
    }

    /// Attach a per-point array, replacing one with the same name.
    pub fn add_point_array(&mut self, array: DataArray) -> Result<()> {
        if array.num_tuples() != self.num_points() {
            return Err(Error::FeatureLength {
                name: array.name,
                expected: self.num_points(),
                actual: array.values.len() / array.components,
            });
        }
        match self.point_data.iter_mut().find(|a| a.name == array.name) {
            Some(slot) => *slot = array,
            None => self.point_data.push(array),
        }
        Ok(())
    }

    pub fn point_data(&self) -> &[DataArray] {
        &self.point_data
    }

    pub fn point_array(&self, name: &str) -> Option<&DataArray> {
        self.point_data.iter().find(|a| a.name == name)
    }

    /// Check that every cell references an existing point.
    pub fn validate(&self) -> Result<()> {
        let n = self.points.len();
        for cell in self.verts.iter().chain(&self.lines).chain(&self.polys) {
            if let Some(&i) = cell.iter().find(|&&i| i as usize >= n) {
                return Err(Error::invalid(format!(
                    "cell references point {} of {}",
                    i, n
                )));
            }
        }
        Ok(())
    }

    pub fn bounds(&self) -> BBox3d {
        BBox3d::from_points(&self.points)
    }
}
