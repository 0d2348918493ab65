//! Conversions between the layer model and [`PolyData`].
//!
//! Going to polydata, point clouds get one vertex cell per point, surface
//! faces become polygons and every feature column becomes a one-component
//! point array. Coming back, only one-component arrays are taken as
//! features; multi-component arrays such as colors or normals are dropped.

use tracing::{debug, warn};

use crate::core::{
    stack, unstack, Coordinates, FeatureTable, Frame, Geometry, Layer, LayerData, LayerMetadata,
    StackedFrame,
};
use crate::geom::{DataArray, PolyData};
use crate::util::{DVec3, Result};

/// Convert a frame into the engine object.
pub fn frame_to_polydata(frame: &Frame) -> Result<PolyData> {
    let mut pd = PolyData::new(frame.positions().to_vec());
    match frame.geometry() {
        Geometry::Points(_) => pd.set_point_cells(),
        Geometry::Surface { faces, .. } => {
            pd.polys = faces.iter().map(|f| f.to_vec()).collect();
        }
    }
    for (name, values) in frame.features().columns() {
        pd.add_point_array(DataArray::scalar(name, values.to_vec()))?;
    }
    Ok(pd)
}

/// Convert the engine object into a frame.
///
/// Datasets with polygon or line cells are surfaces, everything else is a
/// point cloud. Polygons with more than three corners are fan triangulated;
/// line cells carry no faces.
pub fn polydata_to_frame(pd: &PolyData) -> Result<Frame> {
    pd.validate()?;

    let geometry = if pd.has_topology() {
        let mut faces = Vec::with_capacity(pd.polys.len());
        for poly in &pd.polys {
            if poly.len() < 3 {
                warn!("skipping degenerate polygon with {} corners", poly.len());
                continue;
            }
            for i in 1..poly.len() - 1 {
                faces.push([poly[0], poly[i], poly[i + 1]]);
            }
        }
        Geometry::Surface {
            vertices: pd.points.clone(),
            faces,
        }
    } else {
        Geometry::Points(pd.points.clone())
    };

    let mut features = FeatureTable::new(pd.num_points());
    for array in pd.point_data() {
        if array.is_scalar() {
            features.insert(array.name(), array.values().to_vec())?;
        } else {
            debug!(
                "dropping array '{}' with {} components",
                array.name(),
                array.num_components()
            );
        }
    }
    Frame::new(geometry, features)
}

/// Split a layer into frames: one frame for 3D data, one per time index for
/// 4D data.
pub fn layer_to_frames(layer: &Layer) -> Result<Vec<Frame>> {
    if layer.is_4d() {
        let stacked = StackedFrame::new(layer.data().clone(), layer.features().clone())?;
        return unstack(&stacked);
    }
    let positions = layer.data().coordinates().positions();
    let geometry = match layer.data() {
        LayerData::Points(_) => Geometry::Points(positions),
        LayerData::Surface { faces, .. } => Geometry::Surface {
            vertices: positions,
            faces: faces.clone(),
        },
    };
    Ok(vec![Frame::new(geometry, layer.features().clone())?])
}

/// Join frames into one layer: a single frame stays 3D, several frames are
/// stacked into 4D data.
pub fn frames_to_layer(frames: Vec<Frame>, metadata: LayerMetadata) -> Result<Layer> {
    let (data, features) = match <[Frame; 1]>::try_from(frames) {
        Ok([frame]) => {
            let (geometry, features) = frame.into_parts();
            let data = match geometry {
                Geometry::Points(p) => LayerData::Points(Coordinates::from_points(&p)),
                Geometry::Surface { vertices, faces } => LayerData::Surface {
                    vertices: Coordinates::from_points(&vertices),
                    faces,
                },
            };
            (data, features)
        }
        Err(frames) => stack(&frames)?.into_parts(),
    };
    Layer::new(data, LayerMetadata { features, ..metadata })
}

/// Viewer vectors (start, end pairs) as two-point line cells.
pub fn vectors_to_polydata(vectors: &[[DVec3; 2]]) -> PolyData {
    let mut pd = PolyData::new(vectors.iter().flatten().copied().collect());
    pd.lines = (0..vectors.len() as u32)
        .map(|i| vec![2 * i, 2 * i + 1])
        .collect();
    pd
}

/// Line cells as viewer vectors. Polylines are split into their segments.
pub fn polydata_to_vectors(pd: &PolyData) -> Result<Vec<[DVec3; 2]>> {
    pd.validate()?;
    Ok(pd
        .lines
        .iter()
        .flat_map(|line| line.windows(2))
        .map(|seg| [pd.points[seg[0] as usize], pd.points[seg[1] as usize]])
        .collect())
}
