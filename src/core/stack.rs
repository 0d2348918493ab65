//! Joining frames into one time-indexed frame and splitting it back.
//!
//! A stacked frame is the row-wise concatenation of its frames with a
//! leading time column holding each row's frame ordinal. Surface faces are
//! shifted by the vertex count of all earlier frames so they index the
//! concatenated vertex array.

use tracing::debug;

use crate::core::{Coordinates, FeatureTable, Frame, Geometry, LayerData, LayerKind};
use crate::util::{DVec3, Error, Result};

/// Allowed distance of a time value from the nearest integer.
const TIME_TOLERANCE: f64 = 1e-6;

/// Frames joined along rows, tagged with a time column.
#[derive(Clone, Debug, PartialEq)]
pub struct StackedFrame {
    data: LayerData,
    features: FeatureTable,
}

impl StackedFrame {
    /// Wrap 4-column layer data and its features.
    pub fn new(data: LayerData, features: FeatureTable) -> Result<Self> {
        if !data.is_4d() {
            return Err(Error::invalid(format!(
                "stacked data needs a time column, got {} columns",
                data.coordinates().ndim()
            )));
        }
        data.validate()?;
        let features = features.bind_rows(data.num_rows())?;
        Ok(Self { data, features })
    }

    pub fn kind(&self) -> LayerKind {
        self.data.kind()
    }

    pub fn data(&self) -> &LayerData {
        &self.data
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn num_rows(&self) -> usize {
        self.data.num_rows()
    }

    pub fn into_parts(self) -> (LayerData, FeatureTable) {
        (self.data, self.features)
    }
}

/// Join frames in order. Row `r` of frame `i` gets time index `i`.
///
/// Fails with [`Error::EmptyInput`] for no frames and
/// [`Error::KindMismatch`] when points and surfaces are mixed.
pub fn stack(frames: &[Frame]) -> Result<StackedFrame> {
    let first = frames.first().ok_or(Error::EmptyInput)?;
    let kind = first.kind();
    if let Some(other) = frames.iter().find(|f| f.kind() != kind) {
        return Err(Error::KindMismatch {
            expected: kind.as_str(),
            actual: other.kind().as_str(),
        });
    }

    let total: usize = frames.iter().map(Frame::num_rows).sum();
    let mut rows = Vec::with_capacity(total);
    let mut faces = Vec::new();
    let mut offset = 0u32;
    for (t, frame) in frames.iter().enumerate() {
        let t = t as f64;
        rows.extend(frame.positions().iter().map(|p| [t, p.x, p.y, p.z]));
        faces.extend(
            frame
                .faces()
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
        offset += frame.num_rows() as u32;
    }

    let coords = Coordinates::from_rows4(rows);
    let data = match kind {
        LayerKind::Points => LayerData::Points(coords),
        LayerKind::Surface => LayerData::Surface {
            vertices: coords,
            faces,
        },
    };
    let features = FeatureTable::concat(frames.iter().map(|f| (f.features(), f.num_rows())));

    debug!("stacked {} frames into {} rows", frames.len(), total);
    StackedFrame::new(data, features)
}

/// Split a stacked frame back into frames.
///
/// Rows are grouped by time index, keeping their relative order. There are
/// `max(time) + 1` frames; an index with no rows yields an empty frame.
/// Time indices must be below the row count.
pub fn unstack(stacked: &StackedFrame) -> Result<Vec<Frame>> {
    let coords = stacked.data.coordinates();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut frame_of = Vec::with_capacity(coords.num_rows());
    let mut local = Vec::with_capacity(coords.num_rows());

    for (r, row) in coords.rows().enumerate() {
        let t = time_index(row[0])?;
        if t >= coords.num_rows() {
            return Err(Error::InvalidTimeIndex(row[0]));
        }
        if groups.len() <= t {
            groups.resize_with(t + 1, Vec::new);
        }
        local.push(groups[t].len() as u32);
        frame_of.push(t);
        groups[t].push(r);
    }

    let mut frame_faces: Vec<Vec<[u32; 3]>> = vec![Vec::new(); groups.len()];
    for face in stacked.data.faces() {
        let t = frame_of[face[0] as usize];
        if face.iter().any(|&v| frame_of[v as usize] != t) {
            return Err(Error::invalid(format!(
                "face {:?} spans more than one time index",
                face
            )));
        }
        frame_faces[t].push(face.map(|v| local[v as usize]));
    }

    groups
        .iter()
        .zip(frame_faces)
        .map(|(rows, faces)| {
            let positions: Vec<DVec3> = rows
                .iter()
                .map(|&r| {
                    let row = coords.row(r);
                    DVec3::new(row[1], row[2], row[3])
                })
                .collect();
            let geometry = match stacked.kind() {
                LayerKind::Points => Geometry::Points(positions),
                LayerKind::Surface => Geometry::Surface {
                    vertices: positions,
                    faces,
                },
            };
            Frame::new(geometry, stacked.features.select_rows(rows))
        })
        .collect()
}

fn time_index(value: f64) -> Result<usize> {
    let rounded = value.round();
    if !value.is_finite() || rounded < 0.0 || (value - rounded).abs() > TIME_TOLERANCE {
        return Err(Error::InvalidTimeIndex(value));
    }
    Ok(rounded as usize)
}
