//! Conversion between [`PolyData`] and the `vtkio` data model.
//!
//! Legacy `.vtk` and XML `.vtp` files share the same model in `vtkio`; they
//! differ in how cells are numbered and where multi-component arrays go.

use std::iter;

use tracing::{debug, warn};
use vtkio::model::{
    Attribute, Attributes, ByteOrder, DataSet, ElementType, FieldArray, IOBuffer, Piece,
    PolyDataPiece, Version, VertexNumbers, Vtk,
};

use crate::geom::{DataArray, PolyData};
use crate::util::DVec3;

pub(crate) type ParseResult<T> = std::result::Result<T, String>;

/// Cell numbering and array placement of the two VTK flavours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Layout {
    /// `count i0 i1 ...` cells; multi-component arrays as `FIELD` data.
    Legacy,
    /// Connectivity and offsets; every array is a point data array.
    Xml,
}

/// Build a `vtkio` file model. `name` maps array names to their on-disk form.
pub(crate) fn to_vtk(pd: &PolyData, layout: Layout, name: impl Fn(&str) -> String) -> Vtk {
    let mut point = Vec::new();
    let mut fields = Vec::new();
    for array in pd.point_data() {
        let data = IOBuffer::F64(array.values().to_vec());
        let n = array.num_components();
        match (n, layout) {
            (1, _) => point.push(Attribute::scalars(name(array.name()), 1).with_data(data)),
            (_, Layout::Xml) => {
                point.push(Attribute::generic(name(array.name()), n as u32).with_data(data))
            }
            (_, Layout::Legacy) => fields.push(FieldArray {
                name: name(array.name()),
                elem: n as u32,
                data,
            }),
        }
    }
    if !fields.is_empty() {
        point.push(Attribute::Field {
            name: "FieldData".to_string(),
            data_array: fields,
        });
    }

    let cells = |cells: &[Vec<u32>]| (!cells.is_empty()).then(|| vertex_numbers(cells, layout));
    let (version, byte_order) = match layout {
        Layout::Legacy => (Version { major: 4, minor: 2 }, ByteOrder::BigEndian),
        Layout::Xml => (Version { major: 1, minor: 0 }, ByteOrder::LittleEndian),
    };

    Vtk {
        version,
        title: "layerbridge".to_string(),
        byte_order,
        file_path: None,
        data: DataSet::inline(PolyDataPiece {
            points: IOBuffer::F64(pd.points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()),
            verts: cells(&pd.verts),
            lines: cells(&pd.lines),
            polys: cells(&pd.polys),
            strips: None,
            data: Attributes {
                point,
                cell: Vec::new(),
            },
        }),
    }
}

fn vertex_numbers(cells: &[Vec<u32>], layout: Layout) -> VertexNumbers {
    match layout {
        Layout::Legacy => VertexNumbers::Legacy {
            num_cells: cells.len() as u32,
            vertices: cells
                .iter()
                .flat_map(|c| iter::once(c.len() as u32).chain(c.iter().copied()))
                .collect(),
        },
        Layout::Xml => {
            let mut end = 0u64;
            let offsets = cells
                .iter()
                .map(|c| {
                    end += c.len() as u64;
                    end
                })
                .collect();
            VertexNumbers::XML {
                connectivity: cells.iter().flatten().map(|&i| i as u64).collect(),
                offsets,
            }
        }
    }
}

/// Turn the first polydata piece of a parsed file into [`PolyData`].
/// `name` maps on-disk array names back.
pub(crate) fn from_vtk(vtk: Vtk, name: impl Fn(&str) -> String) -> ParseResult<PolyData> {
    let pieces = match vtk.data {
        DataSet::PolyData { pieces, .. } => pieces,
        _ => return Err("dataset is not POLYDATA".into()),
    };
    if pieces.len() > 1 {
        debug!("reading the first of {} pieces", pieces.len());
    }
    let piece = match pieces.into_iter().next() {
        Some(Piece::Inline(piece)) => *piece,
        Some(_) => return Err("pieces stored in other files are not supported".into()),
        None => return Err("no polydata piece".into()),
    };

    let coords = piece
        .points
        .cast_into::<f64>()
        .ok_or("point coordinates are not numeric")?;
    if coords.len() % 3 != 0 {
        return Err(format!("{} point coordinates is not a multiple of 3", coords.len()));
    }
    let mut pd = PolyData::new(
        coords
            .chunks_exact(3)
            .map(|c| DVec3::new(c[0], c[1], c[2]))
            .collect(),
    );
    pd.verts = cells(piece.verts)?;
    pd.lines = cells(piece.lines)?;
    pd.polys = cells(piece.polys)?;
    for strip in cells(piece.strips)? {
        pd.polys.extend(strip_triangles(&strip));
    }

    for attribute in piece.data.point {
        match attribute {
            Attribute::DataArray(array) => {
                let components = components(&array.elem);
                add_array(&mut pd, name(&array.name), components, array.data);
            }
            Attribute::Field { data_array, .. } => {
                for array in data_array {
                    add_array(&mut pd, name(&array.name), array.elem as usize, array.data);
                }
            }
        }
    }
    if !piece.data.cell.is_empty() {
        debug!("dropping {} cell data arrays", piece.data.cell.len());
    }
    Ok(pd)
}

fn add_array(pd: &mut PolyData, name: String, components: usize, data: IOBuffer) {
    let Some(values) = data.cast_into::<f64>() else {
        warn!("skipping non-numeric array '{}'", name);
        return;
    };
    match DataArray::new(name.as_str(), components, values) {
        Ok(array) if array.num_tuples() == pd.num_points() => {
            if let Err(e) = pd.add_point_array(array) {
                warn!("skipping array '{}': {}", name, e);
            }
        }
        Ok(array) => warn!(
            "skipping array '{}' with {} tuples for {} points",
            name,
            array.num_tuples(),
            pd.num_points()
        ),
        Err(e) => warn!("skipping array '{}': {}", name, e),
    }
}

fn components(elem: &ElementType) -> usize {
    match elem {
        ElementType::Scalars { num_comp, .. } => *num_comp as usize,
        ElementType::ColorScalars(n) | ElementType::TCoords(n) | ElementType::Generic(n) => {
            *n as usize
        }
        ElementType::Vectors | ElementType::Normals => 3,
        ElementType::Tensors => 9,
        ElementType::LookupTable => 4,
    }
}

fn cells(numbers: Option<VertexNumbers>) -> ParseResult<Vec<Vec<u32>>> {
    let index = |i: u64| u32::try_from(i).map_err(|_| format!("cell index {} out of range", i));
    match numbers {
        None => Ok(Vec::new()),
        Some(VertexNumbers::Legacy { num_cells, vertices }) => {
            let mut cells = Vec::with_capacity((num_cells as usize).min(vertices.len()));
            let mut rest = vertices.as_slice();
            while let Some((&n, tail)) = rest.split_first() {
                let n = n as usize;
                if n > tail.len() {
                    return Err(format!("cell of {} points overruns the cell list", n));
                }
                cells.push(tail[..n].to_vec());
                rest = &tail[n..];
            }
            if cells.len() != num_cells as usize {
                return Err(format!("expected {} cells, found {}", num_cells, cells.len()));
            }
            Ok(cells)
        }
        Some(VertexNumbers::XML {
            connectivity,
            offsets,
        }) => {
            let mut cells = Vec::with_capacity(offsets.len());
            let mut start = 0usize;
            for end in offsets {
                let end = usize::try_from(end).unwrap_or(usize::MAX);
                if end < start || end > connectivity.len() {
                    return Err(format!("cell offset {} out of range", end));
                }
                cells.push(
                    connectivity[start..end]
                        .iter()
                        .map(|&i| index(i))
                        .collect::<ParseResult<Vec<u32>>>()?,
                );
                start = end;
            }
            Ok(cells)
        }
    }
}

/// Triangles of a strip, with alternating winding so all face the same way.
fn strip_triangles(strip: &[u32]) -> Vec<Vec<u32>> {
    strip
        .windows(3)
        .enumerate()
        .map(|(i, w)| {
            if i % 2 == 0 {
                vec![w[0], w[1], w[2]]
            } else {
                vec![w[1], w[0], w[2]]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_and_triangle() -> PolyData {
        let mut pd = PolyData::new(vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::Y,
            DVec3::Z,
        ]);
        pd.polys = vec![vec![0, 1, 2, 3], vec![0, 1, 4]];
        pd.add_point_array(DataArray::scalar("s", vec![0.0, 1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        pd.add_point_array(DataArray::new("v", 2, (0..10).map(f64::from).collect()).unwrap())
            .unwrap();
        pd
    }

    #[test]
    fn test_model_roundtrip_both_layouts() {
        let pd = quad_and_triangle();
        for layout in [Layout::Legacy, Layout::Xml] {
            let back = from_vtk(to_vtk(&pd, layout, str::to_string), str::to_string).unwrap();
            assert_eq!(back, pd, "{:?}", layout);
        }
    }

    #[test]
    fn test_legacy_cells_checked() {
        let overrun = VertexNumbers::Legacy {
            num_cells: 1,
            vertices: vec![4, 0, 1],
        };
        assert!(cells(Some(overrun)).is_err());
        let miscounted = VertexNumbers::Legacy {
            num_cells: 2,
            vertices: vec![3, 0, 1, 2],
        };
        assert!(cells(Some(miscounted)).is_err());
    }

    #[test]
    fn test_xml_offsets_checked() {
        let backwards = VertexNumbers::XML {
            connectivity: vec![0, 1, 2],
            offsets: vec![3, 1],
        };
        assert!(cells(Some(backwards)).is_err());
        let past_end = VertexNumbers::XML {
            connectivity: vec![0, 1, 2],
            offsets: vec![u64::MAX],
        };
        assert!(cells(Some(past_end)).is_err());
        let wide = VertexNumbers::XML {
            connectivity: vec![u64::from(u32::MAX) + 1],
            offsets: vec![1],
        };
        assert!(cells(Some(wide)).is_err());
    }

    #[test]
    fn test_strip_winding() {
        assert_eq!(
            strip_triangles(&[0, 1, 2, 3]),
            vec![vec![0, 1, 2], vec![2, 1, 3]]
        );
        assert!(strip_triangles(&[0, 1]).is_empty());
    }

    #[test]
    fn test_mismatched_array_skipped() {
        let mut pd = PolyData::new(vec![DVec3::ZERO, DVec3::X]);
        add_array(&mut pd, "short".into(), 1, IOBuffer::F64(vec![1.0]));
        add_array(&mut pd, "ok".into(), 1, IOBuffer::F32(vec![1.0, 2.0]));
        let names: Vec<&str> = pd.point_data().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["ok"]);
    }
}
