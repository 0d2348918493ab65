//! Wavefront OBJ.
//!
//! Parsing goes through `tobj`. Only geometry is used: points, lines and
//! faces of every object, plus `v x y z r g b` vertex colors. Texture
//! coordinates, normals, groups and materials are ignored. OBJ has no place
//! for named per-point data, so features are not written.
//!
//! `tobj` keeps only the vertices some element references, in order of first
//! use. A file with vertices and no elements at all is read as a point cloud.

use std::io::{Cursor, Write};
use std::path::Path;

use tracing::debug;

use crate::geom::{DataArray, PolyData};
use crate::util::{DVec3, Error, Result};

const FORMAT: &str = "OBJ";

/// Parse OBJ text.
pub fn parse(bytes: &[u8], path: &Path) -> Result<PolyData> {
    let options = tobj::LoadOptions {
        single_index: false,
        triangulate: false,
        ignore_points: false,
        ignore_lines: false,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj_buf(&mut Cursor::new(bytes), &options, |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|e| Error::format(path, FORMAT, e.to_string()))?;

    let mut pd = PolyData::default();
    let mut colors: Vec<f64> = Vec::new();
    for model in models {
        let mesh = model.mesh;
        if mesh.positions.len() % 3 != 0 {
            let reason = format!("{} coordinates is not a multiple of 3", mesh.positions.len());
            return Err(Error::format(path, FORMAT, reason));
        }
        debug!("OBJ object '{}': {} vertices", model.name, mesh.positions.len() / 3);

        // Indices are per object.
        let offset = pd.num_points() as u32;
        pd.points.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|c| DVec3::new(c[0], c[1], c[2])),
        );
        if mesh.vertex_color.len() == mesh.positions.len() {
            colors.extend_from_slice(&mesh.vertex_color);
        }

        let arities = if mesh.face_arities.is_empty() {
            vec![3; mesh.indices.len() / 3]
        } else {
            mesh.face_arities
        };
        let mut start = 0usize;
        for arity in arities {
            let end = start + arity as usize;
            let Some(indices) = mesh.indices.get(start..end) else {
                return Err(Error::format(path, FORMAT, "element indices overrun"));
            };
            let cell: Vec<u32> = indices.iter().map(|i| i + offset).collect();
            match arity {
                1 => pd.verts.push(cell),
                2 => pd.lines.push(cell),
                _ => pd.polys.push(cell),
            }
            start = end;
        }
    }

    if pd.points.is_empty() {
        pd.points = bare_vertices(bytes).map_err(|reason| Error::format(path, FORMAT, reason))?;
    } else if colors.len() == pd.points.len() * 3 {
        pd.add_point_array(DataArray::new("RGB", 3, colors)?)?;
    }
    Ok(pd)
}

/// `v` statements of a file that has no elements.
fn bare_vertices(bytes: &[u8]) -> std::result::Result<Vec<DVec3>, String> {
    let text = String::from_utf8_lossy(bytes);
    let mut points = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let mut words = line.split_whitespace();
        if words.next() != Some("v") {
            continue;
        }
        let xyz = words
            .take(3)
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|e| format!("line {}: {}", lineno + 1, e))?;
        match xyz[..] {
            [x, y, z] => points.push(DVec3::new(x, y, z)),
            _ => return Err(format!("line {}: vertex has {} coordinates", lineno + 1, xyz.len())),
        }
    }
    Ok(points)
}

/// Write polydata as OBJ. Vertex cells are written as `p` statements only
/// when there are no polygons.
pub fn write<W: Write>(w: &mut W, pd: &PolyData) -> Result<()> {
    writeln!(w, "# layerbridge")?;
    for p in &pd.points {
        writeln!(w, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for poly in &pd.polys {
        write_cell(w, "f", poly)?;
    }
    for line in &pd.lines {
        write_cell(w, "l", line)?;
    }
    if pd.polys.is_empty() {
        for vert in &pd.verts {
            write_cell(w, "p", vert)?;
        }
    }
    Ok(())
}

fn write_cell<W: Write>(w: &mut W, keyword: &str, cell: &[u32]) -> Result<()> {
    write!(w, "{}", keyword)?;
    for i in cell {
        write!(w, " {}", i + 1)?;
    }
    writeln!(w)?;
    Ok(())
}
