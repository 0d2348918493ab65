//! STL through the `stl_io` crate.
//!
//! STL stores loose triangles in single precision. On read, corners with
//! identical coordinates are merged into shared vertices in order of first
//! appearance. STL has no vertex cells and no per-point data, so only
//! surfaces can be written.

use std::io::{Cursor, Write};
use std::path::Path;

use stl_io::{Normal, Triangle, Vertex};

use crate::geom::PolyData;
use crate::util::{DVec3, Error, Result, Vec3};

const FORMAT: &str = "STL";

/// Parse an ASCII or binary STL file.
pub fn parse(bytes: &[u8], path: &Path) -> Result<PolyData> {
    let mut cursor = Cursor::new(bytes);
    let mesh = stl_io::read_stl(&mut cursor)
        .map_err(|e| Error::format(path, FORMAT, e.to_string()))?;

    let mut pd = PolyData::new(
        mesh.vertices
            .iter()
            .map(|v| DVec3::new(v[0] as f64, v[1] as f64, v[2] as f64))
            .collect(),
    );
    pd.polys = mesh
        .faces
        .iter()
        .map(|f| f.vertices.iter().map(|&i| i as u32).collect())
        .collect();
    Ok(pd)
}

/// Write the polygons of `pd` as binary STL. Polygons with more than three
/// corners are fan triangulated; facet normals are recomputed.
pub fn write<W: Write>(w: &mut W, pd: &PolyData) -> Result<()> {
    let vertex = |i: u32| {
        let p = pd.points[i as usize].as_vec3();
        Vertex::new([p.x, p.y, p.z])
    };
    let mut triangles = Vec::with_capacity(pd.polys.len());
    for poly in pd.polys.iter().filter(|p| p.len() >= 3) {
        for k in 1..poly.len() - 1 {
            let (a, b, c) = (poly[0], poly[k], poly[k + 1]);
            let n = facet_normal(
                pd.points[a as usize],
                pd.points[b as usize],
                pd.points[c as usize],
            );
            triangles.push(Triangle {
                normal: Normal::new([n.x, n.y, n.z]),
                vertices: [vertex(a), vertex(b), vertex(c)],
            });
        }
    }
    stl_io::write_stl(w, triangles.iter())?;
    Ok(())
}

fn facet_normal(a: DVec3, b: DVec3, c: DVec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero().as_vec3()
}
