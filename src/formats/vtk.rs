//! Legacy VTK (`.vtk`) polydata through `vtkio`.
//!
//! Reads ASCII and BINARY files of `DATASET POLYDATA`. Cell attributes are
//! dropped. Writes ASCII version 4.2, with multi-component arrays in a
//! `FIELD` block.

use std::io::{Cursor, Write};
use std::path::Path;

use vtkio::model::Vtk;

use crate::formats::vtk_model::{from_vtk, to_vtk, Layout, ParseResult};
use crate::geom::PolyData;
use crate::util::{Error, Result, ScalarType};

const FORMAT: &str = "VTK";

/// Parse a legacy VTK file.
pub fn parse(bytes: &[u8], path: &Path) -> Result<PolyData> {
    check_counts(bytes)
        .and_then(|()| Vtk::parse_legacy_be(Cursor::new(bytes)).map_err(|e| e.to_string()))
        .and_then(|vtk| from_vtk(vtk, decode_name))
        .map_err(|reason| Error::format(path, FORMAT, reason))
}

/// Reject headers declaring more values than the file could hold, before
/// any buffer is sized from them. Every value takes at least one byte.
fn check_counts(bytes: &[u8]) -> ParseResult<()> {
    let limit = bytes.len() as u64;
    for line in bytes.split(|&b| b == b'\n') {
        let Ok(line) = std::str::from_utf8(line) else {
            continue;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let num = |i: usize| words.get(i).and_then(|w| w.parse::<u64>().ok());
        let keyword = words.first().map(|w| w.to_ascii_uppercase());
        let need = match keyword.as_deref() {
            Some("POINTS") => num(1).map(|n| n.saturating_mul(3)),
            Some("VERTICES" | "LINES" | "POLYGONS" | "TRIANGLE_STRIPS") => num(1).max(num(2)),
            Some("POINT_DATA" | "CELL_DATA") => num(1),
            Some("FIELD") => num(2),
            Some("LOOKUP_TABLE") => num(2).map(|n| n.saturating_mul(4)),
            // Field array: `name components tuples type`.
            _ if words.len() == 4 && ScalarType::from_vtk_name(words[3]).is_some() => {
                num(1).zip(num(2)).map(|(c, t)| c.saturating_mul(t))
            }
            _ => None,
        };
        if let Some(n) = need.filter(|&n| n > limit) {
            return Err(format!(
                "'{}' declares {} values in a {} byte file",
                line.trim(),
                n,
                limit
            ));
        }
    }
    Ok(())
}

/// Legacy names cannot hold whitespace; VTK escapes it as `%20`.
fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c == '%' || c.is_whitespace() {
            out.push_str(&format!("%{:02X}", c as u32 & 0xff));
        } else {
            out.push(c);
        }
    }
    if out.is_empty() {
        out.push_str("unnamed");
    }
    out
}

fn decode_name(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Write polydata as ASCII legacy VTK 4.2.
pub fn write<W: Write>(w: &mut W, pd: &PolyData) -> Result<()> {
    let mut text = String::new();
    to_vtk(pd, Layout::Legacy, encode_name)
        .write_legacy_ascii(&mut text)
        .map_err(|e| Error::invalid(format!("VTK write failed: {}", e)))?;
    w.write_all(text.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::DataArray;
    use crate::util::DVec3;

    fn p() -> &'static Path {
        Path::new("t.vtk")
    }

    #[test]
    fn test_ascii_roundtrip() {
        let mut pd = PolyData::new(vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.1),
            DVec3::new(0.0, 1.0, -2.5),
        ]);
        pd.polys = vec![vec![0, 1, 2]];
        pd.add_point_array(DataArray::scalar("heat map", vec![0.5, 2.0, 3.0]))
            .unwrap();
        pd.add_point_array(DataArray::new("RGB", 3, vec![0.1; 9]).unwrap())
            .unwrap();

        let mut buf = Vec::new();
        write(&mut buf, &pd).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("# vtk DataFile Version 4.2"));
        assert!(text.contains("heat%20map"));

        let back = parse(&buf, p()).unwrap();
        assert_eq!(back.points, pd.points);
        assert_eq!(back.polys, pd.polys);
        assert_eq!(
            back.point_array("heat map").unwrap().values(),
            &[0.5, 2.0, 3.0]
        );
        assert_eq!(back.point_array("RGB").unwrap().num_components(), 3);
    }

    #[test]
    fn test_points_use_vertex_cells() {
        let mut pd = PolyData::new(vec![DVec3::ZERO, DVec3::ONE]);
        pd.set_point_cells();
        let mut buf = Vec::new();
        write(&mut buf, &pd).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("VERTICES 2 4"));
        assert!(!parse(&buf, p()).unwrap().has_topology());
    }

    #[test]
    fn test_hand_written_attributes() {
        let src = b"# vtk DataFile Version 3.0\nquad\nASCII\nDATASET POLYDATA\n\
            POINTS 4 float\n0 0 0 1 0 0 1 1 0 0 1 0\n\
            POLYGONS 1 5\n4 0 1 2 3\n\
            CELL_DATA 1\nSCALARS id int 1\nLOOKUP_TABLE default\n7\n\
            POINT_DATA 4\nSCALARS s float 1\nLOOKUP_TABLE default\n1 2 3 4\n\
            VECTORS flow float\n1 0 0 1 0 0 1 0 0 1 0 0\n";
        let pd = parse(src, p()).unwrap();
        assert_eq!(pd.polys, vec![vec![0, 1, 2, 3]]);
        assert_eq!(pd.point_array("s").unwrap().values(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(pd.point_array("flow").unwrap().num_components(), 3);
        assert!(pd.point_array("id").is_none());
    }

    #[test]
    fn test_triangle_strips() {
        let src = b"# vtk DataFile Version 4.2\ns\nASCII\nDATASET POLYDATA\n\
            POINTS 4 double\n0 0 0 1 0 0 0 1 0 1 1 0\nTRIANGLE_STRIPS 1 5\n4 0 1 2 3\n";
        let pd = parse(src, p()).unwrap();
        assert_eq!(pd.polys, vec![vec![0, 1, 2], vec![2, 1, 3]]);
    }

    #[test]
    fn test_rejects() {
        assert!(parse(b"hello\n", p()).is_err());
        let grid = b"# vtk DataFile Version 4.2\ng\nASCII\nDATASET STRUCTURED_POINTS\n\
            DIMENSIONS 1 1 1\nORIGIN 0 0 0\nSPACING 1 1 1\n";
        assert!(parse(grid, p()).is_err());
        let short = b"# vtk DataFile Version 4.2\ng\nASCII\nDATASET POLYDATA\nPOINTS 2 float\n0 0 0\n";
        assert!(parse(short, p()).is_err());
    }

    #[test]
    fn test_huge_counts_rejected() {
        let points = b"# vtk DataFile Version 4.2\nh\nBINARY\nDATASET POLYDATA\n\
            POINTS 9223372036854775807 float\n\0\0\0\0";
        assert!(parse(points, p()).is_err());

        let cells = b"# vtk DataFile Version 4.2\nh\nASCII\nDATASET POLYDATA\n\
            POINTS 1 float\n0 0 0\nPOLYGONS 1 4294967295\n1 0\n";
        assert!(parse(cells, p()).is_err());

        let field = b"# vtk DataFile Version 4.2\nh\nASCII\nDATASET POLYDATA\n\
            POINTS 1 float\n0 0 0\nPOINT_DATA 1\nFIELD FieldData 1\n\
            w 4294967295 4294967295 double\n1\n";
        let err = check_counts(field).unwrap_err();
        assert!(err.contains("4294967295"), "{}", err);
    }

    #[test]
    fn test_name_escaping() {
        assert_eq!(encode_name("heat map"), "heat%20map");
        assert_eq!(encode_name(""), "unnamed");
        assert_eq!(decode_name("heat%20map"), "heat map");
        assert_eq!(decode_name("100%"), "100%");
    }
}
