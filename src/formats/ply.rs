//! Stanford PLY.
//!
//! Reads ASCII and both binary encodings with any scalar property type.
//! Vertex properties `x y z` are positions, `nx ny nz` are grouped into a
//! three-component `Normals` array and `red green blue [alpha]` into an
//! `RGB`/`RGBA` array. Every other vertex property becomes a one-component
//! point array. Faces come from the `vertex_indices` (or `vertex_index`)
//! list of the `face` element; other elements are read and skipped.
//!
//! Counts in the header and list counts in the body are checked against the
//! bytes left before anything is allocated from them.

use std::io::{Cursor, Write};
use std::marker::PhantomData;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::formats::text::Tokens;
use crate::geom::{DataArray, PolyData};
use crate::util::{DVec3, Error, Result, ScalarType};

const FORMAT: &str = "PLY";

/// Body encoding of a PLY file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlyEncoding {
    Ascii,
    #[default]
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl PlyEncoding {
    fn header_name(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::BinaryLittleEndian => "binary_little_endian",
            Self::BinaryBigEndian => "binary_big_endian",
        }
    }

    fn from_header_name(name: &str) -> Option<Self> {
        match name {
            "ascii" => Some(Self::Ascii),
            "binary_little_endian" => Some(Self::BinaryLittleEndian),
            "binary_big_endian" => Some(Self::BinaryBigEndian),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Property {
    Scalar { name: String, ty: ScalarType },
    List { name: String, count_ty: ScalarType, item_ty: ScalarType },
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug)]
struct Header {
    encoding: PlyEncoding,
    elements: Vec<Element>,
}

/// Source of property values, ASCII or binary.
trait ValueSource {
    fn value(&mut self, ty: ScalarType) -> Option<f64>;

    /// Unread bytes. Every value takes at least one.
    fn remaining(&self) -> usize;
}

struct AsciiSource<'a>(Tokens<'a>);

impl ValueSource for AsciiSource<'_> {
    fn value(&mut self, _ty: ScalarType) -> Option<f64> {
        self.0.parse()
    }

    fn remaining(&self) -> usize {
        self.0.remaining().len()
    }
}

struct BinarySource<'a, B> {
    cursor: Cursor<&'a [u8]>,
    _order: PhantomData<B>,
}

impl<B: ByteOrder> ValueSource for BinarySource<'_, B> {
    fn value(&mut self, ty: ScalarType) -> Option<f64> {
        ty.read::<B>(&mut self.cursor).ok()
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }
}

/// Parse a PLY file.
pub fn parse(bytes: &[u8], path: &Path) -> Result<PolyData> {
    let fail = |reason: &str| Error::format(path, FORMAT, reason);
    let mut tokens = Tokens::new(bytes);
    let header = parse_header(&mut tokens).map_err(|reason| fail(&reason))?;
    let body = tokens.remaining();

    let pd = match header.encoding {
        PlyEncoding::Ascii => read_body(&header, &mut AsciiSource(Tokens::new(body))),
        PlyEncoding::BinaryLittleEndian => read_body(
            &header,
            &mut BinarySource::<LittleEndian> {
                cursor: Cursor::new(body),
                _order: PhantomData,
            },
        ),
        PlyEncoding::BinaryBigEndian => read_body(
            &header,
            &mut BinarySource::<BigEndian> {
                cursor: Cursor::new(body),
                _order: PhantomData,
            },
        ),
    };
    pd.map_err(|reason| fail(&reason))
}

fn parse_header(tokens: &mut Tokens<'_>) -> std::result::Result<Header, String> {
    if tokens.line() != "ply" {
        return Err("missing 'ply' magic".into());
    }
    let mut encoding = None;
    let mut elements: Vec<Element> = Vec::new();

    loop {
        let line = tokens.line();
        let mut words = line.split_whitespace();
        match words.next() {
            Some("format") => {
                let name = words.next().unwrap_or_default();
                encoding = Some(
                    PlyEncoding::from_header_name(name)
                        .ok_or_else(|| format!("unknown format '{}'", name))?,
                );
            }
            Some("element") => {
                let name = words.next().ok_or("element without name")?;
                let count = words
                    .next()
                    .and_then(|c| c.parse().ok())
                    .ok_or_else(|| format!("element '{}' without count", name))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            Some("property") => {
                let element = elements.last_mut().ok_or("property before any element")?;
                let words: Vec<&str> = words.collect();
                let property = match words.as_slice() {
                    ["list", count_ty, item_ty, name] => Property::List {
                        name: name.to_string(),
                        count_ty: scalar(count_ty)?,
                        item_ty: scalar(item_ty)?,
                    },
                    [ty, name] => Property::Scalar {
                        name: name.to_string(),
                        ty: scalar(ty)?,
                    },
                    _ => return Err(format!("malformed property line '{}'", line)),
                };
                element.properties.push(property);
            }
            Some("end_header") => break,
            Some("comment") | Some("obj_info") | None => {}
            Some(other) => return Err(format!("unexpected header keyword '{}'", other)),
        }
        if tokens.remaining().is_empty() {
            return Err("missing end_header".into());
        }
    }

    Ok(Header {
        encoding: encoding.ok_or("missing format line")?,
        elements,
    })
}

fn scalar(name: &str) -> std::result::Result<ScalarType, String> {
    ScalarType::from_ply_name(name).ok_or_else(|| format!("unknown property type '{}'", name))
}

fn read_body(header: &Header, src: &mut impl ValueSource) -> std::result::Result<PolyData, String> {
    let eof = || "unexpected end of data".to_string();
    let mut pd = PolyData::default();
    let mut vertex_columns: Vec<(String, Vec<f64>)> = Vec::new();

    for element in &header.elements {
        let is_vertex = element.name == "vertex";
        let is_face = element.name == "face";
        if !element.properties.is_empty() && element.count > src.remaining() {
            return Err(format!(
                "element '{}' declares {} rows, only {} bytes follow",
                element.name,
                element.count,
                src.remaining()
            ));
        }
        let capacity = element.count.min(src.remaining());
        if is_vertex {
            vertex_columns = element
                .properties
                .iter()
                .filter_map(|p| match p {
                    Property::Scalar { name, .. } => Some((name.clone(), Vec::with_capacity(capacity))),
                    Property::List { .. } => None,
                })
                .collect();
        }

        for _ in 0..element.count {
            let mut column = 0;
            for property in &element.properties {
                match property {
                    Property::Scalar { ty, .. } => {
                        let v = src.value(*ty).ok_or_else(eof)?;
                        if is_vertex {
                            vertex_columns[column].1.push(v);
                            column += 1;
                        }
                    }
                    Property::List { name, count_ty, item_ty } => {
                        let count = src.value(*count_ty).ok_or_else(eof)?;
                        let n = list_len(count, src.remaining())?;
                        let mut items = Vec::with_capacity(n);
                        for _ in 0..n {
                            items.push(src.value(*item_ty).ok_or_else(eof)?);
                        }
                        if is_face && (name == "vertex_indices" || name == "vertex_index") {
                            let face = items
                                .into_iter()
                                .map(vertex_index)
                                .collect::<std::result::Result<Vec<u32>, String>>()?;
                            pd.polys.push(face);
                        }
                    }
                }
            }
        }
    }

    let take = |columns: &mut Vec<(String, Vec<f64>)>, name: &str| {
        columns
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| columns.remove(i).1)
    };

    let (Some(x), Some(y), Some(z)) = (
        take(&mut vertex_columns, "x"),
        take(&mut vertex_columns, "y"),
        take(&mut vertex_columns, "z"),
    ) else {
        return Err("vertex element lacks x, y or z".into());
    };
    pd.points = x
        .iter()
        .zip(&y)
        .zip(&z)
        .map(|((&x, &y), &z)| DVec3::new(x, y, z))
        .collect();

    let group = |columns: &mut Vec<(String, Vec<f64>)>, names: &[&str], array: &str| {
        if !names.iter().all(|n| columns.iter().any(|(c, _)| c == n)) {
            return None;
        }
        let parts: Vec<Vec<f64>> = names.iter().filter_map(|n| take(columns, n)).collect();
        let rows = parts[0].len();
        let values = (0..rows).flat_map(|r| parts.iter().map(move |p| p[r])).collect();
        DataArray::new(array, names.len(), values).ok()
    };

    let mut arrays = Vec::new();
    arrays.extend(group(&mut vertex_columns, &["nx", "ny", "nz"], "Normals"));
    match group(&mut vertex_columns, &["red", "green", "blue", "alpha"], "RGBA") {
        Some(rgba) => arrays.push(rgba),
        None => arrays.extend(group(&mut vertex_columns, &["red", "green", "blue"], "RGB")),
    }
    for (name, values) in vertex_columns {
        arrays.push(DataArray::scalar(name, values));
    }
    for array in arrays {
        pd.add_point_array(array).map_err(|e| e.to_string())?;
    }
    Ok(pd)
}

fn is_count(v: f64) -> bool {
    v >= 0.0 && v.fract() == 0.0
}

fn list_len(count: f64, remaining: usize) -> std::result::Result<usize, String> {
    if !is_count(count) {
        return Err(format!("bad list count {}", count));
    }
    if count > remaining as f64 {
        return Err(format!("list of {} items, only {} bytes follow", count, remaining));
    }
    Ok(count as usize)
}

fn vertex_index(v: f64) -> std::result::Result<u32, String> {
    if is_count(v) && v <= u32::MAX as f64 {
        Ok(v as u32)
    } else {
        Err(format!("bad vertex index {}", v))
    }
}

/// Vertex property names the reader interprets.
const RESERVED: [&str; 10] = [
    "x", "y", "z", "nx", "ny", "nz", "red", "green", "blue", "alpha",
];

/// Write polydata as PLY. Positions and one-component arrays are written as
/// `double`, `Normals` as `nx ny nz` and `RGB`/`RGBA` as `uchar` channels.
pub fn write<W: Write>(w: &mut W, pd: &PolyData, encoding: PlyEncoding) -> Result<()> {
    let mut columns: Vec<(String, ScalarType, Vec<f64>)> = vec![
        ("x".into(), ScalarType::Float64, pd.points.iter().map(|p| p.x).collect()),
        ("y".into(), ScalarType::Float64, pd.points.iter().map(|p| p.y).collect()),
        ("z".into(), ScalarType::Float64, pd.points.iter().map(|p| p.z).collect()),
    ];
    for array in pd.point_data() {
        let channels: &[&str] = match (array.name(), array.num_components()) {
            (_, 1) => &[],
            ("Normals", 3) => &["nx", "ny", "nz"],
            ("RGB", 3) => &["red", "green", "blue"],
            ("RGBA", 4) => &["red", "green", "blue", "alpha"],
            (name, n) => {
                warn!("PLY: skipping array '{}' with {} components", name, n);
                continue;
            }
        };
        if channels.is_empty() {
            let mut name: String = array
                .name()
                .chars()
                .map(|c| if c.is_whitespace() { '_' } else { c })
                .collect();
            while RESERVED.contains(&name.as_str())
                || columns.iter().any(|(c, _, _)| *c == name)
            {
                name.push('_');
            }
            if name != array.name() {
                warn!("PLY: writing array '{}' as '{}'", array.name(), name);
            }
            columns.push((name, ScalarType::Float64, array.values().to_vec()));
            continue;
        }
        let ty = if array.name() == "Normals" {
            ScalarType::Float64
        } else {
            ScalarType::Uint8
        };
        let n = channels.len();
        for (c, channel) in channels.iter().enumerate() {
            let values = array.values().iter().skip(c).step_by(n).copied().collect();
            columns.push((channel.to_string(), ty, values));
        }
    }

    let count_ty = if pd.polys.iter().all(|p| p.len() <= u8::MAX as usize) {
        ScalarType::Uint8
    } else {
        ScalarType::Int32
    };

    writeln!(w, "ply")?;
    writeln!(w, "format {} 1.0", encoding.header_name())?;
    writeln!(w, "comment layerbridge")?;
    writeln!(w, "element vertex {}", pd.num_points())?;
    for (name, ty, _) in &columns {
        writeln!(w, "property {} {}", ty.ply_name(), name)?;
    }
    if !pd.polys.is_empty() {
        writeln!(w, "element face {}", pd.polys.len())?;
        writeln!(w, "property list {} int vertex_indices", count_ty.ply_name())?;
    }
    writeln!(w, "end_header")?;

    match encoding {
        PlyEncoding::Ascii => {
            for row in 0..pd.num_points() {
                let line: Vec<String> = columns
                    .iter()
                    .map(|(_, ty, values)| {
                        if ty.is_integer() {
                            (values[row] as i64).to_string()
                        } else {
                            values[row].to_string()
                        }
                    })
                    .collect();
                writeln!(w, "{}", line.join(" "))?;
            }
            for poly in &pd.polys {
                write!(w, "{}", poly.len())?;
                for i in poly {
                    write!(w, " {}", i)?;
                }
                writeln!(w)?;
            }
        }
        PlyEncoding::BinaryLittleEndian => write_binary::<LittleEndian, W>(w, pd, &columns, count_ty)?,
        PlyEncoding::BinaryBigEndian => write_binary::<BigEndian, W>(w, pd, &columns, count_ty)?,
    }
    Ok(())
}

fn write_binary<B: ByteOrder, W: Write>(
    w: &mut W,
    pd: &PolyData,
    columns: &[(String, ScalarType, Vec<f64>)],
    count_ty: ScalarType,
) -> Result<()> {
    for row in 0..pd.num_points() {
        for (_, ty, values) in columns {
            ty.write::<B>(w, values[row])?;
        }
    }
    for poly in &pd.polys {
        count_ty.write::<B>(w, poly.len() as f64)?;
        for &i in poly {
            w.write_i32::<B>(i as i32)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetra() -> PolyData {
        let mut pd = PolyData::new(vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
        ]);
        pd.polys = vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]];
        pd.add_point_array(DataArray::scalar("curvature", vec![0.1, 0.2, 0.3, 0.4]))
            .unwrap();
        pd
    }

    fn roundtrip(pd: &PolyData, encoding: PlyEncoding) -> PolyData {
        let mut buf = Vec::new();
        write(&mut buf, pd, encoding).unwrap();
        parse(&buf, Path::new("t.ply")).unwrap()
    }

    #[test]
    fn test_roundtrip_all_encodings() {
        let pd = tetra();
        for encoding in [
            PlyEncoding::Ascii,
            PlyEncoding::BinaryLittleEndian,
            PlyEncoding::BinaryBigEndian,
        ] {
            let back = roundtrip(&pd, encoding);
            assert_eq!(back.points, pd.points, "{:?}", encoding);
            assert_eq!(back.polys, pd.polys);
            assert_eq!(
                back.point_array("curvature").unwrap().values(),
                &[0.1, 0.2, 0.3, 0.4]
            );
        }
    }

    #[test]
    fn test_color_and_normals_grouped() {
        let src = b"ply\nformat ascii 1.0\ncomment test\nelement vertex 2\n\
            property float x\nproperty float y\nproperty float z\n\
            property float nx\nproperty float ny\nproperty float nz\n\
            property uchar red\nproperty uchar green\nproperty uchar blue\n\
            property float quality\nend_header\n\
            0 0 0 0 0 1 255 0 0 0.5\n1 0 0 0 0 1 0 255 0 1.5\n";
        let pd = parse(src, Path::new("t.ply")).unwrap();
        assert_eq!(pd.num_points(), 2);
        assert!(pd.polys.is_empty());
        assert_eq!(pd.point_array("Normals").unwrap().num_components(), 3);
        let rgb = pd.point_array("RGB").unwrap();
        assert_eq!(rgb.values(), &[255.0, 0.0, 0.0, 0.0, 255.0, 0.0]);
        assert_eq!(pd.point_array("quality").unwrap().values(), &[0.5, 1.5]);
    }

    #[test]
    fn test_skips_unknown_elements() {
        let src = b"ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\n\
            property float z\nelement face 1\nproperty list uchar int vertex_index\n\
            element edge 1\nproperty int vertex1\nproperty int vertex2\nend_header\n\
            0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n0 1\n";
        let pd = parse(src, Path::new("t.ply")).unwrap();
        assert_eq!(pd.polys, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_truncated() {
        let pd = tetra();
        let mut buf = Vec::new();
        write(&mut buf, &pd, PlyEncoding::BinaryLittleEndian).unwrap();
        buf.truncate(buf.len() - 5);
        let err = parse(&buf, Path::new("t.ply")).unwrap_err();
        assert!(matches!(err, Error::FileFormat { .. }));
        assert!(parse(b"solid x\n", Path::new("t.ply")).is_err());
    }

    #[test]
    fn test_huge_vertex_count() {
        let src = b"ply\nformat binary_little_endian 1.0\nelement vertex 10000000000000\n\
            property float x\nproperty float y\nproperty float z\nend_header\n\0\0\0\0";
        let err = parse(src, Path::new("t.ply")).unwrap_err();
        assert!(err.to_string().contains("10000000000000"), "{}", err);
    }

    #[test]
    fn test_bad_list_counts() {
        let header = "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\n\
            property float y\nproperty float z\nelement face 1\n\
            property list int int vertex_indices\nend_header\n0 0 0\n1 0 0\n0 1 0\n";
        for face in ["4294967295 0 1 2", "-3 0 1 2", "2.5 0 1 2", "3 0 -1 2", "3 0 1.5 2"] {
            let src = format!("{}{}\n", header, face);
            assert!(parse(src.as_bytes(), Path::new("t.ply")).is_err(), "{}", face);
        }

        let mut bin = b"ply\nformat binary_big_endian 1.0\nelement vertex 0\n\
            property float x\nproperty float y\nproperty float z\nelement face 1\n\
            property list uint int vertex_indices\nend_header\n"
            .to_vec();
        bin.write_u32::<BigEndian>(u32::MAX).unwrap();
        bin.write_i32::<BigEndian>(0).unwrap();
        let err = parse(&bin, Path::new("t.ply")).unwrap_err();
        assert!(err.to_string().contains("4294967295"), "{}", err);
    }

    #[test]
    fn test_reserved_names_renamed() {
        let mut pd = PolyData::new(vec![DVec3::ZERO, DVec3::X]);
        pd.set_point_cells();
        pd.add_point_array(DataArray::scalar("x", vec![7.0, 8.0])).unwrap();
        pd.add_point_array(DataArray::scalar("red", vec![1.0, 2.0])).unwrap();
        pd.add_point_array(DataArray::scalar("x_", vec![3.0, 4.0])).unwrap();

        let back = roundtrip(&pd, PlyEncoding::Ascii);
        assert_eq!(back.points, pd.points);
        assert!(back.point_array("RGB").is_none());
        assert_eq!(back.point_array("x_").unwrap().values(), &[7.0, 8.0]);
        assert_eq!(back.point_array("red_").unwrap().values(), &[1.0, 2.0]);
        assert_eq!(back.point_array("x__").unwrap().values(), &[3.0, 4.0]);
    }
}
