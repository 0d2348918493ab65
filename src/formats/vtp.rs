//! VTK XML PolyData (`.vtp`) through `vtkio`.
//!
//! Inline `ascii` and `binary` arrays and an `AppendedData` section (`raw` or
//! `base64`) are all read, zlib compressed or not. Before `vtkio` sees a
//! document, every binary size header is checked against the file length.

use std::io::{Cursor, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use quick_xml::events::Event;
use quick_xml::Reader;
use vtkio::model::Vtk;

use crate::formats::vtk_model::{from_vtk, to_vtk, Layout, ParseResult};
use crate::geom::PolyData;
use crate::util::{Error, Result, ScalarType};

const FORMAT: &str = "VTP";

/// Upper bound of the deflate expansion ratio.
const MAX_ZLIB_RATIO: u64 = 1032;

const PIECE_COUNTS: [&[u8]; 5] = [
    b"NumberOfPoints",
    b"NumberOfVerts",
    b"NumberOfLines",
    b"NumberOfStrips",
    b"NumberOfPolys",
];

/// Parse a VTK XML PolyData file.
pub fn parse(bytes: &[u8], path: &Path) -> Result<PolyData> {
    check_document(bytes)
        .and_then(|()| Vtk::parse_xml(Cursor::new(bytes)).map_err(|e| e.to_string()))
        .and_then(|vtk| from_vtk(vtk, str::to_string))
        .map_err(|reason| Error::format(path, FORMAT, reason))
}

/// Binary block layout declared on the root element.
struct Blocks {
    word: usize,
    big_endian: bool,
    compressed: bool,
    limit: u64,
}

impl Blocks {
    fn word_at(&self, bytes: &[u8], index: usize) -> ParseResult<u64> {
        let start = index * self.word;
        let b = bytes
            .get(start..start + self.word)
            .ok_or("truncated binary header")?;
        Ok(match (self.word, self.big_endian) {
            (8, false) => LittleEndian::read_u64(b),
            (8, true) => BigEndian::read_u64(b),
            (_, false) => u64::from(LittleEndian::read_u32(b)),
            (_, true) => u64::from(BigEndian::read_u32(b)),
        })
    }

    fn within(&self, n: u64, ratio: u64, what: &str) -> ParseResult<()> {
        if n > self.limit.saturating_mul(ratio) {
            return Err(format!("{} {} does not fit a {} byte file", what, n, self.limit));
        }
        Ok(())
    }

    /// Check one array header. `prefix(n)` decodes the first `n` bytes.
    fn check(&self, prefix: impl Fn(usize) -> ParseResult<Vec<u8>>) -> ParseResult<()> {
        if !self.compressed {
            let size = self.word_at(&prefix(self.word)?, 0)?;
            return self.within(size, 1, "array size");
        }
        let head = prefix(3 * self.word)?;
        let blocks = self.word_at(&head, 0)?;
        let block_size = self.word_at(&head, 1)?;
        let last = self.word_at(&head, 2)?;
        let header_len = blocks.saturating_add(3).saturating_mul(self.word as u64);
        self.within(header_len, 1, "block header size")?;
        self.within(blocks.saturating_mul(block_size), MAX_ZLIB_RATIO, "uncompressed size")?;
        if last > block_size {
            return Err(format!("last block of {} bytes exceeds block size {}", last, block_size));
        }
        let header = prefix(header_len as usize)?;
        let mut compressed = 0u64;
        for i in 0..blocks as usize {
            compressed = compressed.saturating_add(self.word_at(&header, 3 + i)?);
        }
        self.within(compressed, 1, "compressed size")
    }
}

fn base64_prefix(text: &[u8], n: usize) -> ParseResult<Vec<u8>> {
    let chars = n.div_ceil(3) * 4;
    STANDARD
        .decode(&text[..chars.min(text.len())])
        .map_err(|e| format!("bad base64 header: {}", e))
}

/// Walk the document and validate counts and binary headers.
/// Malformed XML is left for `vtkio` to report.
fn check_document(bytes: &[u8]) -> ParseResult<()> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut blocks = Blocks {
        word: 4,
        big_endian: false,
        compressed: false,
        limit: bytes.len() as u64,
    };
    let mut open: Vec<String> = Vec::new();
    let mut appended = Vec::new();
    let mut inline_binary = false;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(_) => return Ok(()),
        };
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let attrs: Vec<(Vec<u8>, String)> = e
                    .attributes()
                    .flatten()
                    .map(|a| {
                        let value = String::from_utf8_lossy(&a.value).into_owned();
                        (a.key.local_name().as_ref().to_vec(), value)
                    })
                    .collect();
                let attr = |key: &[u8]| {
                    attrs
                        .iter()
                        .find(|(k, _)| k.as_slice() == key)
                        .map(|(_, v)| v.as_str())
                };
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"VTKFile" => {
                        blocks.word = attr(b"header_type")
                            .and_then(ScalarType::from_vtp_name)
                            .map_or(4, ScalarType::num_bytes);
                        blocks.big_endian = attr(b"byte_order") == Some("BigEndian");
                        blocks.compressed = attr(b"compressor").is_some_and(|c| !c.is_empty());
                    }
                    b"Piece" => {
                        for key in PIECE_COUNTS {
                            if let Some(n) = attr(key).and_then(|v| v.parse::<u64>().ok()) {
                                blocks.within(n, MAX_ZLIB_RATIO, "piece count")?;
                            }
                        }
                    }
                    b"DataArray" => match attr(b"format") {
                        Some("binary") => inline_binary = is_start,
                        Some("appended") => {
                            let offset = attr(b"offset").and_then(|v| v.parse::<usize>().ok());
                            appended.push(offset.ok_or("appended array without offset")?);
                        }
                        _ => {}
                    },
                    b"AppendedData" => {
                        let raw = attr(b"encoding") == Some("raw");
                        let start = (reader.buffer_position() as usize).min(bytes.len());
                        return check_appended(&bytes[start..], raw, &appended, &blocks);
                    }
                    _ => {}
                }
                if is_start {
                    open.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
            }
            Event::Text(ref t) if inline_binary => {
                let text: Vec<u8> = t.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
                blocks.check(|n| base64_prefix(&text, n))?;
                inline_binary = false;
            }
            Event::End(_) => {
                open.pop();
                inline_binary = false;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    match open.last() {
        Some(name) => Err(format!("unexpected end of document inside <{}>", name)),
        None => Ok(()),
    }
}

fn check_appended(data: &[u8], raw: bool, offsets: &[usize], blocks: &Blocks) -> ParseResult<()> {
    const CLOSE: &[u8] = b"</AppendedData>";
    let start = data
        .iter()
        .position(|&b| b == b'_')
        .ok_or("AppendedData without '_' marker")?;
    let data = &data[start + 1..];
    let end = data
        .windows(CLOSE.len())
        .rposition(|w| w == CLOSE)
        .ok_or("unexpected end of document inside <AppendedData>")?;
    let data = &data[..end];

    for &offset in offsets {
        let block = data
            .get(offset..)
            .ok_or_else(|| format!("appended offset {} is past the data", offset))?;
        if raw {
            blocks.check(|n| Ok(block[..n.min(block.len())].to_vec()))?;
        } else {
            blocks.check(|n| base64_prefix(block, n))?;
        }
    }
    Ok(())
}

/// Write polydata as a VTK XML PolyData document.
pub fn write<W: Write>(w: &mut W, pd: &PolyData) -> Result<()> {
    to_vtk(pd, Layout::Xml, str::to_string)
        .write_xml(&mut *w)
        .map_err(|e| Error::invalid(format!("VTP write failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::DataArray;
    use crate::util::DVec3;
    use byteorder::WriteBytesExt;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    fn p() -> &'static Path {
        Path::new("t.vtp")
    }

    fn triangle() -> PolyData {
        let mut pd = PolyData::new(vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.3),
        ]);
        pd.polys = vec![vec![0, 1, 2]];
        pd
    }

    #[test]
    fn test_roundtrip() {
        let mut pd = triangle();
        pd.add_point_array(DataArray::scalar("a<b", vec![1.0, -2.5, 1e-12])).unwrap();
        pd.add_point_array(DataArray::new("Normals", 3, vec![0.0; 9]).unwrap())
            .unwrap();
        let mut buf = Vec::new();
        write(&mut buf, &pd).unwrap();
        let back = parse(&buf, p()).unwrap();
        assert_eq!(back, pd);
    }

    #[test]
    fn test_points_only() {
        let mut pd = PolyData::new(vec![DVec3::ZERO, DVec3::ONE, DVec3::X]);
        pd.set_point_cells();
        let mut buf = Vec::new();
        write(&mut buf, &pd).unwrap();
        let back = parse(&buf, p()).unwrap();
        assert_eq!(back.verts.len(), 3);
        assert!(!back.has_topology());
    }

    fn le_bytes(values: &[f64], ty: ScalarType) -> Vec<u8> {
        let mut out = Vec::new();
        for &v in values {
            ty.write::<LittleEndian>(&mut out, v).unwrap();
        }
        out
    }

    /// One zlib block behind a `UInt32` header, both base64 encoded.
    fn zlib_block(data: &[u8]) -> String {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        let compressed = enc.finish().unwrap();
        let mut header = Vec::new();
        for v in [1, data.len(), data.len(), compressed.len()] {
            header.write_u32::<LittleEndian>(v as u32).unwrap();
        }
        STANDARD.encode(&header) + &STANDARD.encode(&compressed)
    }

    fn appended_doc(points: &str, conn: &str, offs: &str) -> String {
        let o1 = points.len();
        let o2 = o1 + conn.len();
        format!(
            "<?xml version=\"1.0\"?>\n\
             <VTKFile type=\"PolyData\" version=\"1.0\" byte_order=\"LittleEndian\" \
             header_type=\"UInt32\" compressor=\"vtkZLibDataCompressor\">\n\
             <PolyData>\n\
             <Piece NumberOfPoints=\"3\" NumberOfVerts=\"0\" NumberOfLines=\"0\" \
             NumberOfStrips=\"0\" NumberOfPolys=\"1\">\n\
             <Points><DataArray type=\"Float32\" NumberOfComponents=\"3\" format=\"appended\" offset=\"0\"/></Points>\n\
             <Polys>\n\
             <DataArray type=\"Int64\" Name=\"connectivity\" format=\"appended\" offset=\"{}\"/>\n\
             <DataArray type=\"Int64\" Name=\"offsets\" format=\"appended\" offset=\"{}\"/>\n\
             </Polys>\n\
             </Piece>\n\
             </PolyData>\n\
             <AppendedData encoding=\"base64\">\n_{}{}{}</AppendedData>\n\
             </VTKFile>\n",
            o1, o2, points, conn, offs
        )
    }

    #[test]
    fn test_appended_zlib() {
        let points = zlib_block(&le_bytes(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            ScalarType::Float32,
        ));
        let conn = zlib_block(&le_bytes(&[0.0, 1.0, 2.0], ScalarType::Int64));
        let offs = zlib_block(&le_bytes(&[3.0], ScalarType::Int64));
        let doc = appended_doc(&points, &conn, &offs);

        check_document(doc.as_bytes()).unwrap();
        let pd = parse(doc.as_bytes(), p()).unwrap();
        assert_eq!(pd.points[1], DVec3::X);
        assert_eq!(pd.points[2], DVec3::Y);
        assert_eq!(pd.polys, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_hostile_block_header() {
        let mut header = Vec::new();
        for v in [0xFFFF_FFF0u32, 0x8000, 0x8000, 16] {
            header.write_u32::<LittleEndian>(v).unwrap();
        }
        let block = STANDARD.encode(&header);
        let doc = appended_doc(&block, &block, &block);
        let err = check_document(doc.as_bytes()).unwrap_err();
        assert!(err.contains("block header size"), "{}", err);
        assert!(parse(doc.as_bytes(), p()).is_err());

        let short = appended_doc("AAAA", "AAAA", "AAAA");
        assert!(parse(short.as_bytes(), p()).is_err());
    }

    #[test]
    fn test_hostile_inline_size() {
        let size = STANDARD.encode(u32::MAX.to_le_bytes());
        let doc = format!(
            "<VTKFile type=\"PolyData\" version=\"1.0\" byte_order=\"LittleEndian\">\
             <PolyData><Piece NumberOfPoints=\"1\" NumberOfPolys=\"0\"><Points>\
             <DataArray type=\"Float32\" NumberOfComponents=\"3\" format=\"binary\">{}</DataArray>\
             </Points></Piece></PolyData></VTKFile>",
            size
        );
        let err = check_document(doc.as_bytes()).unwrap_err();
        assert!(err.contains("array size"), "{}", err);
    }

    #[test]
    fn test_hostile_piece_count() {
        let doc = "<VTKFile type=\"PolyData\" version=\"1.0\"><PolyData>\
            <Piece NumberOfPoints=\"18446744073709551615\"></Piece></PolyData></VTKFile>";
        assert!(parse(doc.as_bytes(), p()).is_err());
    }

    #[test]
    fn test_rejects() {
        let grid = "<VTKFile type=\"ImageData\"></VTKFile>";
        assert!(parse(grid.as_bytes(), p()).is_err());
        let err = check_document(b"<VTKFile type=\"PolyData\"><PolyData>").unwrap_err();
        assert!(err.contains("<PolyData>"), "{}", err);
        assert!(parse(b"<VTKFile type=\"PolyData\"><PolyData>", p()).is_err());
        assert!(parse(b"plain text", p()).is_err());
    }
}
