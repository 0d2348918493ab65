//! Numeric scalar types used by the binary mesh encodings.
//!
//! [`ScalarType`] describes PLY property types and carries byte-order
//! generic read/write helpers. The VTK spellings are only parsed, to size
//! headers before a file is handed to `vtkio`.

use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Fixed-size numeric storage type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
}

impl ScalarType {
    /// Returns the size in bytes of a single element of this type.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Int64 | Self::Uint64 | Self::Float64 => 8,
        }
    }

    /// Returns true if this is an integer type.
    #[inline]
    pub const fn is_integer(self) -> bool {
        !self.is_float()
    }

    /// Returns true if this is a floating point type.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Parse a PLY property type. Both the classic (`uchar`) and the sized
    /// (`uint8`) spellings are accepted.
    pub fn from_ply_name(name: &str) -> Option<Self> {
        Some(match name {
            "char" | "int8" => Self::Int8,
            "uchar" | "uint8" => Self::Uint8,
            "short" | "int16" => Self::Int16,
            "ushort" | "uint16" => Self::Uint16,
            "int" | "int32" => Self::Int32,
            "uint" | "uint32" => Self::Uint32,
            "float" | "float32" => Self::Float32,
            "double" | "float64" => Self::Float64,
            _ => return None,
        })
    }

    /// PLY spelling of this type. 64 bit integers have no PLY name and are
    /// written as `double`.
    pub const fn ply_name(self) -> &'static str {
        match self {
            Self::Int8 => "char",
            Self::Uint8 => "uchar",
            Self::Int16 => "short",
            Self::Uint16 => "ushort",
            Self::Int32 => "int",
            Self::Uint32 => "uint",
            Self::Float32 => "float",
            Self::Int64 | Self::Uint64 | Self::Float64 => "double",
        }
    }

    /// Parse a legacy VTK data type name.
    pub fn from_vtk_name(name: &str) -> Option<Self> {
        Some(match name {
            "char" | "signed_char" => Self::Int8,
            "unsigned_char" | "bit" => Self::Uint8,
            "short" => Self::Int16,
            "unsigned_short" => Self::Uint16,
            "int" => Self::Int32,
            "unsigned_int" => Self::Uint32,
            "long" | "vtkIdType" | "vtktypeint64" => Self::Int64,
            "unsigned_long" | "vtktypeuint64" => Self::Uint64,
            "float" => Self::Float32,
            "double" => Self::Float64,
            _ => return None,
        })
    }

    /// Parse a VTK XML `type` attribute.
    pub fn from_vtp_name(name: &str) -> Option<Self> {
        Some(match name {
            "Int8" | "Char" => Self::Int8,
            "UInt8" => Self::Uint8,
            "Int16" => Self::Int16,
            "UInt16" => Self::Uint16,
            "Int32" => Self::Int32,
            "UInt32" => Self::Uint32,
            "Int64" => Self::Int64,
            "UInt64" => Self::Uint64,
            "Float32" => Self::Float32,
            "Float64" => Self::Float64,
            _ => return None,
        })
    }

    /// Read one value of this type, widened to `f64`.
    pub fn read<B: ByteOrder>(self, r: &mut impl Read) -> io::Result<f64> {
        Ok(match self {
            Self::Int8 => r.read_i8()? as f64,
            Self::Uint8 => r.read_u8()? as f64,
            Self::Int16 => r.read_i16::<B>()? as f64,
            Self::Uint16 => r.read_u16::<B>()? as f64,
            Self::Int32 => r.read_i32::<B>()? as f64,
            Self::Uint32 => r.read_u32::<B>()? as f64,
            Self::Int64 => r.read_i64::<B>()? as f64,
            Self::Uint64 => r.read_u64::<B>()? as f64,
            Self::Float32 => r.read_f32::<B>()? as f64,
            Self::Float64 => r.read_f64::<B>()?,
        })
    }

    /// Write `value` narrowed to this type.
    pub fn write<B: ByteOrder>(self, w: &mut impl Write, value: f64) -> io::Result<()> {
        match self {
            Self::Int8 => w.write_i8(value as i8),
            Self::Uint8 => w.write_u8(value as u8),
            Self::Int16 => w.write_i16::<B>(value as i16),
            Self::Uint16 => w.write_u16::<B>(value as u16),
            Self::Int32 => w.write_i32::<B>(value as i32),
            Self::Uint32 => w.write_u32::<B>(value as u32),
            Self::Int64 => w.write_i64::<B>(value as i64),
            Self::Uint64 => w.write_u64::<B>(value as u64),
            Self::Float32 => w.write_f32::<B>(value as f32),
            Self::Float64 => w.write_f64::<B>(value),
        }
    }
}
