//! Well-Known Binary codec for 2D simple-feature geometries.
//!
//! Coordinates are read and written by the `wkb` crate and converted to `geo`
//! types through `geo-traits`. This module adds the structural pieces on top:
//! header inspection, validation of member kinds and lengths, and splitting of
//! multi-part geometries into borrowed member slices so members keep the exact
//! bytes (and byte order) they were written with.

use std::borrow::Cow;

use geo::LineString;
use geo_traits::to_geo::ToGeoGeometry;
use thiserror::Error;
use ::wkb::writer::{write_geometry, WriteOptions};
use ::wkb::Endianness;

use crate::models::GeometryKind;

/// Codec failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WkbError {
    #[error("unexpected end of input at byte {offset} ({needed} more bytes needed)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("invalid byte order marker {0:#04x}")]
    InvalidByteOrder(u8),

    #[error("unsupported geometry type code {0}")]
    UnsupportedType(u32),

    #[error("expected {expected} member, found {found}")]
    UnexpectedMember {
        expected: GeometryKind,
        found: GeometryKind,
    },

    #[error("expected a multi-part geometry, found {0}")]
    NotMulti(GeometryKind),

    #[error("{0} trailing bytes after geometry")]
    TrailingBytes(usize),

    #[error("empty points have no simple-feature representation")]
    EmptyPoint,

    #[error("cannot encode {0} as simple-feature WKB")]
    Unencodable(&'static str),

    #[error("WKB codec error: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, WkbError>;

/// WKB byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    BigEndian,
    #[default]
    LittleEndian,
}

impl ByteOrder {
    fn marker(self) -> u8 {
        match self {
            ByteOrder::BigEndian => 0,
            ByteOrder::LittleEndian => 1,
        }
    }

    fn from_marker(marker: u8) -> Result<Self> {
        match marker {
            0 => Ok(ByteOrder::BigEndian),
            1 => Ok(ByteOrder::LittleEndian),
            other => Err(WkbError::InvalidByteOrder(other)),
        }
    }

    fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::BigEndian => value.to_be_bytes(),
            ByteOrder::LittleEndian => value.to_le_bytes(),
        }
    }
}

impl From<ByteOrder> for Endianness {
    fn from(order: ByteOrder) -> Self {
        match order {
            ByteOrder::BigEndian => Endianness::BigEndian,
            ByteOrder::LittleEndian => Endianness::LittleEndian,
        }
    }
}

fn codec(error: ::wkb::error::WkbError) -> WkbError {
    WkbError::Codec(error.to_string())
}

/// Read the geometry kind from a WKB header
pub fn read_kind(buf: &[u8]) -> Result<GeometryKind> {
    Scanner::new(buf).header().map(|(_, kind)| kind)
}

/// Read the byte order from a WKB header
pub fn read_byte_order(buf: &[u8]) -> Result<ByteOrder> {
    let marker = *buf.first().ok_or(WkbError::UnexpectedEof { offset: 0, needed: 1 })?;
    ByteOrder::from_marker(marker)
}

/// Decode a complete WKB buffer
pub fn decode(buf: &[u8]) -> Result<geo::Geometry<f64>> {
    // Structure first, so the reader only ever sees well-formed 2D buffers
    let mut scanner = Scanner::new(buf);
    scanner.geometry(None)?;
    scanner.finish()?;

    let wkb = ::wkb::reader::read_wkb(buf).map_err(codec)?;
    wkb.try_to_geometry().ok_or(WkbError::EmptyPoint)
}

/// Split a multi-part geometry into the WKB slices of its members, in encoded order
pub fn split_parts(buf: &[u8]) -> Result<Vec<&[u8]>> {
    let mut scanner = Scanner::new(buf);
    let (order, kind) = scanner.header()?;
    let member = kind.member().ok_or(WkbError::NotMulti(kind))?;

    let count = scanner.count(order)?;
    let mut parts = Vec::with_capacity(count.min(scanner.remaining() / 5));
    for _ in 0..count {
        let start = scanner.pos;
        scanner.geometry(Some(member))?;
        parts.push(&buf[start..scanner.pos]);
    }
    scanner.finish()?;

    Ok(parts)
}

/// Wrap a single-part geometry into a one-member multi geometry.
///
/// The member bytes are copied verbatim and the new header uses the member's byte order.
pub fn promote_to_multi(buf: &[u8]) -> Result<Vec<u8>> {
    let (order, kind) = Scanner::new(buf).header()?;
    if kind.is_multi() {
        return Ok(buf.to_vec());
    }

    let mut multi = Vec::with_capacity(9 + buf.len());
    multi.push(order.marker());
    multi.extend_from_slice(&order.u32_bytes(kind.multi().wkb_code()));
    multi.extend_from_slice(&order.u32_bytes(1));
    multi.extend_from_slice(buf);
    Ok(multi)
}

/// Encode a geometry as little-endian WKB
pub fn encode(geometry: &geo::Geometry<f64>) -> Result<Vec<u8>> {
    encode_with(geometry, ByteOrder::LittleEndian)
}

/// Encode a geometry with an explicit byte order
pub fn encode_with(geometry: &geo::Geometry<f64>, order: ByteOrder) -> Result<Vec<u8>> {
    let geometry = simple_feature(geometry)?;
    let mut buf = Vec::new();
    write_geometry(&mut buf, &*geometry, &WriteOptions { endianness: order.into() })
        .map_err(codec)?;
    Ok(buf)
}

/// Rewrite `geo`-only variants as the simple-feature kind they stand for
fn simple_feature(geometry: &geo::Geometry<f64>) -> Result<Cow<'_, geo::Geometry<f64>>> {
    Ok(match geometry {
        geo::Geometry::Line(l) => Cow::Owned(LineString::new(vec![l.start, l.end]).into()),
        geo::Geometry::Rect(r) => Cow::Owned(r.to_polygon().into()),
        geo::Geometry::Triangle(t) => Cow::Owned(t.to_polygon().into()),
        geo::Geometry::GeometryCollection(_) => {
            return Err(WkbError::Unencodable("GeometryCollection"))
        }
        other => Cow::Borrowed(other),
    })
}

/// Walks WKB structure without materializing coordinates
struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn skip(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(WkbError::UnexpectedEof {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(WkbError::TrailingBytes(n)),
        }
    }

    fn count(&mut self, order: ByteOrder) -> Result<usize> {
        let b = self.skip(4)?;
        let bytes = [b[0], b[1], b[2], b[3]];
        Ok(match order {
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
        } as usize)
    }

    fn header(&mut self) -> Result<(ByteOrder, GeometryKind)> {
        let order = ByteOrder::from_marker(self.skip(1)?[0])?;
        let code = self.count(order)? as u32;
        let kind = GeometryKind::from_wkb_code(code).ok_or(WkbError::UnsupportedType(code))?;
        Ok((order, kind))
    }

    fn coords(&mut self, order: ByteOrder) -> Result<()> {
        let count = self.count(order)?;
        self.skip(count.saturating_mul(16))?;
        Ok(())
    }

    /// Skip one geometry, checking its kind against `expected` when given
    fn geometry(&mut self, expected: Option<GeometryKind>) -> Result<GeometryKind> {
        let (order, kind) = self.header()?;
        if let Some(expected) = expected {
            if kind != expected {
                return Err(WkbError::UnexpectedMember { expected, found: kind });
            }
        }

        match kind {
            GeometryKind::Point => {
                self.skip(16)?;
            }
            GeometryKind::LineString => self.coords(order)?,
            GeometryKind::Polygon => {
                for _ in 0..self.count(order)? {
                    self.coords(order)?;
                }
            }
            multi => {
                let member = multi.member();
                for _ in 0..self.count(order)? {
                    self.geometry(member)?;
                }
            }
        }
        Ok(kind)
    }
}
