//! Canonical geometry types used across all simplefeatures crates.
//!
//! A [`Geometry`] keeps its Well-Known Binary encoding untouched and carries a
//! short WKT preview for display. Computation happens on `geo` types decoded on
//! demand through [`crate::wkb`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use wkt::{ToWkt, TryFromWkt};

use crate::error::{Result, SfError};
use crate::wkb::{self, WkbError};

/// Default number of WKT characters kept in a geometry preview
pub const DEFAULT_PREVIEW_LENGTH: usize = 28;

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::new(3857, "Web Mercator")
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{} ({})", self.epsg, self.name)
    }
}

/// Simple-feature geometry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryKind {
    /// Cast hierarchy, coarsest first. Each entry decomposes into the next one.
    pub const HIERARCHY: [GeometryKind; 6] = [
        GeometryKind::MultiPolygon,
        GeometryKind::Polygon,
        GeometryKind::MultiLineString,
        GeometryKind::LineString,
        GeometryKind::MultiPoint,
        GeometryKind::Point,
    ];

    /// ISO WKB type code (2D)
    pub fn wkb_code(self) -> u32 {
        match self {
            GeometryKind::Point => 1,
            GeometryKind::LineString => 2,
            GeometryKind::Polygon => 3,
            GeometryKind::MultiPoint => 4,
            GeometryKind::MultiLineString => 5,
            GeometryKind::MultiPolygon => 6,
        }
    }

    pub fn from_wkb_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(GeometryKind::Point),
            2 => Some(GeometryKind::LineString),
            3 => Some(GeometryKind::Polygon),
            4 => Some(GeometryKind::MultiPoint),
            5 => Some(GeometryKind::MultiLineString),
            6 => Some(GeometryKind::MultiPolygon),
            _ => None,
        }
    }

    /// Lowercase name, as accepted by [`FromStr`]
    pub fn as_str(self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::LineString => "linestring",
            GeometryKind::Polygon => "polygon",
            GeometryKind::MultiPoint => "multipoint",
            GeometryKind::MultiLineString => "multilinestring",
            GeometryKind::MultiPolygon => "multipolygon",
        }
    }

    pub fn is_multi(self) -> bool {
        matches!(
            self,
            GeometryKind::MultiPoint | GeometryKind::MultiLineString | GeometryKind::MultiPolygon
        )
    }

    /// Member kind of a multi geometry
    pub fn member(self) -> Option<Self> {
        match self {
            GeometryKind::MultiPoint => Some(GeometryKind::Point),
            GeometryKind::MultiLineString => Some(GeometryKind::LineString),
            GeometryKind::MultiPolygon => Some(GeometryKind::Polygon),
            _ => None,
        }
    }

    /// Multi counterpart of a single-part kind (multi kinds map to themselves)
    pub fn multi(self) -> Self {
        match self {
            GeometryKind::Point => GeometryKind::MultiPoint,
            GeometryKind::LineString => GeometryKind::MultiLineString,
            GeometryKind::Polygon => GeometryKind::MultiPolygon,
            multi => multi,
        }
    }

    /// Position in [`Self::HIERARCHY`], 0 being the coarsest
    pub fn rank(self) -> usize {
        match self {
            GeometryKind::MultiPolygon => 0,
            GeometryKind::Polygon => 1,
            GeometryKind::MultiLineString => 2,
            GeometryKind::LineString => 3,
            GeometryKind::MultiPoint => 4,
            GeometryKind::Point => 5,
        }
    }

    /// The kind this one decomposes into in a single step
    pub fn decomposes_to(self) -> Option<Self> {
        Self::HIERARCHY.get(self.rank() + 1).copied()
    }

    pub fn can_cast_to(self, to: Self) -> bool {
        to.rank() >= self.rank()
    }

    /// One-step decompositions leading from `self` to `to`, or `None` when `to`
    /// is coarser than `self`. Casting a kind to itself yields an empty path.
    pub fn cast_path(self, to: Self) -> Option<Vec<(Self, Self)>> {
        if !self.can_cast_to(to) {
            return None;
        }
        Some(
            Self::HIERARCHY[self.rank()..=to.rank()]
                .windows(2)
                .map(|pair| (pair[0], pair[1]))
                .collect(),
        )
    }

    /// Human-readable hierarchy, e.g. for error messages
    pub fn hierarchy_string() -> String {
        Self::HIERARCHY.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(" > ")
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
        };
        f.write_str(name)
    }
}

impl FromStr for GeometryKind {
    type Err = SfError;

    /// Accepts names case-insensitively, with or without a `wkb` prefix or underscores
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "");
        let name = normalized.strip_prefix("wkb").unwrap_or(&normalized);
        Self::HIERARCHY.into_iter().find(|k| k.as_str() == name).ok_or_else(|| {
            SfError::InvalidArgument {
                name: "geometry kind".to_string(),
                reason: format!("unknown geometry kind '{}'", s),
            }
        })
    }
}

/// An immutable WKB geometry with a WKT preview
#[derive(Clone, PartialEq)]
pub struct Geometry {
    wkb: Vec<u8>,
    preview: String,
}

impl Geometry {
    /// Build from WKB, rejecting buffers that do not decode
    pub fn from_wkb(wkb: Vec<u8>) -> std::result::Result<Self, WkbError> {
        let decoded = wkb::decode(&wkb)?;
        let preview = preview(&decoded, DEFAULT_PREVIEW_LENGTH);
        Ok(Self { wkb, preview })
    }

    /// Build from WKB without validating it.
    ///
    /// Malformed bytes surface as errors from the operations that decode them.
    pub fn from_wkb_unchecked(wkb: Vec<u8>) -> Self {
        let preview = match wkb::decode(&wkb) {
            Ok(decoded) => preview(&decoded, DEFAULT_PREVIEW_LENGTH),
            Err(_) => "<malformed WKB>".to_string(),
        };
        Self { wkb, preview }
    }

    /// Encode a `geo` geometry as little-endian WKB
    pub fn from_geo(geometry: &geo::Geometry<f64>) -> std::result::Result<Self, WkbError> {
        let wkb = wkb::encode(geometry)?;
        Ok(Self { wkb, preview: preview(geometry, DEFAULT_PREVIEW_LENGTH) })
    }

    /// Parse WKT text
    pub fn from_wkt(text: &str) -> Result<Self> {
        let geometry = geo::Geometry::<f64>::try_from_wkt_str(text).map_err(|e| {
            SfError::InvalidArgument { name: "wkt".to_string(), reason: e.to_string() }
        })?;
        Self::from_geo(&geometry).map_err(|e| SfError::InvalidArgument {
            name: "wkt".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn wkb(&self) -> &[u8] {
        &self.wkb
    }

    pub fn into_wkb(self) -> Vec<u8> {
        self.wkb
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Preview with a custom length
    pub fn preview_with(&self, max_len: usize) -> std::result::Result<String, WkbError> {
        Ok(preview(&self.to_geo()?, max_len))
    }

    /// Kind read from the WKB header
    pub fn kind(&self) -> std::result::Result<GeometryKind, WkbError> {
        wkb::read_kind(&self.wkb)
    }

    pub fn to_geo(&self) -> std::result::Result<geo::Geometry<f64>, WkbError> {
        wkb::decode(&self.wkb)
    }

    /// Full WKT text
    pub fn to_wkt(&self) -> std::result::Result<String, WkbError> {
        Ok(self.to_geo()?.wkt_string())
    }
}

impl fmt::Debug for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Geometry").field(&self.preview).finish()
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.preview)
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let text = self.to_wkt().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Geometry::from_wkt(&text).map_err(serde::de::Error::custom)
    }
}

/// Abbreviated WKT of a geometry, truncated to `max_len` characters
pub fn preview(geometry: &geo::Geometry<f64>, max_len: usize) -> String {
    let text = geometry.wkt_string();
    if text.chars().count() <= max_len {
        return text;
    }
    let mut short: String = text.chars().take(max_len).collect();
    short.push_str("...");
    short
}
