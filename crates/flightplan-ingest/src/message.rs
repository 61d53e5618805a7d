//! Core record types for flightplan-ingest.
//!
//! A [`ParsedMessage`] is one flight event built from a single spreadsheet
//! row. It is created fresh per row, handed once to the persistence
//! collaborator and not retained afterwards.

use serde::{Deserialize, Serialize};

/// A decimal position, longitude first.
///
/// Serializes as a `[lon, lat]` array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LonLat {
    /// Longitude in decimal degrees, negative west.
    pub lon: f64,
    /// Latitude in decimal degrees, negative south.
    pub lat: f64,
}

impl LonLat {
    /// Create a position from longitude and latitude.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Check that both components are inside the WGS84 ranges.
    #[must_use]
    pub fn in_range(&self) -> bool {
        self.lat.abs() <= 90.0 && self.lon.abs() <= 180.0
    }
}

impl From<[f64; 2]> for LonLat {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(p: LonLat) -> Self {
        [p.lon, p.lat]
    }
}

/// One flight event parsed from an SHR telegram and its companion IARR.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedMessage {
    /// Source region label, passed through unmodified.
    pub region: String,

    /// Unique flight/message identifier. Required.
    pub sid: String,

    /// Date of flight, `YYYY-MM-DD`.
    pub dof: String,

    /// Actual time of departure, `HH:MM`. Empty if unparsable.
    pub atd: String,

    /// Actual time of arrival, `HH:MM`. Required.
    pub ata: String,

    /// Normalized departure coordinate, `ddmmssNdddmmssE`. Required.
    pub dep_coords: String,

    /// Departure position.
    pub dep_latlon: LonLat,

    /// Normalized arrival coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arr_coords: Option<String>,

    /// Arrival position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arr_latlon: Option<LonLat>,

    /// Normalized flight-zone boundary points, in telegram order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zone_coords: Vec<String>,

    /// Flight-zone boundary positions, aligned with `zone_coords`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zone_latlon: Vec<LonLat>,

    /// Operator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opr: Option<String>,

    /// Registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg: Option<String>,

    /// Aircraft type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Remarks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmk: Option<String>,

    /// Minimum altitude in meters.
    pub min_alt: i32,

    /// Maximum altitude in meters.
    pub max_alt: i32,
}

impl ParsedMessage {
    /// Create an empty message for the given region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// Batch deduplication key: `sid + dof + atd`.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        format!("{}{}{}", self.sid, self.dof, self.atd)
    }

    /// Names of the required fields that are empty.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("sid", &self.sid),
            ("dep_coords", &self.dep_coords),
            ("ata", &self.ata),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// A message is valid when `sid`, `dep_coords` and `ata` are all set.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.sid.is_empty() && !self.dep_coords.is_empty() && !self.ata.is_empty()
    }

    /// BLAKE3 digest identifying this flight event across batches.
    ///
    /// Covers `sid`, `dof`, `atd` and both endpoints.
    #[must_use]
    pub fn storage_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in [
            self.sid.as_str(),
            self.dof.as_str(),
            self.atd.as_str(),
            self.dep_coords.as_str(),
            self.arr_coords.as_deref().unwrap_or(""),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(b"\x1f");
        }
        hasher.finalize().to_hex().to_string()
    }
}
