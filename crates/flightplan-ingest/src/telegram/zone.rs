//! Flight-zone coordinate extraction.

use tracing::trace;

use crate::message::LonLat;

use super::normalize::normalize_coord;
use super::patterns::COORDINATE;
use super::{FieldWarning, TelegramField};

/// Marker introducing a zone description inside a segment.
const ZONE_MARKER: &str = "/ZONA";

/// Boundary points of a declared flight zone, in telegram order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Zone {
    /// Normalized coordinate strings.
    pub coords: Vec<String>,
    /// Decimal positions, aligned with `coords`.
    pub positions: Vec<LonLat>,
}

impl Zone {
    /// Extract the zone from the first segment that carries `/ZONA`.
    ///
    /// Points that fail to normalize are skipped and reported in `warnings`.
    pub fn extract(segments: &[&str], warnings: &mut Vec<FieldWarning>) -> Self {
        let mut zone = Self::default();

        let Some(segment) = segments.iter().find(|s| s.contains(ZONE_MARKER)) else {
            return zone;
        };
        trace!(segment, "found zone segment");

        for token in COORDINATE.find_iter(segment) {
            match normalize_coord(token.as_str()) {
                Ok(coord) => {
                    zone.coords.push(coord.normalized);
                    zone.positions.push(coord.position);
                }
                Err(error) => warnings.push(FieldWarning::new(TelegramField::Zone, error)),
            }
        }

        trace!(points = zone.coords.len(), "zone coordinates extracted");
        zone
    }

    /// True if no point was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    #[test]
    fn test_extracts_points_in_order() {
        let segments = ["SHR", "M0015/M0030/ZONA5530N03730E5531N03731E5532N03732E"];
        let mut warnings = Vec::new();
        let zone = Zone::extract(&segments, &mut warnings);

        assert_eq!(
            zone.coords,
            ["553000N0373000E", "553100N0373100E", "553200N0373200E"]
        );
        assert_eq!(zone.positions.len(), 3);
        assert!((zone.positions[0].lat - 55.5).abs() < 1e-9);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_skips_bad_points_individually() {
        let segments = ["M0030/ZONA5530N03730E9130N03730E5532N03732E"];
        let mut warnings = Vec::new();
        let zone = Zone::extract(&segments, &mut warnings);

        assert_eq!(zone.coords, ["553000N0373000E", "553200N0373200E"]);
        assert_eq!(zone.positions.len(), zone.coords.len());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, TelegramField::Zone);
        assert!(matches!(
            warnings[0].error,
            FieldError::LatitudeOutOfRange { .. }
        ));
    }

    #[test]
    fn test_only_first_zone_segment_used() {
        let segments = ["/ZONA5530N03730E", "/ZONA5531N03731E"];
        let mut warnings = Vec::new();
        let zone = Zone::extract(&segments, &mut warnings);
        assert_eq!(zone.coords, ["553000N0373000E"]);
    }

    #[test]
    fn test_no_zone_segment() {
        let segments = ["SHR", "RA1234", "ZZZZ0800", "M0100"];
        let mut warnings = Vec::new();
        let zone = Zone::extract(&segments, &mut warnings);
        assert!(zone.is_empty());
        assert!(warnings.is_empty());
    }
}
