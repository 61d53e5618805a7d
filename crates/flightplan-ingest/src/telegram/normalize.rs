//! Field normalizers.
//!
//! Pure functions turning raw telegram substrings into canonical values:
//! `hhmm` → `HH:MM`, `yymmdd` → `YYYY-MM-DD`, and `ddmm[ss]N dddmm[ss]E`
//! coordinates → a zero-padded string plus a decimal position.

use chrono::NaiveDate;

use crate::error::FieldError;
use crate::message::LonLat;

use super::patterns::COORDINATE;

/// A normalized coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    /// Zero-padded `ddmmss[NS]dddmmss[EW]`.
    pub normalized: String,
    /// Decimal position.
    pub position: LonLat,
}

fn all_digits(raw: &str, len: usize) -> bool {
    raw.len() == len && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Value of an all-digit ASCII string.
fn digits_value(s: &str) -> u32 {
    s.bytes()
        .fold(0, |acc, b| acc * 10 + u32::from(b.wrapping_sub(b'0')))
}

/// Normalize an `hhmm` time to `HH:MM`.
///
/// # Errors
///
/// Fails unless `raw` is exactly four ASCII digits forming a time between
/// `00:00` and `23:59`.
pub fn normalize_time(raw: &str) -> Result<String, FieldError> {
    if !all_digits(raw, 4) {
        return Err(FieldError::InvalidTime {
            raw: raw.to_string(),
        });
    }

    let hour = digits_value(&raw[..2]);
    let minute = digits_value(&raw[2..]);
    if hour > 23 || minute > 59 {
        return Err(FieldError::TimeOutOfRange {
            raw: raw.to_string(),
        });
    }

    Ok(format!("{hour:02}:{minute:02}"))
}

/// Normalize a `yymmdd` date to `20yy-mm-dd`.
///
/// # Errors
///
/// Fails unless `raw` is exactly six ASCII digits naming an existing
/// calendar day.
pub fn normalize_date(raw: &str) -> Result<String, FieldError> {
    if !all_digits(raw, 6) {
        return Err(FieldError::InvalidDate {
            raw: raw.to_string(),
        });
    }

    let (yy, mm, dd) = (&raw[..2], &raw[2..4], &raw[4..]);
    let year = 2000 + i32::try_from(digits_value(yy)).unwrap_or_default();
    if NaiveDate::from_ymd_opt(year, digits_value(mm), digits_value(dd)).is_none() {
        return Err(FieldError::NonexistentDate {
            raw: raw.to_string(),
        });
    }

    Ok(format!("20{yy}-{mm}-{dd}"))
}

/// Pad degree-minute digits to `width` by adding seconds.
///
/// `width - 2` digits get `00` appended; `width - 1` digits get a `0`
/// inserted before the last two.
fn pad_dms(digits: &str, width: usize) -> String {
    match width - digits.len() {
        2 => format!("{digits}00"),
        1 => {
            let split = digits.len() - 2;
            format!("{}0{}", &digits[..split], &digits[split..])
        }
        _ => digits.to_string(),
    }
}

/// Decimal degrees from `d…dmmss` digits with `deg_len` degree digits.
fn dms_to_decimal(dms: &str, deg_len: usize) -> f64 {
    let degrees = f64::from(digits_value(&dms[..deg_len]));
    let minutes = f64::from(digits_value(&dms[deg_len..deg_len + 2]));
    let seconds = f64::from(digits_value(&dms[deg_len + 2..deg_len + 4]));
    degrees + minutes / 60.0 + seconds / 3600.0
}

/// Normalize a telegram coordinate.
///
/// Latitude digits are padded to `ddmmss` and longitude digits to `dddmmss`.
///
/// # Errors
///
/// Fails if `raw` contains no coordinate token or if the decimal latitude or
/// longitude is out of range.
pub fn normalize_coord(raw: &str) -> Result<Coordinate, FieldError> {
    let caps = COORDINATE
        .captures(raw)
        .ok_or_else(|| FieldError::InvalidCoordinate {
            raw: raw.to_string(),
        })?;
    let (lat_digits, ns, lon_digits, ew) = (&caps[1], &caps[2], &caps[3], &caps[4]);

    let lat_str = pad_dms(lat_digits, 6);
    let lon_str = pad_dms(lon_digits, 7);

    let mut lat = dms_to_decimal(&lat_str, 2);
    if ns == "S" {
        lat = -lat;
    }
    if lat.abs() > 90.0 {
        return Err(FieldError::LatitudeOutOfRange {
            raw: raw.to_string(),
        });
    }

    let mut lon = dms_to_decimal(&lon_str, 3);
    if ew == "W" {
        lon = -lon;
    }
    if lon.abs() > 180.0 {
        return Err(FieldError::LongitudeOutOfRange {
            raw: raw.to_string(),
        });
    }

    Ok(Coordinate {
        normalized: format!("{lat_str}{ns}{lon_str}{ew}"),
        position: LonLat::new(lon, lat),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_time_every_valid_clock_value() {
        for h in 0..24 {
            for m in 0..60 {
                let raw = format!("{h:02}{m:02}");
                assert_eq!(normalize_time(&raw).unwrap(), format!("{h:02}:{m:02}"));
            }
        }
    }

    #[test]
    fn test_time_out_of_range() {
        for raw in ["2400", "2360", "9999", "0060"] {
            assert!(
                matches!(normalize_time(raw), Err(FieldError::TimeOutOfRange { .. })),
                "{raw} should be out of range"
            );
        }
    }

    #[test]
    fn test_time_wrong_shape() {
        for raw in ["", "800", "08000", "08:0", "0a00", " 800", "０８００"] {
            assert!(
                matches!(normalize_time(raw), Err(FieldError::InvalidTime { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_date_valid() {
        assert_eq!(normalize_date("240615").unwrap(), "2024-06-15");
        assert_eq!(normalize_date("240229").unwrap(), "2024-02-29");
        assert_eq!(normalize_date("000101").unwrap(), "2000-01-01");
    }

    #[test]
    fn test_date_nonexistent() {
        for raw in ["250230", "250229", "240431", "241301", "240600"] {
            assert!(
                matches!(normalize_date(raw), Err(FieldError::NonexistentDate { .. })),
                "{raw} should not exist"
            );
        }
    }

    #[test]
    fn test_date_wrong_shape() {
        for raw in ["24061", "2406150", "24-06-1", "abcdef"] {
            assert!(matches!(
                normalize_date(raw),
                Err(FieldError::InvalidDate { .. })
            ));
        }
    }

    #[test]
    fn test_coord_short_form() {
        let coord = normalize_coord("5530N03730E").unwrap();
        assert_eq!(coord.normalized, "553000N0373000E");
        assert!(approx(coord.position.lon, 37.5));
        assert!(approx(coord.position.lat, 55.5));
    }

    #[test]
    fn test_coord_full_form() {
        let coord = normalize_coord("554530N0373015E").unwrap();
        assert_eq!(coord.normalized, "554530N0373015E");
        assert!(approx(coord.position.lat, 55.0 + 45.0 / 60.0 + 30.0 / 3600.0));
        assert!(approx(coord.position.lon, 37.0 + 30.0 / 60.0 + 15.0 / 3600.0));
    }

    #[test]
    fn test_coord_odd_lengths_get_zero_inserted() {
        let coord = normalize_coord("55301N037301E").unwrap();
        assert_eq!(coord.normalized, "553001N0373001E");
    }

    #[test]
    fn test_coord_southern_western_negated() {
        let coord = normalize_coord("3330S07040W").unwrap();
        assert!(approx(coord.position.lat, -33.5));
        assert!(approx(coord.position.lon, -(70.0 + 40.0 / 60.0)));
    }

    #[test]
    fn test_coord_out_of_range() {
        assert!(matches!(
            normalize_coord("9100N03730E"),
            Err(FieldError::LatitudeOutOfRange { .. })
        ));
        assert!(matches!(
            normalize_coord("5530N18100E"),
            Err(FieldError::LongitudeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_coord_boundaries_accepted() {
        let coord = normalize_coord("9000N18000W").unwrap();
        assert!(approx(coord.position.lat, 90.0));
        assert!(approx(coord.position.lon, -180.0));
    }

    #[test]
    fn test_coord_rejects_garbage() {
        for raw in ["", "5530X03730E", "553N03730E", "5530N0373E"] {
            assert!(matches!(
                normalize_coord(raw),
                Err(FieldError::InvalidCoordinate { .. })
            ));
        }
    }
}
