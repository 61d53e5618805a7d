//! SHR telegram tokenizer.
//!
//! Positional layout after splitting on `-`:
//!
//! | index | content                                  |
//! |-------|------------------------------------------|
//! | 0     | `SHR` marker                             |
//! | 1     | registration (provisional)               |
//! | 2     | `[ZZZZ]hhmm` departure time              |
//! | 3..   | `[K####]M####[/M####]` altitude, `/ZONA` |
//! | 4     | `ZZZZhhmm` EET, used as provisional ATA  |
//! | 5..   | field 18                                 |

use tracing::{debug, trace};

use crate::error::{FieldError, FormatError};
use crate::message::ParsedMessage;

use super::field18::Field18;
use super::normalize::{normalize_coord, normalize_date, normalize_time};
use super::patterns::{Field18Key, ALTITUDE};
use super::zone::Zone;
use super::{FieldWarning, ParsedTelegram, TelegramField};

/// Prefix of an unknown-aerodrome time field.
const ZZZZ: &str = "ZZZZ";

/// Trim, drop enclosing `()"` and remove every space.
fn preprocess(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '(' | ')' | '"'))
        .replace(' ', "")
}

/// Split a cleaned telegram and check its frame.
fn tokenize(cleaned: &str) -> Result<Vec<&str>, FormatError> {
    let segments: Vec<&str> = cleaned.split('-').collect();

    if segments.len() < 3 {
        return Err(FormatError::TooFewSegments {
            found: segments.len(),
        });
    }
    if !segments[0].to_uppercase().contains("SHR") {
        return Err(FormatError::MissingShrMarker {
            segment: segments[0].to_string(),
        });
    }

    Ok(segments)
}

fn departure_time(segment: &str) -> Result<String, FieldError> {
    if let Some(rest) = segment.strip_prefix(ZZZZ) {
        normalize_time(rest)
    } else if segment.len() >= 4 {
        normalize_time(segment)
    } else {
        Err(FieldError::InvalidTime {
            raw: segment.to_string(),
        })
    }
}

fn meters(flight_level: &str) -> i32 {
    flight_level.parse::<i32>().map_or(0, |v| v * 10)
}

/// `(min_alt, max_alt)` from the first altitude block in `segments`.
///
/// With a `/M####` suffix the first `M####` doubles as the minimum; whether
/// the `K####` group should supply the minimum instead is unconfirmed.
fn altitude(segments: &[&str]) -> (i32, i32) {
    for segment in segments {
        if let Some(caps) = ALTITUDE.captures(segment) {
            let first = meters(&caps[2]);
            let bounds = match caps.get(4) {
                Some(second) => (first, meters(second.as_str())),
                None => (0, first),
            };
            trace!(segment, min = bounds.0, max = bounds.1, "parsed altitude");
            return bounds;
        }
    }
    (0, 0)
}

/// Field-18 text: segments 5.. joined, else segment 4 alone.
fn field18_tail(segments: &[&str]) -> String {
    match segments.len() {
        n if n > 5 => segments[5..].join("-"),
        5 => segments[4].to_string(),
        _ => String::new(),
    }
}

/// Parse one SHR telegram.
///
/// # Errors
///
/// Returns a [`FormatError`] if the telegram has fewer than three segments or
/// lacks the `SHR` marker. Individual fields that fail to normalize are left
/// empty and listed in [`ParsedTelegram::warnings`].
pub fn parse_shr(raw: &str, region: &str) -> Result<ParsedTelegram, FormatError> {
    let cleaned = preprocess(raw);
    let segments = tokenize(&cleaned)?;
    trace!(segments = segments.len(), "tokenized SHR");

    let mut msg = ParsedMessage::new(region);
    let mut warnings = Vec::new();

    msg.reg = Some(segments[1].to_string()).filter(|r| !r.is_empty());

    match departure_time(segments[2]) {
        Ok(atd) => msg.atd = atd,
        Err(error) => warnings.push(FieldWarning::new(TelegramField::Atd, error)),
    }

    (msg.min_alt, msg.max_alt) = altitude(&segments[3..]);

    let zone = Zone::extract(&segments, &mut warnings);
    msg.zone_coords = zone.coords;
    msg.zone_latlon = zone.positions;

    if let Some(eet) = segments.get(4).and_then(|s| s.strip_prefix(ZZZZ)) {
        match normalize_time(eet) {
            Ok(ata) => msg.ata = ata,
            Err(error) => warnings.push(FieldWarning::new(TelegramField::Eet, error)),
        }
    }

    let mut f18 = Field18::extract(&field18_tail(&segments));
    trace!(items = f18.len(), "parsed field 18");

    if let Some(dof) = f18.get(Field18Key::Dof) {
        match normalize_date(dof) {
            Ok(date) => msg.dof = date,
            Err(error) => warnings.push(FieldWarning::new(TelegramField::Dof, error)),
        }
    }
    if let Some(dep) = f18.get(Field18Key::Dep) {
        match normalize_coord(dep) {
            Ok(coord) => {
                msg.dep_coords = coord.normalized;
                msg.dep_latlon = coord.position;
            }
            Err(error) => warnings.push(FieldWarning::new(TelegramField::Dep, error)),
        }
    }
    if let Some(dest) = f18.get(Field18Key::Dest) {
        match normalize_coord(dest) {
            Ok(coord) => {
                msg.arr_coords = Some(coord.normalized);
                msg.arr_latlon = Some(coord.position);
            }
            Err(error) => warnings.push(FieldWarning::new(TelegramField::Dest, error)),
        }
    }
    if let Some(sid) = f18.take(Field18Key::Sid) {
        msg.sid = sid;
    }
    if let Some(reg) = f18.take(Field18Key::Reg) {
        msg.reg = Some(reg);
    }
    msg.opr = f18.take(Field18Key::Opr);
    msg.typ = f18.take(Field18Key::Typ);
    msg.rmk = f18.take(Field18Key::Rmk);

    let ignored_markers = f18.ignored().to_vec();
    if !ignored_markers.is_empty() {
        debug!(sid = %msg.sid, markers = ?ignored_markers, "ignored field-18 markers");
    }

    Ok(ParsedTelegram {
        message: msg,
        warnings,
        ignored_markers,
    })
}
