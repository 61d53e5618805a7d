//! Message assembly from an SHR telegram and its IARR companion.

use tracing::trace;

use crate::error::FormatError;

use super::normalize::normalize_time;
use super::shr::parse_shr;
use super::{FieldWarning, ParsedTelegram, TelegramField};

/// Segment prefix carrying the actual arrival time. The space is significant.
const ATA_PREFIX: &str = "ATA ";

/// First usable `ATA hhmm` segment of an IARR report.
///
/// Segments whose time does not normalize are reported in `warnings` and the
/// scan moves on.
pub fn arrival_time(iarr: &str, warnings: &mut Vec<FieldWarning>) -> Option<String> {
    for segment in iarr.split('-') {
        let Some(rest) = segment.strip_prefix(ATA_PREFIX) else {
            continue;
        };
        match normalize_time(rest.trim()) {
            Ok(ata) => return Some(ata),
            Err(error) => warnings.push(FieldWarning::new(TelegramField::Ata, error)),
        }
    }
    None
}

/// Build one message from an SHR string, overlaying the IARR arrival time.
///
/// An ATA found in `iarr` replaces whatever the SHR's EET segment supplied.
///
/// # Errors
///
/// Returns a [`FormatError`] if the SHR telegram frame is broken.
pub fn assemble(
    region: &str,
    shr: &str,
    iarr: Option<&str>,
) -> Result<ParsedTelegram, FormatError> {
    let mut parsed = parse_shr(shr, region)?;

    if let Some(iarr) = iarr.filter(|s| !s.is_empty()) {
        if let Some(ata) = arrival_time(iarr, &mut parsed.warnings) {
            trace!(sid = %parsed.message.sid, %ata, "ATA taken from IARR");
            parsed.message.ata = ata;
        }
    }

    Ok(parsed)
}
