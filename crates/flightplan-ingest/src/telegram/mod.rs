//! Flight-plan telegram parsing.
//!
//! This module turns the free-form text of an SHR departure telegram, plus an
//! optional IARR arrival report, into a [`ParsedMessage`]:
//!
//! - **Normalizers** convert `hhmm` times, `yymmdd` dates and
//!   `ddmm[ss]N dddmm[ss]E` coordinates into canonical values.
//! - **Tokenizer** splits the SHR string on `-` and reads the positional
//!   segments (registration, departure time, altitude block, EET).
//! - **Field-18** pulls `DOF/`, `DEP/`, `DEST/`, `SID/`, `OPR/`, `REG/`,
//!   `TYP/`, `RMK/` out of the free-text tail.
//! - **Zone** collects the boundary points that follow a `/ZONA` marker.
//!
//! Only a broken telegram frame is fatal ([`FormatError`]). A field that does
//! not normalize is left empty and reported as a [`FieldWarning`].
//!
//! # Example
//!
//! ```
//! use flightplan_ingest::telegram::assemble;
//!
//! let shr = "SHR-RA1234-ZZZZ0800-M0100-DOF/240615 DEP/5530N03730E SID/12345";
//! let parsed = assemble("Moscow", shr, Some("IARR-ATA 0900-X")).unwrap();
//!
//! assert_eq!(parsed.message.atd, "08:00");
//! assert_eq!(parsed.message.ata, "09:00");
//! assert!(parsed.message.is_valid());
//! ```
//!
//! [`ParsedMessage`]: crate::message::ParsedMessage
//! [`FormatError`]: crate::error::FormatError

mod assemble;
mod field18;
mod normalize;
mod patterns;
mod shr;
mod zone;

pub use assemble::{arrival_time, assemble};
pub use field18::Field18;
pub use normalize::{normalize_coord, normalize_date, normalize_time, Coordinate};
pub use patterns::Field18Key;
pub use shr::parse_shr;
pub use zone::Zone;

use crate::error::FieldError;
use crate::message::ParsedMessage;

/// The telegram field a [`FieldWarning`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelegramField {
    /// Departure time (SHR segment 2).
    Atd,
    /// Provisional arrival time from the EET segment.
    Eet,
    /// Arrival time from the IARR report.
    Ata,
    /// `DOF/` date of flight.
    Dof,
    /// `DEP/` departure coordinate.
    Dep,
    /// `DEST/` destination coordinate.
    Dest,
    /// A `/ZONA` boundary point.
    Zone,
}

impl std::fmt::Display for TelegramField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Atd => write!(f, "atd"),
            Self::Eet => write!(f, "eet"),
            Self::Ata => write!(f, "ata"),
            Self::Dof => write!(f, "dof"),
            Self::Dep => write!(f, "dep"),
            Self::Dest => write!(f, "dest"),
            Self::Zone => write!(f, "zone"),
        }
    }
}

/// A field that was present but did not normalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWarning {
    /// Which field.
    pub field: TelegramField,
    /// Why it was rejected.
    pub error: FieldError,
}

impl FieldWarning {
    /// Create a new warning.
    #[must_use]
    pub fn new(field: TelegramField, error: FieldError) -> Self {
        Self { field, error }
    }
}

impl std::fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// Result of parsing one telegram pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTelegram {
    /// The assembled message.
    pub message: ParsedMessage,
    /// Fields that were dropped.
    pub warnings: Vec<FieldWarning>,
    /// Field-18 markers that nothing consumed.
    pub ignored_markers: Vec<String>,
}
