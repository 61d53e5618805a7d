//! Compiled telegram patterns.
//!
//! Every regex here is built once on first use and shared read-only by all
//! batches for the lifetime of the process.

use once_cell::sync::Lazy;
use regex::Regex;

/// Coordinate token: `ddmm[ss]` + `N|S` + `dddmm[ss]` + `E|W`.
pub(crate) static COORDINATE: Lazy<Regex> =
    Lazy::new(|| compile(r"(\d{4,6})([NS])(\d{5,7})([EW])"));

/// Altitude block: optional `K####`, `M####`, optional `/M####`.
pub(crate) static ALTITUDE: Lazy<Regex> = Lazy::new(|| compile(r"(K\d{4})?M(\d{4})(/M(\d{4}))?"));

/// Any `XXX/` marker in the field-18 tail.
pub(crate) static MARKER: Lazy<Regex> = Lazy::new(|| compile(r"([A-Z]+)/"));

/// A named field-18 item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field18Key {
    /// `DOF/` date of flight.
    Dof,
    /// `DEP/` departure coordinate.
    Dep,
    /// `DEST/` destination coordinate.
    Dest,
    /// `SID/` message identifier.
    Sid,
    /// `OPR/` operator.
    Opr,
    /// `REG/` registration.
    Reg,
    /// `TYP/` aircraft type.
    Typ,
    /// `RMK/` remarks.
    Rmk,
}

impl Field18Key {
    /// The marker as it appears in the telegram, e.g. `DEST/`.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Dof => "DOF/",
            Self::Dep => "DEP/",
            Self::Dest => "DEST/",
            Self::Sid => "SID/",
            Self::Opr => "OPR/",
            Self::Reg => "REG/",
            Self::Typ => "TYP/",
            Self::Rmk => "RMK/",
        }
    }
}

impl std::fmt::Display for Field18Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.marker())
    }
}

/// Markers that appear in real telegrams but carry nothing we store.
pub(crate) const KNOWN_UNUSED_MARKERS: &[&str] = &["STS", "EET"];

/// A field-18 key and the pattern whose first group is its value.
#[derive(Debug)]
pub struct FieldPattern {
    /// Which field this pattern extracts.
    pub key: Field18Key,
    regex: Regex,
}

impl FieldPattern {
    fn new(key: Field18Key, pattern: &str) -> Self {
        Self {
            key,
            regex: compile(pattern),
        }
    }

    /// First captured value in `text`, trimmed.
    #[must_use]
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }
}

/// The fixed field-18 table, evaluated independently against the same text.
pub(crate) static FIELD18: Lazy<Vec<FieldPattern>> = Lazy::new(|| {
    vec![
        FieldPattern::new(Field18Key::Dof, r"DOF/(\d{6})"),
        FieldPattern::new(Field18Key::Dep, r"DEP/([0-9]+[NS][0-9]+[EW])"),
        FieldPattern::new(Field18Key::Dest, r"DEST/([0-9]+[NS][0-9]+[EW])"),
        FieldPattern::new(Field18Key::Sid, r"SID/(\d+)"),
        FieldPattern::new(Field18Key::Opr, r"OPR/([^A-Z/]+)"),
        FieldPattern::new(Field18Key::Reg, r"REG/([^A-Z/]+)"),
        FieldPattern::new(Field18Key::Typ, r"TYP/([A-Z]+)"),
        FieldPattern::new(Field18Key::Rmk, r"RMK/([^A-Z/]+)"),
    ]
});

/// Compile a pattern literal.
///
/// # Panics
///
/// Panics if the pattern is invalid. Only called with the literals above.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid regex pattern")
}
