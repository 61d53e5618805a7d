//! Batch ingestion of spreadsheet rows.
//!
//! An [`Ingestor`] walks the rows of one upload strictly in order. Each row
//! ends in exactly one [`RowOutcome`]:
//!
//! ```text
//! Unparsed ─┬─> Skipped                      (short row, blank region/SHR)
//!           ├─> FormatRejected               (broken SHR frame)
//!           └─> assembled ─┬─> DuplicateRejected
//!                          └─> classified ─┬─> Persisted
//!                                          ├─> PersistFailed
//!                                          └─> Invalid
//! ```
//!
//! Only `Persisted` counts as valid. The dedup set and the counters live on
//! the stack of one [`Ingestor::ingest`] call, so separate batches never share
//! state.

mod dispatch;
mod sink;

pub use dispatch::{BatchDispatcher, BatchHandle};
pub use sink::{MessageSink, PersistError};

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::IngestConfig;
use crate::error::FormatError;
use crate::telegram::assemble;

/// Which cells of a row hold the region, SHR and IARR text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Region label column.
    pub region: usize,
    /// SHR telegram column.
    pub shr: usize,
    /// IARR report column, if the sheet has one.
    pub iarr: Option<usize>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            region: 0,
            shr: 1,
            iarr: Some(3),
        }
    }
}

impl From<&IngestConfig> for ColumnLayout {
    fn from(config: &IngestConfig) -> Self {
        Self {
            region: config.region_column,
            shr: config.shr_column,
            iarr: config.iarr_column,
        }
    }
}

/// Normalize cell whitespace.
///
/// Line breaks are dropped, other whitespace runs collapse to one space.
#[must_use]
pub fn clean_cell(raw: &str) -> String {
    raw.replace(['\n', '\r'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Terminal state of one row.
#[derive(Debug, PartialEq, Eq)]
pub enum RowOutcome {
    /// Too few cells, or an empty region/SHR cell.
    Skipped,
    /// The SHR telegram frame was broken.
    FormatRejected(FormatError),
    /// An earlier row in the batch had the same dedup key.
    DuplicateRejected {
        /// The repeated `sid + dof + atd` key.
        key: String,
    },
    /// A required field is empty.
    Invalid {
        /// Names of the empty required fields.
        missing: Vec<&'static str>,
    },
    /// Handed to the sink successfully.
    Persisted,
    /// The sink refused the message.
    PersistFailed {
        /// The sink's error message.
        reason: String,
    },
}

impl RowOutcome {
    /// True only for rows that were persisted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// Aggregate counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Rows persisted.
    pub valid: u32,
    /// Rows that failed for any reason.
    pub errors: u32,
    /// Short or blank rows.
    pub skipped: u32,
    /// Rows with a broken SHR frame.
    pub malformed: u32,
    /// Repeated dedup keys.
    pub duplicates: u32,
    /// Messages missing a required field.
    pub incomplete: u32,
    /// Valid messages the sink refused.
    pub persist_failed: u32,
}

impl IngestReport {
    /// Tally one row.
    pub fn record(&mut self, outcome: &RowOutcome) {
        let bucket = match outcome {
            RowOutcome::Persisted => {
                self.valid += 1;
                return;
            }
            RowOutcome::Skipped => &mut self.skipped,
            RowOutcome::FormatRejected(_) => &mut self.malformed,
            RowOutcome::DuplicateRejected { .. } => &mut self.duplicates,
            RowOutcome::Invalid { .. } => &mut self.incomplete,
            RowOutcome::PersistFailed { .. } => &mut self.persist_failed,
        };
        *bucket += 1;
        self.errors += 1;
    }

    /// `(valid_count, error_count)`.
    #[must_use]
    pub fn counts(&self) -> (u32, u32) {
        (self.valid, self.errors)
    }

    /// Number of rows visited.
    #[must_use]
    pub fn total_rows(&self) -> u32 {
        self.valid + self.errors
    }
}

/// Sequential row processor for one batch.
#[derive(Debug)]
pub struct Ingestor<S> {
    sink: S,
    layout: ColumnLayout,
}

impl<S: MessageSink> Ingestor<S> {
    /// Create an ingestor writing to `sink`.
    #[must_use]
    pub fn new(sink: S, layout: ColumnLayout) -> Self {
        Self { sink, layout }
    }

    /// Give back the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process every row in order and return the batch counts.
    ///
    /// Row failures never abort the batch; each one is counted in
    /// [`IngestReport::errors`].
    pub fn ingest<I, R, C>(&mut self, rows: I) -> IngestReport
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[C]>,
        C: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut report = IngestReport::default();

        for (index, row) in rows.into_iter().enumerate() {
            let outcome = self.process_row(index + 1, row.as_ref(), &mut seen);
            report.record(&outcome);
        }

        info!(
            valid = report.valid,
            errors = report.errors,
            duplicates = report.duplicates,
            "batch ingested"
        );
        report
    }

    fn process_row<C: AsRef<str>>(
        &mut self,
        row: usize,
        cells: &[C],
        seen: &mut HashSet<String>,
    ) -> RowOutcome {
        if cells.len() < 2 {
            trace!(row, cells = cells.len(), "row too short");
            return RowOutcome::Skipped;
        }

        let cell = |index: usize| cells.get(index).map(|c| clean_cell(c.as_ref()));
        let region = cell(self.layout.region).unwrap_or_default();
        let shr = cell(self.layout.shr).unwrap_or_default();
        if region.is_empty() || shr.is_empty() {
            trace!(row, "blank region or SHR cell");
            return RowOutcome::Skipped;
        }
        let iarr = self.layout.iarr.and_then(cell);

        trace!(row, %region, %shr, "processing row");
        let parsed = match assemble(&region, &shr, iarr.as_deref()) {
            Ok(parsed) => parsed,
            Err(error) => {
                debug!(row, %error, "rejected telegram");
                return RowOutcome::FormatRejected(error);
            }
        };
        for warning in &parsed.warnings {
            debug!(row, %warning, "field dropped");
        }
        let message = parsed.message;

        let key = message.dedup_key();
        if seen.contains(&key) {
            debug!(row, %key, "duplicate row");
            return RowOutcome::DuplicateRejected { key };
        }
        seen.insert(key);

        let missing = message.missing_required();
        if !missing.is_empty() {
            debug!(row, sid = %message.sid, ?missing, "message incomplete");
            return RowOutcome::Invalid { missing };
        }

        let sid = message.sid.clone();
        match self.sink.save_message(message) {
            Ok(()) => RowOutcome::Persisted,
            Err(error) => {
                warn!(row, %sid, %error, "failed to save message");
                RowOutcome::PersistFailed {
                    reason: error.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ParsedMessage;

    const SHR: &str =
        "SHR-RA1234-ZZZZ0800-M0100-DOF/240615 DEP/5530N03730E DEST/5540N03800E SID/12345";

    #[derive(Debug, Default)]
    struct RecordingSink {
        saved: Vec<ParsedMessage>,
        fail_sid: Option<String>,
    }

    impl MessageSink for RecordingSink {
        fn save_message(&mut self, message: ParsedMessage) -> Result<(), PersistError> {
            if self.fail_sid.as_deref() == Some(message.sid.as_str()) {
                return Err(PersistError::Unavailable("disk full".to_string()));
            }
            self.saved.push(message);
            Ok(())
        }
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    fn shr_with_sid(sid: &str, atd: &str) -> String {
        format!("SHR-RA1-ZZZZ{atd}-M0100-DOF/240615 DEP/5530N03730E SID/{sid}")
    }

    fn run(rows: Vec<Vec<String>>) -> (IngestReport, RecordingSink) {
        let mut ingestor = Ingestor::new(RecordingSink::default(), ColumnLayout::default());
        let report = ingestor.ingest(rows);
        (report, ingestor.into_sink())
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell("  SHR-\r\nRA1\t\t-ZZZZ0800  "), "SHR-RA1 -ZZZZ0800");
        assert_eq!(clean_cell("ATA   0900"), "ATA 0900");
        assert_eq!(clean_cell(" \n "), "");
    }

    #[test]
    fn test_missing_ata_counts_as_error() {
        let (report, sink) = run(vec![row(&["Moscow", SHR])]);
        assert_eq!(report.counts(), (0, 1));
        assert_eq!(report.incomplete, 1);
        assert!(sink.saved.is_empty());
    }

    #[test]
    fn test_iarr_makes_row_valid() {
        let (report, sink) = run(vec![row(&["Moscow", SHR, "", "IARR-ATA 0900-X"])]);
        assert_eq!(report.counts(), (1, 0));

        let msg = &sink.saved[0];
        assert_eq!(msg.region, "Moscow");
        assert_eq!(msg.dof, "2024-06-15");
        assert_eq!(msg.atd, "08:00");
        assert_eq!(msg.ata, "09:00");
        assert_eq!(msg.dep_coords, "553000N0373000E");
        assert_eq!(msg.sid, "12345");
    }

    #[test]
    fn test_duplicate_rejected_first_wins() {
        let first = shr_with_sid("7", "0800");
        let rows = vec![
            row(&["Moscow", &first, "", "ATA 0900"]),
            row(&["Tver", &first, "", "ATA 1000"]),
        ];
        let (report, sink) = run(rows);

        assert_eq!(report.counts(), (1, 1));
        assert_eq!(report.duplicates, 1);
        assert_eq!(sink.saved.len(), 1);
        assert_eq!(sink.saved[0].region, "Moscow");
    }

    #[test]
    fn test_duplicate_counted_even_when_first_was_invalid() {
        let shr = shr_with_sid("7", "0800");
        let rows = vec![row(&["A", &shr]), row(&["B", &shr, "", "ATA 0900"])];
        let (report, sink) = run(rows);

        assert_eq!(report.incomplete, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.counts(), (0, 2));
        assert!(sink.saved.is_empty());
    }

    #[test]
    fn test_different_atd_is_not_duplicate() {
        let rows = vec![
            row(&["A", &shr_with_sid("7", "0800"), "", "ATA 0900"]),
            row(&["A", &shr_with_sid("7", "0815"), "", "ATA 0900"]),
        ];
        let (report, _) = run(rows);
        assert_eq!(report.counts(), (2, 0));
    }

    #[test]
    fn test_format_error_row() {
        let rows = vec![row(&["Moscow", "IDEP-RA1-ZZZZ0800-M0100", "", "ATA 0900"])];
        let (report, sink) = run(rows);
        assert_eq!(report.counts(), (0, 1));
        assert_eq!(report.malformed, 1);
        assert!(sink.saved.is_empty());
    }

    #[test]
    fn test_format_errors_do_not_enter_dedup_set() {
        let rows = vec![row(&["A", "BAD-1-2"]), row(&["A", "BAD-1-2"])];
        let (report, _) = run(rows);
        assert_eq!(report.malformed, 2);
        assert_eq!(report.duplicates, 0);
    }

    #[test]
    fn test_short_and_blank_rows_skipped() {
        let rows = vec![
            row(&["Moscow"]),
            row(&[]),
            row(&["", SHR]),
            row(&["Moscow", "   "]),
        ];
        let (report, _) = run(rows);
        assert_eq!(report.skipped, 4);
        assert_eq!(report.counts(), (0, 4));
    }

    #[test]
    fn test_persist_failure_does_not_abort_batch() {
        let mut sink = RecordingSink::default();
        sink.fail_sid = Some("2".to_string());
        let mut ingestor = Ingestor::new(sink, ColumnLayout::default());

        let report = ingestor.ingest(vec![
            row(&["A", &shr_with_sid("1", "0800"), "", "ATA 0900"]),
            row(&["A", &shr_with_sid("2", "0800"), "", "ATA 0900"]),
            row(&["A", &shr_with_sid("3", "0800"), "", "ATA 0900"]),
        ]);

        assert_eq!(report.counts(), (2, 1));
        assert_eq!(report.persist_failed, 1);
        let sids: Vec<String> = ingestor.into_sink().saved.into_iter().map(|m| m.sid).collect();
        assert_eq!(sids, ["1", "3"]);
    }

    #[test]
    fn test_rows_persisted_in_order() {
        let rows: Vec<Vec<String>> = (1..=5)
            .map(|i| row(&["A", &shr_with_sid(&i.to_string(), "0800"), "", "ATA 0900"]))
            .collect();
        let (report, sink) = run(rows);
        assert_eq!(report.total_rows(), 5);
        let sids: Vec<&str> = sink.saved.iter().map(|m| m.sid.as_str()).collect();
        assert_eq!(sids, ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_custom_layout() {
        let layout = ColumnLayout {
            region: 2,
            shr: 0,
            iarr: Some(1),
        };
        let mut ingestor = Ingestor::new(RecordingSink::default(), layout);
        let report = ingestor.ingest(vec![row(&[SHR, "ATA 0900", "Moscow"])]);
        assert_eq!(report.counts(), (1, 0));
        assert_eq!(ingestor.into_sink().saved[0].region, "Moscow");
    }

    #[test]
    fn test_layout_without_iarr_column() {
        let layout = ColumnLayout {
            iarr: None,
            ..ColumnLayout::default()
        };
        let mut ingestor = Ingestor::new(RecordingSink::default(), layout);
        let report = ingestor.ingest(vec![row(&["Moscow", SHR, "", "ATA 0900"])]);
        assert_eq!(report.incomplete, 1);
    }

    #[test]
    fn test_report_record_buckets() {
        let mut report = IngestReport::default();
        report.record(&RowOutcome::Persisted);
        report.record(&RowOutcome::Skipped);
        report.record(&RowOutcome::DuplicateRejected { key: "k".into() });
        report.record(&RowOutcome::Invalid {
            missing: vec!["ata"],
        });
        report.record(&RowOutcome::PersistFailed {
            reason: "x".into(),
        });
        report.record(&RowOutcome::FormatRejected(FormatError::TooFewSegments {
            found: 1,
        }));

        assert_eq!(report.counts(), (1, 5));
        assert_eq!(report.skipped, 1);
        assert_eq!(report.malformed, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.incomplete, 1);
        assert_eq!(report.persist_failed, 1);
    }

    #[test]
    fn test_row_outcome_is_valid() {
        assert!(RowOutcome::Persisted.is_valid());
        assert!(!RowOutcome::Skipped.is_valid());
    }

    #[test]
    fn test_layout_from_config() {
        let config = IngestConfig {
            region_column: 4,
            shr_column: 5,
            iarr_column: None,
            ..IngestConfig::default()
        };
        let layout = ColumnLayout::from(&config);
        assert_eq!(layout.region, 4);
        assert_eq!(layout.shr, 5);
        assert_eq!(layout.iarr, None);
    }
}
