//! Delimited sheet exports as rows of string cells.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::config::IngestConfig;
use crate::error::{Error, Result};

/// Reads a CSV (or other single-byte delimited) export of the upload sheet.
///
/// Records may have different lengths; quoted cells may span lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSource {
    delimiter: u8,
    has_headers: bool,
}

impl Default for RowSource {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: false,
        }
    }
}

impl From<&IngestConfig> for RowSource {
    fn from(config: &IngestConfig) -> Self {
        Self {
            delimiter: u8::try_from(config.delimiter).unwrap_or(b','),
            has_headers: config.has_headers,
        }
    }
}

impl RowSource {
    /// Create a reader with an explicit delimiter and header setting.
    #[must_use]
    pub fn new(delimiter: u8, has_headers: bool) -> Self {
        Self {
            delimiter,
            has_headers,
        }
    }

    /// Read every row of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowSource`] if the file cannot be opened or is not
    /// valid delimited UTF-8.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<Vec<Vec<String>>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::RowSource {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        self.read(file, path)
    }

    /// Read every row from `reader`. `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowSource`] on malformed input.
    pub fn read<R: Read>(&self, reader: R, origin: &Path) -> Result<Vec<Vec<String>>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .flexible(true)
            .from_reader(reader);

        let rows = csv_reader
            .records()
            .map(|record| {
                record
                    .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                    .map_err(|source| Error::RowSource {
                        path: origin.to_path_buf(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(rows = rows.len(), origin = %origin.display(), "read sheet rows");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_flexible_rows() {
        let data = "Moscow,SHR-RA1-ZZZZ0800,IDEP,ATA 0900\nTver,SHR-RA2\n";
        let rows = RowSource::default()
            .read(data.as_bytes(), Path::new("inline"))
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["Moscow", "SHR-RA1-ZZZZ0800", "IDEP", "ATA 0900"]);
        assert_eq!(rows[1], ["Tver", "SHR-RA2"]);
    }

    #[test]
    fn test_quoted_cell_spans_lines() {
        let data = "Moscow,\"(SHR-RA1\n-ZZZZ0800)\"\n";
        let rows = RowSource::default()
            .read(data.as_bytes(), Path::new("inline"))
            .unwrap();
        assert_eq!(rows[0][1], "(SHR-RA1\n-ZZZZ0800)");
    }

    #[test]
    fn test_headers_and_delimiter() {
        let data = "region;shr\nMoscow;SHR-X\n";
        let rows = RowSource::new(b';', true)
            .read(data.as_bytes(), Path::new("inline"))
            .unwrap();
        assert_eq!(rows, vec![vec!["Moscow".to_string(), "SHR-X".to_string()]]);
    }

    #[test]
    fn test_from_config() {
        let config = IngestConfig {
            delimiter: '\t',
            has_headers: true,
            ..IngestConfig::default()
        };
        assert_eq!(RowSource::from(&config), RowSource::new(b'\t', true));
    }

    #[test]
    fn test_read_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Moscow,SHR-RA1-ZZZZ0800-M0100").unwrap();

        let rows = RowSource::default().read_path(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "Moscow");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RowSource::default()
            .read_path(dir.path().join("absent.csv"))
            .unwrap_err();
        assert!(matches!(err, Error::RowSource { .. }));
    }

    #[test]
    fn test_invalid_utf8() {
        let data: &[u8] = b"Moscow,\xff\xfe\n";
        let err = RowSource::default()
            .read(data, Path::new("bad.csv"))
            .unwrap_err();
        assert!(err.to_string().contains("bad.csv"));
    }
}
