use crate::region::{is_blank_row, locate_region, Region, RegionError, RegionSpec};
use crate::repair::{apply_gain_loss_sign, GainLossSign};
use crate::table::{read_table, TableError, TableKind};
use models::{CanonicalRecord, SourceFormat, StatementFile};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("{format} {file}: start marker '{marker}' not found")]
    RegionNotFound {
        file: String,
        format: SourceFormat,
        marker: &'static str,
    },
    #[error("{format} {file}: {reason}")]
    Parse {
        file: String,
        format: SourceFormat,
        reason: ParseFailure,
    },
    #[error("{format} {file}: {source}")]
    Table {
        file: String,
        format: SourceFormat,
        #[source]
        source: TableError,
    },
    #[error("{format} {file}: cannot read file: {source}")]
    Unreadable {
        file: String,
        format: SourceFormat,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("data region is empty or inverted (skip {skip_top} from top, {skip_bottom} from bottom of {total} rows)")]
    EmptyRegion {
        skip_top: usize,
        skip_bottom: usize,
        total: usize,
    },
    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),
}

impl StatementError {
    pub fn file(&self) -> &str {
        match self {
            StatementError::RegionNotFound { file, .. }
            | StatementError::Parse { file, .. }
            | StatementError::Table { file, .. }
            | StatementError::Unreadable { file, .. } => file,
        }
    }

    pub fn format(&self) -> SourceFormat {
        match self {
            StatementError::RegionNotFound { format, .. }
            | StatementError::Parse { format, .. }
            | StatementError::Table { format, .. }
            | StatementError::Unreadable { format, .. } => *format,
        }
    }
}

/// A file after table reading and region location, as handed to an adapter.
#[derive(Debug, Clone, Copy)]
pub struct Statement<'a> {
    pub file: &'a StatementFile,
    pub format: SourceFormat,
    pub rows: &'a [Vec<String>],
    pub region: Region,
}

impl<'a> Statement<'a> {
    pub fn header(&self) -> &'a [String] {
        self.line(self.region.header_index())
    }

    /// Non-blank rows between the header and the footer.
    pub fn body(&self) -> Vec<&'a [String]> {
        let kept = self.region.slice(self.rows);
        kept.iter()
            .skip(1)
            .map(|row| row.as_slice())
            .filter(|row| !is_blank_row(row))
            .collect()
    }

    /// Any line of the file, including banner lines above the region.
    pub fn line(&self, idx: usize) -> &'a [String] {
        self.rows.get(idx).map(|row| row.as_slice()).unwrap_or(&[])
    }

    pub fn parse_error(&self, reason: ParseFailure) -> StatementError {
        StatementError::Parse {
            file: self.file.name.clone(),
            format: self.format,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    pub records: Vec<CanonicalRecord>,
    pub table: TableKind,
}

/// One brokerage export layout.
pub trait StatementParser {
    fn format(&self) -> SourceFormat;

    fn region_spec(&self) -> RegionSpec;

    /// Whether the dollar gain/loss column is signed or a bare magnitude.
    fn gain_loss_sign(&self) -> GainLossSign {
        GainLossSign::Signed
    }

    /// Maps the located rows onto canonical records and applies the format's repairs.
    fn extract(&self, statement: &Statement<'_>) -> Result<Vec<CanonicalRecord>, StatementError>;

    fn parse(&self, file: &StatementFile) -> Result<ParsedStatement, StatementError> {
        let format = self.format();
        let table = read_table(file).map_err(|source| StatementError::Table {
            file: file.name.clone(),
            format,
            source,
        })?;

        let region = locate_region(&table.rows, &self.region_spec()).map_err(|err| match err {
            RegionError::StartNotFound(marker) => StatementError::RegionNotFound {
                file: file.name.clone(),
                format,
                marker,
            },
            RegionError::Empty {
                skip_top,
                skip_bottom,
                total,
            } => StatementError::Parse {
                file: file.name.clone(),
                format,
                reason: ParseFailure::EmptyRegion {
                    skip_top,
                    skip_bottom,
                    total,
                },
            },
        })?;

        let statement = Statement {
            file,
            format,
            rows: &table.rows,
            region,
        };
        let mut records = self.extract(&statement)?;
        let sign = self.gain_loss_sign();
        for record in &mut records {
            apply_gain_loss_sign(record, sign);
        }

        debug!(
            file = %file.name,
            %format,
            skip_top = region.skip_top,
            skip_bottom = region.skip_bottom,
            records = records.len(),
            "statement parsed"
        );
        Ok(ParsedStatement {
            records,
            table: table.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{first_cell, EndMarker, StartMarker};
    use crate::table::cell;

    struct TwoColumns;

    fn is_header(row: &[String]) -> bool {
        first_cell(row) == "Symbol"
    }

    fn is_total(row: &[String]) -> bool {
        first_cell(row) == "Total"
    }

    impl StatementParser for TwoColumns {
        fn format(&self) -> SourceFormat {
            SourceFormat::Schwab
        }

        fn region_spec(&self) -> RegionSpec {
            RegionSpec {
                start: StartMarker::Header {
                    label: "Symbol",
                    matches: is_header,
                    fallback: None,
                },
                end: EndMarker::FromTop(is_total),
            }
        }

        fn gain_loss_sign(&self) -> GainLossSign {
            GainLossSign::MagnitudeOnly
        }

        fn extract(&self, statement: &Statement<'_>) -> Result<Vec<CanonicalRecord>, StatementError> {
            if statement.header().len() < 3 {
                return Err(statement.parse_error(ParseFailure::MissingColumn("Gain %")));
            }
            Ok(statement
                .body()
                .into_iter()
                .map(|row| CanonicalRecord {
                    symbol: Some(cell(row, 0).to_string()),
                    total_gain_loss_dollar: crate::clean_number(cell(row, 1)),
                    total_gain_loss_percent: crate::clean_number(cell(row, 2)),
                    ..CanonicalRecord::new(first_cell(statement.line(0)))
                })
                .collect())
        }
    }

    #[test]
    fn test_parse_applies_region_and_sign() {
        let file = StatementFile::new(
            "acct.csv",
            "Acct 1\nSymbol,Gain $,Gain %\nABC,50,-5%\n,,\nXYZ,10,2%\nTotal,60,\n",
        );
        let parsed = TwoColumns.parse(&file).unwrap();
        assert_eq!(parsed.table, TableKind::Delimited);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].account, "Acct 1");
        assert_eq!(parsed.records[0].total_gain_loss_dollar, Some(-50.0));
        assert_eq!(parsed.records[1].total_gain_loss_dollar, Some(10.0));
    }

    #[test]
    fn test_parse_reports_missing_marker() {
        let file = StatementFile::new("acct.csv", "nothing,here\n");
        let err = TwoColumns.parse(&file).unwrap_err();
        assert!(matches!(
            err,
            StatementError::RegionNotFound { marker: "Symbol", .. }
        ));
        assert_eq!(err.file(), "acct.csv");
        assert_eq!(err.format(), SourceFormat::Schwab);
    }

    #[test]
    fn test_parse_reports_missing_column() {
        let file = StatementFile::new("acct.csv", "Symbol,Gain $\nABC,1\n");
        let err = TwoColumns.parse(&file).unwrap_err();
        assert!(matches!(
            err,
            StatementError::Parse {
                reason: ParseFailure::MissingColumn("Gain %"),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_reports_unreadable_file() {
        let file = StatementFile::new("empty.csv", "");
        let err = TwoColumns.parse(&file).unwrap_err();
        assert!(matches!(err, StatementError::Table { .. }));
    }
}
