use std::collections::HashMap;

use models::{CanonicalRecord, ManualPosition, Settings, SourceFormat, StatementFile};
use tracing::{debug, info, warn};
use utils::{StatementError, StatementParser, TableKind};

use crate::registry::parsers_for;

/// Raw exports per format, as read by the caller.
pub type SourceFiles = HashMap<SourceFormat, Vec<StatementFile>>;

#[derive(Debug, Default)]
pub struct LedgerBuild {
    pub ledger: Vec<CanonicalRecord>,
    /// Files skipped, with the reason.
    pub failures: Vec<StatementError>,
    /// Files that were not spreadsheets and were read as delimited text.
    pub delimited_files: Vec<String>,
    /// Records removed for having no quantity.
    pub dropped: usize,
}

/// Runs the enabled adapters over their files and assembles the ledger.
pub struct LedgerBuilder {
    parsers: Vec<Box<dyn StatementParser>>,
    manual_positions: Vec<ManualPosition>,
}

impl Default for LedgerBuilder {
    fn default() -> Self {
        Self::for_formats(&SourceFormat::ALL)
    }
}

impl LedgerBuilder {
    /// No adapters and no manual positions.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
            manual_positions: Vec::new(),
        }
    }

    pub fn for_formats(formats: &[SourceFormat]) -> Self {
        Self {
            parsers: parsers_for(formats),
            manual_positions: Vec::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::for_formats(&settings.enabled_formats())
            .with_manual_positions(settings.manual_positions.clone())
    }

    /// Adds an adapter, replacing any adapter already registered for its format.
    pub fn with_parser(mut self, parser: Box<dyn StatementParser>) -> Self {
        let format = parser.format();
        match self.parsers.iter().position(|p| p.format() == format) {
            Some(idx) => self.parsers[idx] = parser,
            None => self.parsers.push(parser),
        }
        self
    }

    pub fn with_manual_positions(mut self, positions: Vec<ManualPosition>) -> Self {
        self.manual_positions = positions;
        self
    }

    pub fn without(mut self, format: SourceFormat) -> Self {
        self.parsers.retain(|p| p.format() != format);
        self
    }

    pub fn formats(&self) -> Vec<SourceFormat> {
        self.parsers.iter().map(|p| p.format()).collect()
    }

    pub fn build(&self, files: &SourceFiles) -> LedgerBuild {
        let mut build = LedgerBuild::default();

        // Adapter order, then file name order, keeps "first seen" results reproducible.
        for parser in &self.parsers {
            let format = parser.format();
            let Some(statements) = files.get(&format) else {
                debug!(%format, "no files for format");
                continue;
            };

            let mut ordered: Vec<&StatementFile> = statements.iter().collect();
            ordered.sort_by(|a, b| a.name.cmp(&b.name));

            let mut records = 0;
            for file in ordered {
                match parser.parse(file) {
                    Ok(parsed) => {
                        if parsed.table == TableKind::Delimited {
                            build.delimited_files.push(file.name.clone());
                        }
                        records += parsed.records.len();
                        build.ledger.extend(parsed.records);
                    }
                    Err(err) => {
                        warn!(file = %file.name, %format, error = %err, "skipping statement");
                        build.failures.push(err);
                    }
                }
            }
            info!(%format, files = statements.len(), records, "adapter finished");
        }

        build
            .ledger
            .extend(self.manual_positions.iter().map(ManualPosition::to_record));

        let before = build.ledger.len();
        build.ledger.retain(CanonicalRecord::has_quantity);
        build.dropped = before - build.ledger.len();
        if build.dropped > 0 {
            debug!(dropped = build.dropped, "removed records without a quantity");
        }

        build
    }
}
