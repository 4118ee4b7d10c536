use models::{CanonicalRecord, SourceFormat};
use tracing::debug;
use utils::{
    cell, first_cell, EndMarker, NumberCleaner, RegionSpec, StartMarker, Statement,
    StatementError, StatementParser,
};

pub const PARSER_NAME: &str = "canaccord";

/// Header line of the holdings export when the title rows are intact.
const HEADER_LINE: usize = 2;

const COL_SYMBOL: usize = 0;
const COL_ACCOUNT: usize = 2;
const COL_DESCRIPTION: usize = 4;
const COL_QUANTITY: usize = 6;
const COL_LAST_PRICE: usize = 7;
const COL_MARKET_VALUE: usize = 12;

fn is_header(row: &[String]) -> bool {
    first_cell(row) == "Symbol"
}

/// Canaccord holdings export. Gain/loss and cost basis are not part of it.
#[derive(Debug, Clone, Default)]
pub struct CanaccordParser {
    cleaner: NumberCleaner,
}

impl CanaccordParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatementParser for CanaccordParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Canaccord
    }

    fn region_spec(&self) -> RegionSpec {
        RegionSpec {
            start: StartMarker::Header {
                label: "Symbol",
                matches: is_header,
                fallback: Some(HEADER_LINE),
            },
            end: EndMarker::None,
        }
    }

    fn extract(&self, statement: &Statement<'_>) -> Result<Vec<CanonicalRecord>, StatementError> {
        let num = |row: &[String], idx: usize| self.cleaner.clean(cell(row, idx));

        let records: Vec<CanonicalRecord> = statement
            .body()
            .into_iter()
            .map(|row| {
                let symbol = cell(row, COL_SYMBOL);
                CanonicalRecord {
                    symbol: (!symbol.is_empty()).then(|| symbol.to_string()),
                    description: cell(row, COL_DESCRIPTION).to_string(),
                    quantity: num(row, COL_QUANTITY),
                    last_price: num(row, COL_LAST_PRICE),
                    current_value: num(row, COL_MARKET_VALUE),
                    ..CanonicalRecord::new(cell(row, COL_ACCOUNT))
                }
            })
            .collect();

        debug!(file = %statement.file.name, records = records.len(), "canaccord holdings read");
        Ok(records)
    }
}
