use models::{CanonicalRecord, SourceFormat};
use tracing::debug;
use utils::repair::fill_cost_basis;
use utils::{
    cell, first_cell, EndMarker, NumberCleaner, RegionSpec, StartMarker, Statement,
    StatementError, StatementParser,
};

pub const PARSER_NAME: &str = "sprott";

/// Line holding "Account: <id> ..." above the holdings table.
const ACCOUNT_LINE: usize = 1;
const ACCOUNT_START: usize = 9;
const ACCOUNT_END: usize = 26;

const COL_DESCRIPTION: usize = 0;
const COL_SYMBOL: usize = 1;
const COL_QUANTITY: usize = 2;
const COL_LAST_PRICE: usize = 3;
const COL_VALUE: usize = 4;
const COL_PER_SHARE: usize = 8;
const COL_TOTAL_COST: usize = 9;

fn is_header(row: &[String]) -> bool {
    first_cell(row) == "Description"
}

pub fn account_name(line: &str) -> String {
    line.chars()
        .skip(ACCOUNT_START)
        .take(ACCOUNT_END - ACCOUNT_START)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sprott precious metals holdings. Retired; kept for old statements.
#[derive(Debug, Clone, Default)]
pub struct SprottParser {
    cleaner: NumberCleaner,
}

impl SprottParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatementParser for SprottParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Sprott
    }

    fn region_spec(&self) -> RegionSpec {
        RegionSpec {
            start: StartMarker::Header {
                label: "Description",
                matches: is_header,
                fallback: None,
            },
            end: EndMarker::None,
        }
    }

    fn extract(&self, statement: &Statement<'_>) -> Result<Vec<CanonicalRecord>, StatementError> {
        let account = account_name(first_cell(statement.line(ACCOUNT_LINE)));
        if account.is_empty() {
            debug!(file = %statement.file.name, "no account line");
        }
        let num = |row: &[String], idx: usize| self.cleaner.clean(cell(row, idx));

        let mut records = Vec::new();
        for row in statement.body() {
            let symbol = cell(row, COL_SYMBOL);
            let mut record = CanonicalRecord {
                symbol: (!symbol.is_empty()).then(|| symbol.to_string()),
                description: cell(row, COL_DESCRIPTION).to_string(),
                quantity: num(row, COL_QUANTITY),
                last_price: num(row, COL_LAST_PRICE),
                // Values marked `*` are estimates
                current_value: num(row, COL_VALUE),
                cost_basis_per_share: num(row, COL_PER_SHARE),
                total_cost_basis: num(row, COL_TOTAL_COST),
                ..CanonicalRecord::new(account.clone())
            };
            fill_cost_basis(&mut record);
            records.push(record);
        }
        Ok(records)
    }
}
