use models::{CanonicalRecord, SourceFormat};
use tracing::debug;
use utils::repair::{is_cash_symbol, synthesize_unit_price, CashMatch, GainLossSign};
use utils::{
    cell, first_cell, ratio, EndMarker, NumberCleaner, RegionSpec, StartMarker, Statement,
    StatementError, StatementParser,
};

pub const PARSER_NAME: &str = "schwab";

pub const ACCOUNT_PREFIX: &str = "Schwab - ";

/// Length of the masked account number, `...` included.
const MASKED_ACCOUNT_LEN: usize = 6;

const COL_SYMBOL: usize = 0;
const COL_DESCRIPTION: usize = 1;
const COL_QUANTITY: usize = 2;
const COL_PRICE: usize = 3;
const COL_MARKET_VALUE: usize = 6;
const COL_COST_BASIS: usize = 9;
const COL_GAIN_PERCENT: usize = 10;
const COL_GAIN_DOLLAR: usize = 11;

fn is_header(row: &[String]) -> bool {
    cell(row, 0).contains("Symbol") && cell(row, 1).contains("Description")
}

fn is_account_total(row: &[String]) -> bool {
    first_cell(row).contains("Account Total")
}

/// "Positions for account ...123 as of ..." becomes "Schwab - ...123".
pub fn account_name(title: &str) -> String {
    let title = title.trim();
    match title.find("...") {
        Some(start) => {
            let masked: String = title[start..].chars().take(MASKED_ACCOUNT_LEN).collect();
            format!("{}{}", ACCOUNT_PREFIX, masked)
        }
        None => {
            debug!(title, "no masked account number in title");
            format!("{}{}", ACCOUNT_PREFIX, title)
        }
    }
}

/// Schwab positions export. The dollar gain/loss column only carries the
/// magnitude, and the cost basis is given as a total.
#[derive(Debug, Clone, Default)]
pub struct SchwabParser {
    cleaner: NumberCleaner,
}

impl SchwabParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatementParser for SchwabParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Schwab
    }

    fn region_spec(&self) -> RegionSpec {
        RegionSpec {
            start: StartMarker::Header {
                label: "Symbol, Description",
                matches: is_header,
                fallback: None,
            },
            end: EndMarker::FromTop(is_account_total),
        }
    }

    fn gain_loss_sign(&self) -> GainLossSign {
        GainLossSign::MagnitudeOnly
    }

    fn extract(&self, statement: &Statement<'_>) -> Result<Vec<CanonicalRecord>, StatementError> {
        let account = account_name(first_cell(statement.line(0)));
        let num = |row: &[String], idx: usize| self.cleaner.clean(cell(row, idx));

        let mut records = Vec::new();
        for row in statement.body() {
            let symbol = cell(row, COL_SYMBOL);
            let quantity = num(row, COL_QUANTITY);
            let total_cost_basis = num(row, COL_COST_BASIS);

            let mut record = CanonicalRecord {
                symbol: (!symbol.is_empty()).then(|| symbol.to_string()),
                description: cell(row, COL_DESCRIPTION).to_string(),
                quantity,
                last_price: num(row, COL_PRICE),
                current_value: num(row, COL_MARKET_VALUE),
                total_gain_loss_dollar: num(row, COL_GAIN_DOLLAR),
                total_gain_loss_percent: num(row, COL_GAIN_PERCENT),
                cost_basis_per_share: total_cost_basis
                    .zip(quantity)
                    .and_then(|(total, qty)| ratio(total, qty)),
                total_cost_basis,
                ..CanonicalRecord::new(account.clone())
            };

            if is_cash_symbol(symbol, CashMatch::Contains) {
                synthesize_unit_price(&mut record);
            }
            records.push(record);
        }
        Ok(records)
    }
}
