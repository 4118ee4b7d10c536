use models::{CanonicalRecord, SourceFormat};
use tracing::debug;
use utils::repair::{is_cash_symbol, synthesize_unit_price, CashMatch};
use utils::{
    cell, first_cell, EndMarker, NumberCleaner, RegionSpec, StartMarker, Statement,
    StatementError, StatementParser,
};

pub const PARSER_NAME: &str = "etrade";

/// Position rows are at least this wide; shorter rows inside the table are
/// notices such as "you have no positions".
const MIN_ROW_CELLS: usize = 12;

/// The account summary value line sits under the summary title and header.
const ACCOUNT_LINE: usize = 2;

const COL_SYMBOL: usize = 0;
const COL_QUANTITY: usize = 1;
const COL_LAST_PRICE: usize = 2;
const COL_VALUE: usize = 3;
const COL_GAIN_DOLLAR: usize = 5;
const COL_GAIN_PERCENT: usize = 7;
const COL_PER_SHARE: usize = 9;
const COL_TOTAL_COST: usize = 11;

fn is_header(row: &[String]) -> bool {
    first_cell(row) == "Symbol" && cell(row, 1) == "Qty #"
}

fn is_total(row: &[String]) -> bool {
    first_cell(row) == "TOTAL"
}

/// E*Trade "View Summary - All Positions" export.
#[derive(Debug, Clone, Default)]
pub struct EtradeParser {
    cleaner: NumberCleaner,
}

impl EtradeParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn account(statement: &Statement<'_>) -> String {
        let name = first_cell(statement.line(ACCOUNT_LINE));
        if name.is_empty() {
            statement.file.stem().to_string()
        } else {
            name.to_string()
        }
    }
}

impl StatementParser for EtradeParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Etrade
    }

    fn region_spec(&self) -> RegionSpec {
        RegionSpec {
            start: StartMarker::Header {
                label: "Symbol, Qty #",
                matches: is_header,
                fallback: None,
            },
            end: EndMarker::FromTop(is_total),
        }
    }

    fn extract(&self, statement: &Statement<'_>) -> Result<Vec<CanonicalRecord>, StatementError> {
        let account = Self::account(statement);
        let num = |row: &[String], idx: usize| self.cleaner.clean(cell(row, idx));

        let mut records = Vec::new();
        for row in statement.body() {
            if row.len() < MIN_ROW_CELLS {
                debug!(file = %statement.file.name, row = first_cell(row), "skipping short row");
                continue;
            }

            let symbol = cell(row, COL_SYMBOL);
            let mut record = CanonicalRecord {
                symbol: (!symbol.is_empty()).then(|| symbol.to_string()),
                quantity: num(row, COL_QUANTITY),
                last_price: num(row, COL_LAST_PRICE),
                current_value: num(row, COL_VALUE),
                total_gain_loss_dollar: num(row, COL_GAIN_DOLLAR),
                total_gain_loss_percent: num(row, COL_GAIN_PERCENT),
                cost_basis_per_share: num(row, COL_PER_SHARE),
                total_cost_basis: num(row, COL_TOTAL_COST),
                ..CanonicalRecord::new(account.clone())
            };

            if is_cash_symbol(symbol, CashMatch::Exact) {
                synthesize_unit_price(&mut record);
            }
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::StatementFile;

    const EXPORT: &str = "\
Account Summary
Account,Net Account Value,Total Gain $,Total Gain %,Day's Gain Unrealized $,Day's Gain Unrealized %,Available For Withdrawal,Cash Purchasing Power
Brokerage -4821,\"12,345.67\",\"1,001.00\",8.82%,12.00,0.10%,500.00,500.00

View Summary - All Positions
Symbol,Qty #,Last Price $,Value $,Day's Gain $,Total Gain $,Day's Gain %,Total Gain %,Price Paid $,Cost Basis/Share $,% of Portfolio,Total Cost $
MSFT,20,410.50,8210.00,40.00,1210.00,0.49%,17.29%,350.00,350.00,66.5%,7000.00
VYM,15,110.00,1650.00,-3.00,-150.00,-0.18%,-8.33%,120.00,120.00,13.4%,1800.00
CASH,,,2485.67,,,,,,,20.1%,
TOTAL,,,12345.67,37.00,1060.00,,,,,,8800.00

Generated at 03/14/2024 09:00 PM EDT
";

    #[test]
    fn test_parse_positions() {
        let records = EtradeParser::new()
            .parse(&StatementFile::new("Etrade/PortfolioDownload.csv", EXPORT))
            .unwrap()
            .records;
        assert_eq!(records.len(), 3);

        let vym = &records[1];
        assert_eq!(vym.account, "Brokerage -4821");
        assert_eq!(vym.symbol.as_deref(), Some("VYM"));
        assert_eq!(vym.quantity, Some(15.0));
        assert_eq!(vym.last_price, Some(110.0));
        assert_eq!(vym.current_value, Some(1650.0));
        assert_eq!(vym.total_gain_loss_dollar, Some(-150.0));
        assert_eq!(vym.total_gain_loss_percent, Some(-8.33));
        assert_eq!(vym.cost_basis_per_share, Some(120.0));
        assert_eq!(vym.total_cost_basis, Some(1800.0));
    }

    #[test]
    fn test_cash_row_gets_unit_price() {
        let records = EtradeParser::new()
            .parse(&StatementFile::new("PortfolioDownload.csv", EXPORT))
            .unwrap()
            .records;
        let cash = &records[2];
        assert_eq!(cash.quantity, Some(2485.67));
        assert_eq!(cash.last_price, Some(1.0));
        assert_eq!(cash.total_cost_basis, None);
    }

    #[test]
    fn test_no_positions_notice_is_dropped() {
        let export = "\
Account Summary
Account,Net Account Value
Brokerage -9000,0.00

View Summary - All Positions
Symbol,Qty #,Last Price $,Value $,Day's Gain $,Total Gain $,Day's Gain %,Total Gain %,Price Paid $,Cost Basis/Share $,% of Portfolio,Total Cost $
You have no positions in this account.
TOTAL,,,0.00,,,,,,,,
";
        let records = EtradeParser::new()
            .parse(&StatementFile::new("empty.csv", export))
            .unwrap()
            .records;
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_header_is_region_not_found() {
        let err = EtradeParser::new()
            .parse(&StatementFile::new("other.csv", "Symbol,Quantity\nABC,1\n"))
            .unwrap_err();
        assert!(matches!(err, StatementError::RegionNotFound { .. }));
    }
}
