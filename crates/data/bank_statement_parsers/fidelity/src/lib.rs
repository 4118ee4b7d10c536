use models::{CanonicalRecord, SourceFormat};
use tracing::debug;
use utils::repair::{fill_cost_basis, is_money_market, join_account, synthesize_unit_price};
use utils::{
    cell, first_cell, opt_cell, ColumnIndex, EndMarker, NumberCleaner, ParseFailure, RegionSpec,
    StartMarker, Statement, StatementError, StatementParser,
};

pub const PARSER_NAME: &str = "fidelity";

/// Columns that carry intraday or presentation data only.
const IGNORED_COLUMNS: &[&str] = &[
    "Last Price Change",
    "Today's Gain/Loss Dollar",
    "Today's Gain/Loss Percent",
    "Type",
    "Percent Of Account",
];

fn is_header(row: &[String]) -> bool {
    row.iter().any(|c| c.trim() == "Symbol")
}

// The position table ends at the first line without an account.
fn is_table_end(row: &[String]) -> bool {
    first_cell(row).is_empty()
}

/// Positions export from the Fidelity portfolio page. Columns are matched by
/// name since their order has changed between export versions.
#[derive(Debug, Clone, Default)]
pub struct FidelityParser {
    cleaner: NumberCleaner,
}

struct Columns {
    account: Option<usize>,
    account_number: Option<usize>,
    account_name: Option<usize>,
    symbol: usize,
    description: Option<usize>,
    quantity: Option<usize>,
    last_price: Option<usize>,
    current_value: Option<usize>,
    gain_dollar: Option<usize>,
    gain_percent: Option<usize>,
    per_share: Option<usize>,
    total_cost: Option<usize>,
}

impl Columns {
    fn resolve(statement: &Statement<'_>) -> Result<Self, StatementError> {
        let columns = ColumnIndex::new(statement.header(), IGNORED_COLUMNS);
        let symbol = columns
            .position("Symbol")
            .ok_or_else(|| statement.parse_error(ParseFailure::MissingColumn("Symbol")))?;

        Ok(Self {
            account: columns.position("Account Name/Number"),
            account_number: columns.position("Account Number"),
            account_name: columns.position("Account Name"),
            symbol,
            description: columns.position("Description"),
            quantity: columns.position("Quantity"),
            last_price: columns.position("Last Price"),
            current_value: columns.position("Current Value"),
            gain_dollar: columns.position("Total Gain/Loss Dollar"),
            gain_percent: columns.position("Total Gain/Loss Percent"),
            per_share: columns.first_of(&["Cost Basis Per Share", "Average Cost Basis"]),
            total_cost: columns.first_of(&["Total Cost Basis", "Cost Basis Total"]),
        })
    }

    fn account(&self, row: &[String]) -> String {
        match self.account {
            Some(idx) => cell(row, idx).to_string(),
            None => join_account(
                opt_cell(row, self.account_number),
                opt_cell(row, self.account_name),
            ),
        }
    }
}

impl FidelityParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn number(&self, row: &[String], idx: Option<usize>) -> Option<f64> {
        self.cleaner.clean(opt_cell(row, idx))
    }
}

impl StatementParser for FidelityParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Fidelity
    }

    fn region_spec(&self) -> RegionSpec {
        RegionSpec {
            start: StartMarker::Header {
                label: "Symbol",
                matches: is_header,
                fallback: Some(0),
            },
            end: EndMarker::FromTop(is_table_end),
        }
    }

    fn extract(&self, statement: &Statement<'_>) -> Result<Vec<CanonicalRecord>, StatementError> {
        let columns = Columns::resolve(statement)?;
        if columns.account.is_none() && columns.account_number.is_none() {
            debug!(file = %statement.file.name, "no account number column");
        }

        let mut records = Vec::new();
        for row in statement.body() {
            let symbol = cell(row, columns.symbol);
            let mut record = CanonicalRecord {
                account: columns.account(row),
                symbol: (!symbol.is_empty()).then(|| symbol.to_string()),
                description: opt_cell(row, columns.description).to_string(),
                quantity: self.number(row, columns.quantity),
                last_price: self.number(row, columns.last_price),
                current_value: self.number(row, columns.current_value),
                total_gain_loss_dollar: self.number(row, columns.gain_dollar),
                total_gain_loss_percent: self.number(row, columns.gain_percent),
                cost_basis_per_share: self.number(row, columns.per_share),
                total_cost_basis: self.number(row, columns.total_cost),
            };

            if is_money_market(symbol, &record.description) {
                synthesize_unit_price(&mut record);
            }
            fill_cost_basis(&mut record);
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
Account Number,Account Name,Symbol,Description,Quantity,Last Price,Last Price Change,Current Value,Today's Gain/Loss Dollar,Today's Gain/Loss Percent,Total Gain/Loss Dollar,Total Gain/Loss Percent,Percent Of Account,Cost Basis Total,Average Cost Basis,Type,
Z12345678,Individual,SPAXX**,HELD IN MONEY MARKET,,,,$1523.12,,,,,12.5%,,,Cash,
Z12345678,Individual,AAPL,APPLE INC,10,$190.00,+$1.00,$1900.00,+$10.00,+0.53%,-$100.00,-5.00%,15.6%,$2000.00,$200.00,Margin,
Z12345678,Individual,Pending Activity,,,,,-$25.00,,,,,,,,,

\"The data and information in this spreadsheet is provided to you solely for your use.\"
\"Date downloaded 03/14/2024 10:42 AM ET\"
";

    #[test]
    fn test_parse_positions_export() {
        let parsed = FidelityParser::new()
            .parse(&StatementFile::new("Fidelity/Portfolio_Positions.csv", EXPORT))
            .unwrap();
        let records = parsed.records;
        assert_eq!(records.len(), 3);

        let aapl = &records[1];
        assert_eq!(aapl.account, "Z12345678 Individual");
        assert_eq!(aapl.symbol.as_deref(), Some("AAPL"));
        assert_eq!(aapl.description, "APPLE INC");
        assert_eq!(aapl.quantity, Some(10.0));
        assert_eq!(aapl.last_price, Some(190.0));
        assert_eq!(aapl.current_value, Some(1900.0));
        assert_eq!(aapl.total_gain_loss_dollar, Some(-100.0));
        assert_eq!(aapl.total_gain_loss_percent, Some(-5.0));
        assert_eq!(aapl.cost_basis_per_share, Some(200.0));
        assert_eq!(aapl.total_cost_basis, Some(2000.0));
    }

    #[test]
    fn test_money_market_and_pending_activity_get_unit_price() {
        let records = FidelityParser::new()
            .parse(&StatementFile::new("positions.csv", EXPORT))
            .unwrap()
            .records;

        assert_eq!(records[0].quantity, Some(1523.12));
        assert_eq!(records[0].last_price, Some(1.0));
        assert_eq!(records[2].symbol.as_deref(), Some("Pending Activity"));
        assert_eq!(records[2].quantity, Some(-25.0));
        assert_eq!(records[2].last_price, Some(1.0));
    }

    #[test]
    fn test_combined_account_column_and_derived_total() {
        let export = "\
Account Name/Number,Symbol,Description,Quantity,Last Price,Current Value,Total Gain/Loss Dollar,Total Gain/Loss Percent,Cost Basis Per Share
ROTH IRA 123,VTI,VANGUARD TOTAL MARKET,4,$250.00,$1000.00,$200.00,25.00%,$200.00
";
        let records = FidelityParser::new()
            .parse(&StatementFile::new("roth.csv", export))
            .unwrap()
            .records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].account, "ROTH IRA 123");
        assert_eq!(records[0].total_cost_basis, Some(800.0));
    }

    #[test]
    fn test_missing_symbol_column_fails_file() {
        let export = "Account,Ticker,Qty\nZ1,AAPL,1\n";
        let err = FidelityParser::new()
            .parse(&StatementFile::new("odd.csv", export))
            .unwrap_err();
        assert!(matches!(
            err,
            StatementError::Parse {
                reason: ParseFailure::MissingColumn("Symbol"),
                ..
            }
        ));
    }
}
