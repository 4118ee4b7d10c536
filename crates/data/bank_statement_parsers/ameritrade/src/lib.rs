use models::{CanonicalRecord, SourceFormat};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use utils::{
    cell, is_blank_row, EndMarker, NumberCleaner, RegionSpec, StartMarker, Statement,
    StatementError, StatementParser,
};

pub const PARSER_NAME: &str = "ameritrade";

/// Account numbers are the tail of the export file name.
const ACCOUNT_SUFFIX_LEN: usize = 13;

const COL_SECURITY: usize = 0;
const COL_QUANTITY: usize = 1;
const COL_PER_SHARE: usize = 3;
const COL_TOTAL_COST: usize = 4;
const COL_LAST_PRICE: usize = 6;
const COL_MARKET_VALUE: usize = 7;
const COL_GAIN_DOLLAR: usize = 8;
const COL_GAIN_PERCENT: usize = 9;

static TICKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("valid ticker regex"));

// Last non-blank line is the totals footer.
fn is_footer(row: &[String]) -> bool {
    !is_blank_row(row)
}

/// `"APPLE INC (AAPL)"` -> `AAPL`
pub fn ticker(security: &str) -> Option<String> {
    TICKER_RE
        .captures(security)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

pub fn account_from_stem(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let start = chars.len().saturating_sub(ACCOUNT_SUFFIX_LEN);
    chars[start..].iter().collect()
}

/// TD Ameritrade position statement. The layout was retired with the
/// brokerage and is disabled by default.
#[derive(Debug, Clone, Default)]
pub struct AmeritradeParser {
    cleaner: NumberCleaner,
}

impl AmeritradeParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatementParser for AmeritradeParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Ameritrade
    }

    fn region_spec(&self) -> RegionSpec {
        RegionSpec {
            start: StartMarker::Fixed(0),
            end: EndMarker::FromBottom(is_footer),
        }
    }

    fn extract(&self, statement: &Statement<'_>) -> Result<Vec<CanonicalRecord>, StatementError> {
        let account = account_from_stem(statement.file.stem());
        let num = |row: &[String], idx: usize| self.cleaner.clean(cell(row, idx));

        let mut records = Vec::new();
        for row in statement.body() {
            let security = cell(row, COL_SECURITY);
            let symbol = ticker(security);
            if symbol.is_none() {
                debug!(file = %statement.file.name, security, "no ticker in security name");
            }

            records.push(CanonicalRecord {
                symbol,
                description: security.to_string(),
                quantity: num(row, COL_QUANTITY),
                last_price: num(row, COL_LAST_PRICE),
                current_value: num(row, COL_MARKET_VALUE),
                total_gain_loss_dollar: num(row, COL_GAIN_DOLLAR),
                total_gain_loss_percent: num(row, COL_GAIN_PERCENT),
                cost_basis_per_share: num(row, COL_PER_SHARE),
                total_cost_basis: num(row, COL_TOTAL_COST),
                ..CanonicalRecord::new(account.clone())
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::StatementFile;

    const EXPORT: &str = "\
Security,Quantity,Purchase Date,Cost/Share,Total Cost,Day Change,Last Price,Market Value,Gain ($),Gain (%)
APPLE INC (AAPL),5,01/02/2020,$75.00,$375.00,+$1.00,$190.00,$950.00,+$575.00,+153.33%
FORD MOTOR CO (F),100,05/06/2021,$15.00,\"$1,500.00\",-$0.10,$12.00,\"$1,200.00\",($300.00),(20.00%)
Total,,,,\"$1,875.00\",,,\"$2,150.00\",$275.00,14.67%

";

    #[test]
    fn test_ticker_and_account_helpers() {
        assert_eq!(ticker("APPLE INC (AAPL)").as_deref(), Some("AAPL"));
        assert_eq!(ticker("CASH ALTERNATIVES"), None);
        assert_eq!(account_from_stem("Positions_123-456789012"), "123-456789012");
        assert_eq!(account_from_stem("short"), "short");
    }

    #[test]
    fn test_parse_statement_drops_totals_footer() {
        let file = StatementFile::new("Ameritrade/Positions_123-456789012.csv", EXPORT);
        let records = AmeritradeParser::new().parse(&file).unwrap().records;
        assert_eq!(records.len(), 2);

        let ford = &records[1];
        assert_eq!(ford.account, "123-456789012");
        assert_eq!(ford.symbol.as_deref(), Some("F"));
        assert_eq!(ford.description, "FORD MOTOR CO (F)");
        assert_eq!(ford.quantity, Some(100.0));
        assert_eq!(ford.cost_basis_per_share, Some(15.0));
        assert_eq!(ford.total_cost_basis, Some(1500.0));
        assert_eq!(ford.last_price, Some(12.0));
        assert_eq!(ford.current_value, Some(1200.0));
        assert_eq!(ford.total_gain_loss_dollar, Some(-300.0));
        assert_eq!(ford.total_gain_loss_percent, Some(-20.0));
    }
}
