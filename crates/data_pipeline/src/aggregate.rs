use std::collections::HashMap;

use models::{AggregationMode, CanonicalRecord, SummaryRecord};
use tracing::debug;
use utils::ratio;

/// Quotes for digit-bearing symbols are per 100 units in rescale mode.
const DIGIT_SYMBOL_SCALE: f64 = 100.0;

// Any Unicode digit counts, not just ASCII ones
fn has_digit(symbol: &str) -> bool {
    symbol.chars().any(char::is_numeric)
}

#[derive(Debug, Default)]
struct Position {
    description: Option<String>,
    quantity: f64,
    last_price: Option<f64>,
    current_value: f64,
    total_cost_basis: f64,
}

impl Position {
    fn add(&mut self, record: &CanonicalRecord) {
        if self.description.is_none() && !record.description.trim().is_empty() {
            self.description = Some(record.description.clone());
        }
        self.quantity += record.quantity.unwrap_or(0.0);
        if let Some(price) = record.last_price {
            self.last_price = Some(self.last_price.map_or(price, |low| low.min(price)));
        }
        self.current_value += record.current_value.unwrap_or(0.0);
        self.total_cost_basis += record.total_cost_basis.unwrap_or(0.0);
    }

    fn summarize(self, symbol: String, portfolio_value: f64, mode: AggregationMode) -> SummaryRecord {
        let mut average_cost_basis = ratio(self.total_cost_basis, self.quantity);
        if mode == AggregationMode::RescaleDigitSymbols && has_digit(&symbol) {
            average_cost_basis = average_cost_basis.map(|avg| avg / DIGIT_SYMBOL_SCALE);
        }
        let gain_loss_dollar = self.current_value - self.total_cost_basis;

        SummaryRecord {
            symbol,
            description: self.description.unwrap_or_default(),
            quantity: self.quantity,
            last_price: self.last_price,
            current_value: self.current_value,
            gain_loss_dollar,
            gain_loss_percent: ratio(gain_loss_dollar, self.total_cost_basis).map(|r| r * 100.0),
            average_cost_basis,
            total_cost_basis: self.total_cost_basis,
            position_size_percent: ratio(self.current_value, portfolio_value).map(|r| r * 100.0),
        }
    }
}

/// One summary row per distinct symbol, in order of first appearance.
///
/// Position size is measured against the current value of the whole ledger,
/// including records that have no symbol or were excluded.
pub fn aggregate(ledger: &[CanonicalRecord], mode: AggregationMode) -> Vec<SummaryRecord> {
    let portfolio_value: f64 = ledger.iter().filter_map(|r| r.current_value).sum();

    let mut order: Vec<String> = Vec::new();
    let mut positions: HashMap<String, Position> = HashMap::new();
    let mut excluded = 0usize;

    for record in ledger {
        let Some(symbol) = record.symbol_text() else {
            continue;
        };
        if mode == AggregationMode::ExcludeDigitSymbols && has_digit(symbol) {
            excluded += 1;
            continue;
        }

        let position = positions.entry(symbol.to_string()).or_insert_with(|| {
            order.push(symbol.to_string());
            Position::default()
        });
        position.add(record);
    }

    if excluded > 0 {
        debug!(excluded, "records with digit-bearing symbols left out");
    }

    order
        .into_iter()
        .filter_map(|symbol| {
            let position = positions.remove(&symbol)?;
            Some(position.summarize(symbol, portfolio_value, mode))
        })
        .collect()
}
