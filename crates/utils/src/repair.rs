use models::CanonicalRecord;

/// How a format reports the total gain/loss in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainLossSign {
    /// The dollar figure already carries its sign.
    Signed,
    /// Only the magnitude is printed; the sign comes from the percent column.
    MagnitudeOnly,
}

/// Makes the dollar gain/loss negative when the percent gain/loss is.
pub fn recover_gain_loss_sign(record: &mut CanonicalRecord) {
    if let (Some(dollar), Some(percent)) =
        (record.total_gain_loss_dollar, record.total_gain_loss_percent)
    {
        if percent < 0.0 {
            record.total_gain_loss_dollar = Some(-dollar.abs());
        }
    }
}

pub fn apply_gain_loss_sign(record: &mut CanonicalRecord, sign: GainLossSign) {
    if sign == GainLossSign::MagnitudeOnly {
        recover_gain_loss_sign(record);
    }
}

/// Money market sweeps and pending activity carry a value but no price or quantity.
/// Some exports put the "Pending Activity" label in the symbol column.
pub fn is_money_market(symbol: &str, description: &str) -> bool {
    [symbol, description].iter().any(|text| {
        let text = text.to_lowercase();
        text.contains("money market") || text.contains("pending activity")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashMatch {
    Exact,
    Contains,
}

pub fn is_cash_symbol(symbol: &str, rule: CashMatch) -> bool {
    let symbol = symbol.trim().to_ascii_lowercase();
    match rule {
        CashMatch::Exact => symbol == "cash",
        CashMatch::Contains => symbol.contains("cash"),
    }
}

/// Cash-like rows: one unit per dollar, priced at 1.
pub fn synthesize_unit_price(record: &mut CanonicalRecord) {
    record.quantity = record.current_value;
    record.last_price = Some(1.0);
}

/// Derives whichever of total / per-share cost basis is missing from the other.
pub fn fill_cost_basis(record: &mut CanonicalRecord) {
    match (record.total_cost_basis, record.cost_basis_per_share, record.quantity) {
        (None, Some(per_share), Some(qty)) => {
            record.total_cost_basis = Some(per_share * qty);
        }
        (Some(total), None, Some(qty)) => {
            record.cost_basis_per_share = crate::numbers::ratio(total, qty);
        }
        _ => {}
    }
}

/// `"<number> <name>"`, skipping whichever part is blank.
pub fn join_account(number: &str, name: &str) -> String {
    let parts: Vec<&str> = [number.trim(), name.trim()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    parts.join(" ")
}
