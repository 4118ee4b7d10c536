use thiserror::Error;
use tracing::trace;

/// Tokens brokerages print instead of a number.
const PLACEHOLDERS: &[&str] = &["--", "-", "n/a", "na", "nan", "none", "null"];

/// Characters that decorate a number without changing its value.
const DECORATION: &[char] = &['$', '%', '+', '*', '€', '£', '¥'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalMark {
    /// `1,234.56`
    #[default]
    Point,
    /// `1.234,56`
    Comma,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("empty value")]
    Empty,
    #[error("parenthesized value '{0}' is not accepted")]
    Parenthesized(String),
    #[error("'{0}' is not a number")]
    NotNumeric(String),
}

/// Turns currency/percent formatted cells into plain numbers.
///
/// ```
/// use utils::NumberCleaner;
///
/// let cleaner = NumberCleaner::new();
/// assert_eq!(cleaner.clean("$1,234.50"), Some(1234.5));
/// assert_eq!(cleaner.clean("(12.3%)"), Some(-12.3));
/// assert_eq!(cleaner.clean("--"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberCleaner {
    pub parenthetical_negative: bool,
    pub decimal_mark: DecimalMark,
}

impl Default for NumberCleaner {
    fn default() -> Self {
        Self {
            parenthetical_negative: true,
            decimal_mark: DecimalMark::Point,
        }
    }
}

impl NumberCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parenthetical_negative(mut self, enabled: bool) -> Self {
        self.parenthetical_negative = enabled;
        self
    }

    pub fn with_decimal_mark(mut self, mark: DecimalMark) -> Self {
        self.decimal_mark = mark;
        self
    }

    pub fn parse(&self, token: &str) -> Result<f64, CoercionError> {
        let raw = token.trim();
        if raw.is_empty() || PLACEHOLDERS.iter().any(|p| raw.eq_ignore_ascii_case(p)) {
            return Err(CoercionError::Empty);
        }

        let mut cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && !DECORATION.contains(c))
            .map(|c| if c == '\u{2212}' { '-' } else { c })
            .collect();

        let mut negative = false;
        if cleaned.contains(['(', ')']) {
            let wrapped = cleaned.starts_with('(') && cleaned.ends_with(')') && cleaned.len() > 2;
            if !(self.parenthetical_negative && wrapped) {
                return Err(CoercionError::Parenthesized(raw.to_string()));
            }
            cleaned = cleaned[1..cleaned.len() - 1].to_string();
            negative = true;
        }

        let normalized = match self.decimal_mark {
            DecimalMark::Point => cleaned.replace(',', ""),
            DecimalMark::Comma => cleaned.replace('.', "").replace(',', "."),
        };
        if normalized.is_empty() {
            return Err(CoercionError::Empty);
        }

        let value = normalized
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CoercionError::NotNumeric(raw.to_string()))?;

        Ok(if negative { -value } else { value })
    }

    /// Like [`NumberCleaner::parse`], with every failure mapped to unavailable.
    pub fn clean(&self, token: &str) -> Option<f64> {
        match self.parse(token) {
            Ok(value) => Some(value),
            Err(CoercionError::Empty) => None,
            Err(err) => {
                trace!(%err, "value treated as unavailable");
                None
            }
        }
    }
}

/// Cleans with the default settings.
pub fn clean_number(token: &str) -> Option<f64> {
    NumberCleaner::default().clean(token)
}

/// `numerator / denominator`, or `None` when the division is undefined.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator).filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_currency() {
        assert_eq!(clean_number("$1,234.50"), Some(1234.50));
        assert_eq!(clean_number("-$12.00"), Some(-12.0));
        assert_eq!(clean_number("+$3.10"), Some(3.10));
        assert_eq!(clean_number(" 1 234.5 "), Some(1234.5));
        assert_eq!(clean_number("25.00*"), Some(25.0));
    }

    #[test]
    fn test_clean_percent() {
        assert_eq!(clean_number("+12.34%"), Some(12.34));
        assert_eq!(clean_number("-5%"), Some(-5.0));
    }

    #[test]
    fn test_parenthetical_negative() {
        assert_eq!(clean_number("(12.3%)"), Some(-12.3));
        assert_eq!(clean_number("($1,000.00)"), Some(-1000.0));

        let strict = NumberCleaner::new().with_parenthetical_negative(false);
        assert_eq!(strict.clean("(12.3%)"), None);
        assert_eq!(
            strict.parse("(12.3%)"),
            Err(CoercionError::Parenthesized("(12.3%)".to_string()))
        );
    }

    #[test]
    fn test_unbalanced_parentheses_are_unavailable() {
        assert_eq!(clean_number("(12.3"), None);
        assert_eq!(clean_number("()"), None);
    }

    #[test]
    fn test_placeholders_are_unavailable() {
        for token in ["", "  ", "--", "n/a", "N/A", "-", "$", "%"] {
            assert_eq!(clean_number(token), None, "token {:?}", token);
        }
    }

    #[test]
    fn test_non_numeric_is_unavailable() {
        assert_eq!(clean_number("Cash"), None);
        assert_eq!(clean_number("inf"), None);
        assert_eq!(
            NumberCleaner::new().parse("abc"),
            Err(CoercionError::NotNumeric("abc".to_string()))
        );
    }

    #[test]
    fn test_clean_is_idempotent() {
        for token in ["$1,234.50", "(12.3%)", "0.0001", "-7", "+15.25%", "1e3"] {
            let once = clean_number(token).unwrap();
            let twice = clean_number(&once.to_string()).unwrap();
            assert_eq!(once, twice, "token {:?}", token);
        }
    }

    #[test]
    fn test_decimal_comma() {
        let european = NumberCleaner::new().with_decimal_mark(DecimalMark::Comma);
        assert_eq!(european.clean("1.234,56 €"), Some(1234.56));
        assert_eq!(european.clean("-0,5"), Some(-0.5));
    }

    #[test]
    fn test_ratio_undefined_for_zero_denominator() {
        assert_eq!(ratio(10.0, 0.0), None);
        assert_eq!(ratio(0.0, 0.0), None);
        assert_eq!(ratio(1350.0, 15.0), Some(90.0));
    }
}
