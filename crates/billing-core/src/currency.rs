//! Currency text parsing.
//!
//! Invoice cells arrive either as plain numbers (`"1234.56"`) or as
//! formatted text (`"$1,234.56"`, `"-$10.00"`). Both parse to the same
//! [`Decimal`]; anything else is rejected.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Currency symbols stripped from the front of an amount.
const CURRENCY_SYMBOLS: &[char] = &['$'];

/// Parse a currency-formatted string into a decimal.
///
/// Leading/trailing whitespace is ignored, one leading currency symbol is
/// stripped (also when it follows a minus sign) and thousands separators are
/// removed. Returns `None` for blank or unparsable input.
///
/// ```
/// use billing_core::currency::parse_currency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_currency("$1,234.56"), Some(Decimal::new(123456, 2)));
/// assert_eq!(parse_currency("1234.56"), Some(Decimal::new(123456, 2)));
/// assert_eq!(parse_currency("-$10"), Some(Decimal::new(-10, 0)));
/// assert_eq!(parse_currency(""), None);
/// assert_eq!(parse_currency("n/a"), None);
/// ```
pub fn parse_currency(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let unsigned = unsigned
        .strip_prefix(CURRENCY_SYMBOLS)
        .unwrap_or(unsigned)
        .trim_start();

    let cleaned: String = unsigned.chars().filter(|&c| c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    let value = if negative {
        // "-$-5" is not a number.
        if cleaned.starts_with('-') || cleaned.starts_with('+') {
            return None;
        }
        Decimal::from_str(&format!("-{cleaned}")).ok()?
    } else {
        Decimal::from_str(&cleaned).ok()?
    };
    Some(value)
}
