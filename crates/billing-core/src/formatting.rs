use rust_decimal::{Decimal, RoundingStrategy};

/// Format a decimal with thousands separators and a fixed number of decimal
/// places (midpoints round away from zero).
///
/// # Examples
///
/// ```
/// use billing_core::formatting::format_number;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_number(Decimal::new(12345, 1), 1), "1,234.5");
/// assert_eq!(format_number(Decimal::new(1234567, 0), 0), "1,234,567");
/// assert_eq!(format_number(Decimal::ZERO, 2), "0.00");
/// assert_eq!(format_number(Decimal::new(-98765, 1), 1), "-9,876.5");
/// ```
pub fn format_number(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (text, String::new()),
    };

    let grouped = group_thousands(&int_part);
    let result = if decimals == 0 {
        grouped
    } else {
        let mut frac = frac_part;
        while frac.len() < decimals as usize {
            frac.push('0');
        }
        format!("{}.{}", grouped, frac)
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a monetary amount as a USD string with two decimal places and
/// thousands separators.
///
/// # Examples
///
/// ```
/// use billing_core::formatting::format_currency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_currency(Decimal::new(123456, 2)), "$1,234.56");
/// assert_eq!(format_currency(Decimal::ZERO), "$0.00");
/// assert_eq!(format_currency(Decimal::new(-999, 2)), "-$9.99");
/// ```
pub fn format_currency(amount: Decimal) -> String {
    if amount.is_sign_negative() && !amount.is_zero() {
        format!("-${}", format_number(amount.abs(), 2))
    } else {
        format!("${}", format_number(amount, 2))
    }
}

/// Pad or truncate `text` to exactly `width` characters for table output.
pub fn fit_column(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{}{}", text, " ".repeat(width - count))
    } else if width == 0 {
        String::new()
    } else {
        let mut out: String = text.chars().take(width - 1).collect();
        out.push('…');
        out
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(Decimal::ZERO, 0), "0");
        assert_eq!(format_number(Decimal::ZERO, 2), "0.00");
    }

    #[test]
    fn test_format_number_pads_decimals() {
        assert_eq!(format_number(Decimal::new(150, 0), 2), "150.00");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(Decimal::new(12345, 1), 1), "1,234.5");
    }

    #[test]
    fn test_format_number_rounds_midpoint_up() {
        assert_eq!(format_number(Decimal::new(1005, 3), 2), "1.01");
    }

    #[test]
    fn test_format_number_negative_rounding_to_zero() {
        assert_eq!(format_number(Decimal::new(-1, 3), 2), "0.00");
    }

    // ── format_currency ──────────────────────────────────────────────────────

    #[test]
    fn test_format_currency_positive() {
        assert_eq!(format_currency(Decimal::new(123456, 2)), "$1,234.56");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(Decimal::new(-1_000_000, 2)), "-$10,000.00");
    }

    // ── fit_column ───────────────────────────────────────────────────────────

    #[test]
    fn test_fit_column_pads() {
        assert_eq!(fit_column("ab", 4), "ab  ");
    }

    #[test]
    fn test_fit_column_truncates() {
        assert_eq!(fit_column("abcdef", 4), "abc…");
    }
}
