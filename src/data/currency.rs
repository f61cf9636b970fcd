use std::fmt;

/// Format with two decimals, `.` as thousands separator and `,` as decimal separator.
///
/// `value` must be finite; predictions are checked before they reach here.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    // "-0,00" reads oddly; only show the sign when something survives rounding
    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped},{frac_part}")
}

/// A predicted price ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyAmount {
    pub value: f64,
    pub symbol: String,
}

impl CurrencyAmount {
    pub fn new(value: f64, symbol: impl Into<String>) -> Self {
        Self {
            value,
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol, format_currency(self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(format_currency(1234567.8), "1.234.567,80");
        assert_eq!(format_currency(123456.7), "123.456,70");
        assert_eq!(format_currency(999.999), "1.000,00");
        assert_eq!(format_currency(100.0), "100,00");
    }

    #[test]
    fn zero_and_negatives() {
        assert_eq!(format_currency(0.0), "0,00");
        assert_eq!(format_currency(-0.001), "0,00");
        assert_eq!(format_currency(-4500.5), "-4.500,50");
    }

    #[test]
    fn display_prefixes_symbol() {
        assert_eq!(CurrencyAmount::new(123456.7, "US$").to_string(), "US$ 123.456,70");
    }
}
