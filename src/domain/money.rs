// ============================================================
// MONEY
// ============================================================
// Brazilian currency parsing/formatting and guarded ratios

/// Parse a Brazilian currency string ("1.234,56", "R$ 10,00") into f64.
/// Unparsable or empty input yields 0.
pub fn parse_currency(value: &str) -> f64 {
    let trimmed = value.trim().trim_start_matches("R$").trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let cleaned = trimmed.replace('.', "").replace(',', ".");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse a plain numeric string ("1234.56"), accepting a comma decimal
/// separator as fallback. Unparsable input yields 0.
pub fn parse_plain_number(value: &str) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Format a value as Brazilian currency: `R$ 1.234.567,89`
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "R$ 0,00".to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    if int_part.chars().all(|c| c == '0') && frac_part.chars().all(|c| c == '0') {
        return "R$ 0,00".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("R$ {}{},{}", sign, group_thousands(int_part), frac_part)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `part / whole * 100`, or 0 when the denominator is not positive
pub fn percentage(part: f64, whole: f64) -> f64 {
    ratio(part, whole) * 100.0
}

/// `part / whole`, or 0 when the denominator is not positive
pub fn ratio(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    let value = part / whole;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// Sort helper for descending f64 ordering (NaN sorts last)
pub fn cmp_desc(a: f64, b: f64) -> std::cmp::Ordering {
    b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_brazilian_format() {
        assert_eq!(parse_currency("1.234.567,89"), 1234567.89);
        assert_eq!(parse_currency("R$ 10,50"), 10.5);
        assert_eq!(parse_currency("-2.000,00"), -2000.0);
    }

    #[test]
    fn test_parse_currency_invalid_is_zero() {
        assert_eq!(parse_currency(""), 0.0);
        assert_eq!(parse_currency("   "), 0.0);
        assert_eq!(parse_currency("n/a"), 0.0);
    }

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_plain_number("1500.25"), 1500.25);
        assert_eq!(parse_plain_number("1500,25"), 1500.25);
        assert_eq!(parse_plain_number("abc"), 0.0);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234567.891), "R$ 1.234.567,89");
        assert_eq!(format_currency(999.0), "R$ 999,00");
        assert_eq!(format_currency(1000.0), "R$ 1.000,00");
        assert_eq!(format_currency(-1500.5), "R$ -1.500,50");
    }

    #[test]
    fn test_format_currency_zero_and_nan() {
        assert_eq!(format_currency(0.0), "R$ 0,00");
        assert_eq!(format_currency(-0.001), "R$ 0,00");
        assert_eq!(format_currency(f64::NAN), "R$ 0,00");
    }

    #[test]
    fn test_percentage_guards_zero_denominator() {
        assert_eq!(percentage(50.0, 200.0), 25.0);
        assert_eq!(percentage(10.0, 0.0), 0.0);
        assert_eq!(percentage(10.0, -5.0), 0.0);
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(12.345, 1), "12.3%");
        assert_eq!(format_percent(7.0, 2), "7.00%");
    }
}
