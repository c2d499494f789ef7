//! Field normalization and comparison rules

/// Trim a raw reference; blank or missing references yield `None`
pub fn normalize_reference(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|reference| !reference.is_empty())
        .map(str::to_string)
}

/// How an amount field was read
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedAmount {
    /// The whole field is a number. Absent or blank fields read as `Exact(0.0)`.
    Exact(f64),
    /// Only a leading number was read, e.g. `100` from `"100.00 USD"`
    Prefix(f64),
    /// No finite number could be read
    Invalid,
}

impl ParsedAmount {
    /// Numeric value, 0 when invalid
    pub fn value(self) -> f64 {
        match self {
            ParsedAmount::Exact(value) | ParsedAmount::Prefix(value) => value,
            ParsedAmount::Invalid => 0.0,
        }
    }

    pub fn is_exact(self) -> bool {
        matches!(self, ParsedAmount::Exact(_))
    }
}

fn digit_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Byte length of the longest leading decimal number:
/// optional sign, digits with an optional fraction, optional exponent.
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    let int_digits = digit_run(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digit_run(&bytes[end + 1..]);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digit_run(&bytes[exp..]);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    end
}

/// Parse an amount field, reading the leading number when trailing text
/// follows it (`"1,000.00"` reads as `1`).
pub fn parse_amount(raw: Option<&str>) -> ParsedAmount {
    let text = match raw.map(str::trim) {
        None | Some("") => return ParsedAmount::Exact(0.0),
        Some(text) => text,
    };

    let len = numeric_prefix_len(text);
    match text[..len].parse::<f64>() {
        Ok(value) if value.is_finite() && len == text.len() => ParsedAmount::Exact(value),
        Ok(value) if value.is_finite() => ParsedAmount::Prefix(value),
        _ => ParsedAmount::Invalid,
    }
}

/// Lower-cased, trimmed status. Absence is kept distinct from an empty string.
pub fn normalize_status(status: Option<&str>) -> Option<String> {
    status.map(|status| status.trim().to_lowercase())
}

/// Amounts differ when the absolute difference is strictly above the tolerance
pub fn amounts_differ(internal: f64, provider: f64, tolerance: f64) -> bool {
    (internal - provider).abs() > tolerance
}

pub fn statuses_differ(internal: Option<&str>, provider: Option<&str>) -> bool {
    normalize_status(internal) != normalize_status(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_reference() {
        assert_eq!(normalize_reference(Some("  A1 ")), Some("A1".to_string()));
        assert_eq!(normalize_reference(Some("   ")), None);
        assert_eq!(normalize_reference(Some("")), None);
        assert_eq!(normalize_reference(None), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(Some("100.50")), ParsedAmount::Exact(100.5));
        assert_eq!(parse_amount(Some(" -12 ")), ParsedAmount::Exact(-12.0));
        assert_eq!(parse_amount(Some("+.5")), ParsedAmount::Exact(0.5));
        assert_eq!(parse_amount(Some("1e3")), ParsedAmount::Exact(1000.0));
        assert_eq!(parse_amount(Some("")), ParsedAmount::Exact(0.0));
        assert_eq!(parse_amount(None), ParsedAmount::Exact(0.0));
        assert_eq!(parse_amount(Some("abc")), ParsedAmount::Invalid);
        assert_eq!(parse_amount(Some("NaN")), ParsedAmount::Invalid);
        assert_eq!(parse_amount(Some("inf")), ParsedAmount::Invalid);
        assert_eq!(parse_amount(Some("-")), ParsedAmount::Invalid);
        assert_eq!(parse_amount(Some(".")), ParsedAmount::Invalid);
        assert_eq!(parse_amount(Some("1e999")), ParsedAmount::Invalid);
    }

    #[test]
    fn test_parse_amount_reads_leading_number() {
        assert_eq!(parse_amount(Some("100.00 USD")), ParsedAmount::Prefix(100.0));
        assert_eq!(parse_amount(Some("12abc")), ParsedAmount::Prefix(12.0));
        assert_eq!(parse_amount(Some("1,000.00")), ParsedAmount::Prefix(1.0));
        assert_eq!(parse_amount(Some("2.5e")), ParsedAmount::Prefix(2.5));
        assert_eq!(parse_amount(Some("-3.e+2x")), ParsedAmount::Prefix(-300.0));
        assert_eq!(parse_amount(Some("7.")), ParsedAmount::Exact(7.0));

        assert!(!parse_amount(Some("12abc")).is_exact());
        assert_eq!(parse_amount(Some("12abc")).value(), 12.0);
        assert_eq!(parse_amount(Some("abc")).value(), 0.0);
    }

    #[test]
    fn test_amount_tolerance_is_strict() {
        assert!(!amounts_differ(0.5, 0.25, 0.25));
        assert!(amounts_differ(0.5, 0.125, 0.25));
        assert!(!amounts_differ(1.0, 1.005, 0.01));
        assert!(amounts_differ(100.0, 100.02, 0.01));
    }

    #[test]
    fn test_status_comparison() {
        assert!(!statuses_differ(Some("Paid"), Some(" paid ")));
        assert!(statuses_differ(Some("paid"), Some("completed")));
        assert!(statuses_differ(Some("paid"), None));
        assert!(statuses_differ(Some(""), None));
        assert!(!statuses_differ(None, None));
    }
}
