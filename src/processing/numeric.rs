use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref NUMBER_PATTERN: Regex = Regex::new(r"\d+\.?\d*").unwrap();
    static ref DECIMAL_DIGIT: Regex = Regex::new(r"^\d$").unwrap();
}

/// A number recovered from a recognized token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Integer(u64),
    Decimal(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(v) => *v as f64,
            Number::Decimal(v) => *v,
        }
    }

    /// Drops any fractional part.
    pub fn truncate(&self) -> u64 {
        match self {
            Number::Integer(v) => *v,
            Number::Decimal(v) => v.trunc() as u64,
        }
    }
}

/// Pull the first number out of `token`, ignoring thousands separators.
///
/// `"1,250 marks"` gives `Integer(1250)`, `"(78.5)"` gives `Decimal(78.5)`,
/// `"Total"` gives `None`. A trailing dot (`"12."`) still counts as decimal.
/// Any Unicode decimal digit is accepted, so `"۸۵"` gives `Integer(85)`.
pub fn extract_number(token: &str) -> Option<Number> {
    let cleaned = token.replace(',', "");
    let matched = to_ascii_digits(NUMBER_PATTERN.find(&cleaned)?.as_str());
    let matched = matched.as_str();

    if matched.contains('.') {
        return matched.parse::<f64>().ok().map(Number::Decimal);
    }
    match matched.parse::<u64>() {
        Ok(v) => Some(Number::Integer(v)),
        // Digit runs too long for u64 still carry a value.
        Err(_) => matched.parse::<f64>().ok().map(Number::Decimal),
    }
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    c.is_ascii_digit() || DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}

// Decimal digits come in contiguous runs of whole 0-9 blocks, so a digit's
// value is its distance from the start of its run, modulo 10.
fn digit_value(c: char) -> u32 {
    if let Some(d) = c.to_digit(10) {
        return d;
    }
    let mut start = c as u32;
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }
    (c as u32 - start) % 10
}

fn to_ascii_digits(matched: &str) -> String {
    matched
        .chars()
        .map(|c| match c {
            '.' => '.',
            c => char::from_digit(digit_value(c), 10).unwrap_or('0'),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_integer() {
        assert_eq!(extract_number("85"), Some(Number::Integer(85)));
        assert_eq!(extract_number("Obtained: 072"), Some(Number::Integer(72)));
    }

    #[test]
    fn test_thousands_separator_and_punctuation() {
        assert_eq!(extract_number("1,100"), Some(Number::Integer(1100)));
        assert_eq!(extract_number("(78.5)"), Some(Number::Decimal(78.5)));
        assert_eq!(extract_number("12."), Some(Number::Decimal(12.0)));
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(extract_number("75/100"), Some(Number::Integer(75)));
        assert_eq!(extract_number("Part 2 - 45"), Some(Number::Integer(2)));
    }

    #[test]
    fn test_no_number() {
        assert_eq!(extract_number(""), None);
        assert_eq!(extract_number("MARKS OBTAINED"), None);
        assert_eq!(extract_number("-.,"), None);
    }

    #[test]
    fn test_non_ascii_decimal_digits() {
        // Arabic-Indic and Extended Arabic-Indic (Urdu) digits.
        assert_eq!(extract_number("٤٥"), Some(Number::Integer(45)));
        assert_eq!(extract_number("۸۵"), Some(Number::Integer(85)));
        assert_eq!(extract_number("نمبر ۱۰۰"), Some(Number::Integer(100)));
        assert_eq!(extract_number("۷۸.۵"), Some(Number::Decimal(78.5)));
        // Devanagari and fullwidth.
        assert_eq!(extract_number("९०"), Some(Number::Integer(90)));
        assert_eq!(extract_number("７２"), Some(Number::Integer(72)));
    }

    #[test]
    fn test_digit_value_across_adjacent_blocks() {
        // U+1D7CE..U+1D7FF are five back-to-back blocks of mathematical digits.
        assert_eq!(digit_value('\u{1D7CE}'), 0);
        assert_eq!(digit_value('\u{1D7D9}'), 1);
        assert_eq!(digit_value('\u{1D7FF}'), 9);
        assert_eq!(digit_value('٩'), 9);
    }

    #[test]
    fn test_never_negative() {
        assert_eq!(extract_number("-45"), Some(Number::Integer(45)));
    }

    #[test]
    fn test_overflow_degrades_to_decimal() {
        let n = extract_number("123456789012345678901234567890").unwrap();
        assert!(matches!(n, Number::Decimal(_)));
        assert!(n.as_f64() > 1e29);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(Number::Decimal(89.9).truncate(), 89);
        assert_eq!(Number::Integer(100).truncate(), 100);
    }
}
