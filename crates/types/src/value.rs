//! Helpers for the loosely-typed JSON values that data sources carry.

use serde_json::Value;

/// The string sentinel that extraction uses for "no value".
pub const NOT_AVAILABLE: &str = "N/A";

/// Returns true for the empty sentinels: absent, `null`, `""` and `"N/A"`.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty() || s == NOT_AVAILABLE,
        Some(_) => false,
    }
}

/// Interprets a value as a number, accepting numeric strings.
///
/// Strings are trimmed, one leading currency symbol is dropped and thousands
/// separators (`,`, `_`, spaces) are removed before parsing.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_text(s),
        _ => None,
    }
}

fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let unsigned = unsigned
        .strip_prefix(['$', '£', '€'])
        .unwrap_or(unsigned)
        .trim_start();
    let digits: String = unsigned
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    if digits.is_empty() {
        return None;
    }
    let parsed = digits.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negative { -parsed } else { parsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_sentinels() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&json!(null))));
        assert!(is_empty_value(Some(&json!(""))));
        assert!(is_empty_value(Some(&json!("N/A"))));
        assert!(!is_empty_value(Some(&json!(" "))));
        assert!(!is_empty_value(Some(&json!(0))));
        assert!(!is_empty_value(Some(&json!([]))));
        assert!(!is_empty_value(Some(&json!(false))));
    }

    #[test]
    fn numeric_strings_are_coerced() {
        assert_eq!(coerce_number(&json!(12.5)), Some(12.5));
        assert_eq!(coerce_number(&json!(" 450000 ")), Some(450000.0));
        assert_eq!(coerce_number(&json!("$1,250,000")), Some(1_250_000.0));
        assert_eq!(coerce_number(&json!("-£3 000.50")), Some(-3000.5));
        assert_eq!(coerce_number(&json!("four hundred")), None);
        assert_eq!(coerce_number(&json!("")), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }
}
