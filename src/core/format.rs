//! Display helpers for provider values
//!
//! Numbers come back from providers as JSON numbers of either integer or
//! float flavour; these helpers render them for prompt text only.

use serde_json::Value;

/// Group the integer part with commas: `1234567` -> `1,234,567`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Render a JSON number as a rounded whole amount followed by `currency`.
pub fn money(value: &Value, currency: &str) -> String {
    format!("{} {}", group_thousands(as_amount(value)), currency)
}

/// Interpret a JSON value as a whole amount. Missing or non-numeric -> 0.
pub fn as_amount(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f.round() as i64).unwrap_or(0),
        _ => 0,
    }
}

pub fn as_count(value: &Value) -> u64 {
    as_amount(value).max(0) as u64
}

/// Date-only view of an ISO timestamp: the first 10 characters.
pub fn date_only(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.chars().take(10).collect(),
        None => "N/A".to_string(),
    }
}

pub fn text_or<'a>(value: &'a Value, default: &'a str) -> &'a str {
    value.as_str().unwrap_or(default)
}

/// Cut `text` to at most `max_chars` characters, respecting char boundaries.
pub fn snippet(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-45000), "-45,000");
    }

    #[test]
    fn test_money_rounds_floats() {
        assert_eq!(money(&json!(1500000), "VND"), "1,500,000 VND");
        assert_eq!(money(&json!(2499.6), "VND"), "2,500 VND");
        assert_eq!(money(&Value::Null, "VND"), "0 VND");
    }

    #[test]
    fn test_date_only() {
        assert_eq!(date_only(&json!("2024-10-05T14:30:00.123456")), "2024-10-05");
        assert_eq!(date_only(&json!("2024-10-05")), "2024-10-05");
        assert_eq!(date_only(&Value::Null), "N/A");
    }

    #[test]
    fn test_snippet_is_char_safe() {
        let text = "Tôi cần kiểm tra trạng thái đơn hàng";
        assert_eq!(snippet(text, 3), "Tôi");
        assert_eq!(snippet("short", 100), "short");
    }
}
