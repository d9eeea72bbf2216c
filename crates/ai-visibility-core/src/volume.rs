//! Magnitude-string parsing.
//!
//! The generation service reports counts as abbreviated strings ("10K",
//! "1.2M", "1,234"). Views need plain numbers to sort and scale bars, so
//! these parsers always return a usable non-negative value and degrade to
//! `0.0` on anything they cannot read.

/// Parse a magnitude string into a number.
///
/// Commas are stripped and case is ignored. A trailing `K` multiplies the
/// leading decimal prefix by 1,000, a trailing `M` by 1,000,000. Without a
/// suffix only the leading integer part is read.
///
/// ```
/// use ai_visibility_core::volume::parse_volume;
/// assert_eq!(parse_volume("10K"), 10_000.0);
/// assert_eq!(parse_volume("1.2M"), 1_200_000.0);
/// assert_eq!(parse_volume("n/a"), 0.0);
/// ```
pub fn parse_volume(text: &str) -> f64 {
    let cleaned = text.trim().to_uppercase().replace(',', "");
    if cleaned.is_empty() {
        return 0.0;
    }

    let value = if cleaned.ends_with('K') {
        leading_decimal(&cleaned).map(|n| n * 1_000.0)
    } else if cleaned.ends_with('M') {
        leading_decimal(&cleaned).map(|n| n * 1_000_000.0)
    } else {
        leading_integer(&cleaned)
    };

    match value {
        Some(n) if n.is_finite() && n > 0.0 => n,
        _ => 0.0,
    }
}

/// Parse a percentage string such as `"25%"` into `25.0`, clamped to `[0, 100]`.
pub fn parse_percentage(text: &str) -> f64 {
    let cleaned = text.trim().trim_end_matches('%').trim();
    match leading_decimal(cleaned) {
        Some(n) if n.is_finite() => n.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Longest prefix of the form `[+-]?digits[.digits]`.
fn leading_decimal(s: &str) -> Option<f64> {
    let end = numeric_prefix_len(s, true);
    s[..end].parse::<f64>().ok()
}

fn leading_integer(s: &str) -> Option<f64> {
    let end = numeric_prefix_len(s, false);
    s[..end].parse::<i64>().ok().map(|n| n as f64)
}

fn numeric_prefix_len(s: &str, allow_fraction: bool) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut seen_digit = i > digits_start;
    if allow_fraction && i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        // "12." reads as 12
        if j > i + 1 {
            seen_digit = true;
            i = j;
        }
    }
    if seen_digit {
        i
    } else {
        0
    }
}
