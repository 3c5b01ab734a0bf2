//! Currency string normalization.
//!
//! Amounts are stored as display strings (`"$1,500"`, `"$1,250.00"`). The
//! normalizer keeps only ASCII digits and decimal points and parses the
//! longest numeric prefix of what remains. It never fails: anything it cannot
//! read is worth `0.0`.

/// Parse a currency-formatted amount into a non-negative number.
///
/// * `None`, `""` and strings without digits → `0.0`.
/// * Extra decimal points end the number: `"1.2.3"` → `1.2`.
///
/// # Examples
///
/// ```
/// use tour_core::amount::normalize_amount;
///
/// assert_eq!(normalize_amount(Some("$1,250.00")), 1250.0);
/// assert_eq!(normalize_amount(Some("USD 890")), 890.0);
/// assert_eq!(normalize_amount(Some("1.2.3")), 1.2);
/// assert_eq!(normalize_amount(Some("n/a")), 0.0);
/// assert_eq!(normalize_amount(None), 0.0);
/// ```
pub fn normalize_amount(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };

    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let prefix = numeric_prefix(&stripped);
    if !prefix.bytes().any(|b| b.is_ascii_digit()) {
        return 0.0;
    }

    let candidate = prefix.trim_end_matches('.');
    let candidate = if candidate.starts_with('.') {
        format!("0{candidate}")
    } else {
        candidate.to_string()
    };

    match candidate.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Longest leading run of digits containing at most one `.`.
fn numeric_prefix(s: &str) -> &str {
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        if c == '.' {
            if seen_dot {
                return &s[..i];
            }
            seen_dot = true;
        }
    }
    s
}
