/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use tour_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a tiny epsilon so exact binary midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` starts with "0.", e.g. "0.50".
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an amount the way the booking tables show it: a dollar sign,
/// thousands separators, and cents only when there are any.
///
/// # Examples
///
/// ```
/// use tour_core::formatting::format_amount;
///
/// assert_eq!(format_amount(1500.0), "$1,500");
/// assert_eq!(format_amount(1250.5), "$1,250.50");
/// assert_eq!(format_amount(0.0), "$0");
/// ```
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let body = if cents % 100 == 0 {
        format_number(amount.abs(), 0)
    } else {
        format_number(amount.abs(), 2)
    };
    if amount < 0.0 {
        format!("$-{}", body)
    } else {
        format!("${}", body)
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero.
///
/// # Examples
///
/// ```
/// use tour_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

/// Whole-number percentage of `part` in `whole`; `0` when `whole` is zero.
///
/// Halves round away from zero, so 2 of 8 is 25 and 1 of 8 is 13.
pub fn whole_percent(part: u32, whole: u32) -> u32 {
    percentage(f64::from(part), f64::from(whole), 0) as u32
}

/// Positional customer id: `CU` followed by at least three digits.
///
/// # Examples
///
/// ```
/// use tour_core::formatting::customer_display_id;
///
/// assert_eq!(customer_display_id(1), "CU001");
/// assert_eq!(customer_display_id(42), "CU042");
/// assert_eq!(customer_display_id(1234), "CU1234");
/// ```
pub fn customer_display_id(position: usize) -> String {
    format!("CU{:03}", position)
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
