//! Display helpers for counts, ratios and growth figures.

/// Format an activity count with comma-grouped thousands.
///
/// ```
/// use uidai_core::formatting::format_count;
///
/// assert_eq!(format_count(1_006_029), "1,006,029");
/// assert_eq!(format_count(42), "42");
/// ```
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Fixed-point decimal with a comma-grouped integer part.
///
/// ```
/// use uidai_core::formatting::format_decimal;
///
/// assert_eq!(format_decimal(1234.5, 1), "1,234.5");
/// assert_eq!(format_decimal(0.0, 2), "0.00");
/// assert_eq!(format_decimal(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_decimal(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let grouped = int_part
        .parse::<u64>()
        .map(format_count)
        .unwrap_or_else(|_| int_part.to_string());

    // "-0.00" reads as zero.
    let negative = value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9'));
    let sign = if negative { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

/// Format a signed growth fraction as a one-decimal percentage.
///
/// ```
/// use uidai_core::formatting::format_growth;
///
/// assert_eq!(format_growth(0.5), "50.0%");
/// assert_eq!(format_growth(-0.125), "-12.5%");
/// ```
pub fn format_growth(fraction: f64) -> String {
    format!("{}%", format_decimal(fraction * 100.0, 1))
}

/// Format a pressure or saturation ratio with two decimals.
pub fn format_index(value: f64) -> String {
    format_decimal(value, 2)
}
