use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{DashboardError, Result};

// ── DateParser ────────────────────────────────────────────────────────────────

/// Parses the `date` column of the identity-program extracts.
pub struct DateParser;

impl DateParser {
    /// Parse a date with day-first semantics.
    ///
    /// `03/04/2025` is the 3rd of April. ISO `YYYY-MM-DD` strings are still
    /// read year-first, and a trailing time component is ignored.
    pub fn parse_day_first(s: &str) -> Option<NaiveDate> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }

        // Drop a time component ("01-03-2025 00:00:00").
        let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);

        const FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];

        FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
    }
}

// ── Region names ──────────────────────────────────────────────────────────────

/// Trim and title-case a state or district name.
///
/// Every alphabetic character that follows a non-alphabetic one (or starts
/// the string) is upper-cased; all other letters are lower-cased, so
/// `" up "`, `"UP"` and `"Up"` all become `"Up"` and `"jammu & kashmir"`
/// becomes `"Jammu & Kashmir"`. No other canonicalisation is applied.
pub fn normalize_region(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for c in raw.trim().chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

// ── Numeric cells ─────────────────────────────────────────────────────────────

/// Parse a non-negative count cell.
///
/// Accepts plain integers and integral floats such as `"12.0"` (written by
/// some spreadsheet exports). Blank, negative or fractional values yield
/// `None`.
pub fn parse_count(raw: &str) -> Option<u64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// Parse the `pincode` column of a source row.
pub fn parse_pincode_cell(raw: &str) -> Option<u32> {
    parse_count(raw).and_then(|v| u32::try_from(v).ok())
}

fn pincode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[1-9][0-9]{5}$").expect("regex is valid"))
}

/// Validate a user-supplied pincode search term (100000-999999).
pub fn parse_pincode_query(raw: &str) -> Result<u32> {
    let s = raw.trim();
    if !pincode_regex().is_match(s) {
        return Err(DashboardError::InvalidPincode(raw.to_string()));
    }
    s.parse::<u32>()
        .map_err(|_| DashboardError::InvalidPincode(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── DateParser ────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_day_first_slash() {
        let d = DateParser::parse_day_first("03/04/2025").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 4, 3).unwrap());
    }

    #[test]
    fn test_parse_day_first_dash() {
        let d = DateParser::parse_day_first("31-12-2025").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_parse_iso_stays_year_first() {
        let d = DateParser::parse_day_first("2025-04-03").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 4, 3).unwrap());
    }

    #[test]
    fn test_parse_ignores_time_component() {
        let d = DateParser::parse_day_first(" 01-03-2025 00:00:00 ").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DateParser::parse_day_first("").is_none());
        assert!(DateParser::parse_day_first("not a date").is_none());
        assert!(DateParser::parse_day_first("31/31/2025").is_none());
    }

    // ── normalize_region ──────────────────────────────────────────────────────

    #[test]
    fn test_normalize_region_variants_collapse() {
        assert_eq!(normalize_region("  up "), "Up");
        assert_eq!(normalize_region("UP"), "Up");
        assert_eq!(normalize_region("Up"), "Up");
    }

    #[test]
    fn test_normalize_region_is_idempotent() {
        let once = normalize_region("  WEST   bengal");
        assert_eq!(normalize_region(&once), once);
        assert_eq!(once, "West   Bengal");
    }

    #[test]
    fn test_normalize_region_word_boundaries() {
        assert_eq!(normalize_region("jammu & kashmir"), "Jammu & Kashmir");
        assert_eq!(normalize_region("north-east delhi"), "North-East Delhi");
        assert_eq!(normalize_region("24 parganas"), "24 Parganas");
    }

    // ── parse_count ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count(" 7 "), Some(7));
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count("1.5"), None);
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("n/a"), None);
    }

    // ── pincodes ──────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_pincode_query_valid() {
        assert_eq!(parse_pincode_query("411001").unwrap(), 411001);
        assert_eq!(parse_pincode_query(" 110001 ").unwrap(), 110001);
    }

    #[test]
    fn test_parse_pincode_query_invalid() {
        for bad in ["", "12345", "1234567", "011001", "41100a"] {
            assert!(
                matches!(parse_pincode_query(bad), Err(DashboardError::InvalidPincode(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_pincode_cell() {
        assert_eq!(parse_pincode_cell("411001"), Some(411001));
        assert_eq!(parse_pincode_cell("411001.0"), Some(411001));
        assert_eq!(parse_pincode_cell("x"), None);
    }
}
