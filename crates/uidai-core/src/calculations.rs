use crate::stats::round_to;

/// Added to every ratio denominator so an absent enrolment base never
/// divides by zero.
pub const DENOMINATOR_OFFSET: f64 = 1.0;

/// Decimal places kept on published ratios.
pub const RATIO_DECIMALS: u32 = 2;

// ── RatioCalculator ───────────────────────────────────────────────────────────

/// Stateless collection of the cross-dataset ratio formulas.
pub struct RatioCalculator;

impl RatioCalculator {
    /// `biometric / (enrolment + 1)`, rounded to two decimals.
    ///
    /// Always finite and non-negative.
    pub fn pressure_index(biometric_total: u64, enrolment_total: u64) -> f64 {
        Self::offset_ratio(biometric_total as f64, enrolment_total)
    }

    /// `(biometric + demographic) / (enrolment + 1)`, rounded to two decimals.
    pub fn saturation_index(
        biometric_total: u64,
        demographic_total: u64,
        enrolment_total: u64,
    ) -> f64 {
        Self::offset_ratio(
            biometric_total as f64 + demographic_total as f64,
            enrolment_total,
        )
    }

    /// Signed fractional change `(latest - previous) / previous`.
    ///
    /// Returns `None` when `previous` is zero.
    pub fn growth_rate(latest: u64, previous: u64) -> Option<f64> {
        if previous == 0 {
            return None;
        }
        Some((latest as f64 - previous as f64) / previous as f64)
    }

    fn offset_ratio(numerator: f64, enrolment_total: u64) -> f64 {
        let raw = numerator / (enrolment_total as f64 + DENOMINATOR_OFFSET);
        round_to(raw, RATIO_DECIMALS)
    }
}
