//! Descriptive statistics used by the metrics engine.

// ── Constants ─────────────────────────────────────────────────────────────────

/// Default number of standard deviations above the mean that marks an outlier.
pub const DEFAULT_ANOMALY_SIGMA: f64 = 2.0;

/// Default look-back window (days before the latest record) for anomaly checks.
pub const DEFAULT_ANOMALY_WINDOW_DAYS: i64 = 30;

// ── Basic moments ─────────────────────────────────────────────────────────────

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
///
/// Returns `None` with fewer than two values, where it is undefined.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() as f64 - 1.0)).sqrt())
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

// ── OutlierConfig ─────────────────────────────────────────────────────────────

/// Configuration for the mean + k·σ outlier rule.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierConfig {
    /// Multiplier `k` applied to the standard deviation.
    pub sigma: f64,
    /// Only records dated after `max_date - window_days` are considered.
    pub window_days: i64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_ANOMALY_SIGMA,
            window_days: DEFAULT_ANOMALY_WINDOW_DAYS,
        }
    }
}

impl OutlierConfig {
    /// Threshold `mean + sigma * stddev` over `values`.
    ///
    /// `None` when fewer than two values exist.
    pub fn threshold(&self, values: &[f64]) -> Option<f64> {
        let m = mean(values)?;
        let sd = sample_std_dev(values)?;
        Some(m + self.sigma * sd)
    }
}
