//! Cross-dataset ratios, recent-activity outliers and month-over-month growth.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;
use uidai_core::calculations::RatioCalculator;
use uidai_core::models::Dataset;
use uidai_core::stats::OutlierConfig;

use crate::aggregator::{AggregatedPeriod, RegionAggregator};

/// Monthly buckets considered by the growth metric.
pub const GROWTH_WINDOW_MONTHS: usize = 3;

// ── Output rows ───────────────────────────────────────────────────────────────

/// Pressure Index for one district name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictPressure {
    pub district: String,
    pub biometric_total: u64,
    pub enrolment_total: u64,
    pub pressure_index: f64,
}

/// One row of the combined `(state, district)` service-health view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRow {
    pub state: String,
    pub district: String,
    pub enrolment_total: u64,
    pub biometric_total: u64,
    pub pressure_index: f64,
}

/// Saturation Index for one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSaturation {
    pub state: String,
    pub enrolment_total: u64,
    pub biometric_total: u64,
    pub demographic_total: u64,
    /// `biometric_total + demographic_total`.
    pub update_total: u64,
    pub saturation_index: f64,
}

/// A district whose recent enrolment volume exceeds the outlier threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub district: String,
    pub recent_total: u64,
}

/// Result of the outlier check over recent enrolments.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnomalyReport {
    /// Records dated strictly after this day were considered.
    pub cutoff: Option<NaiveDate>,
    /// Number of districts with recent activity.
    pub districts_considered: usize,
    /// `mean + sigma * stddev`, absent with fewer than two districts.
    pub threshold: Option<f64>,
    /// Flagged districts, largest first.
    pub anomalies: Vec<Anomaly>,
}

impl AnomalyReport {
    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// The single largest anomalous district.
    pub fn top(&self) -> Option<&Anomaly> {
        self.anomalies.first()
    }
}

/// Change between the two latest monthly enrolment buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthMetric {
    /// The trailing buckets the metric was read from (at most three).
    pub window: Vec<AggregatedPeriod>,
    pub previous_total: u64,
    pub latest_total: u64,
    /// Signed fraction, `0.5` means +50 %.
    pub growth: f64,
}

// ── MetricsEngine ─────────────────────────────────────────────────────────────

/// Derives ratios and statistics from the (already filtered) datasets.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    outliers: OutlierConfig,
}

impl MetricsEngine {
    pub fn new(outliers: OutlierConfig) -> Self {
        Self { outliers }
    }

    /// Pressure Index per district name.
    ///
    /// Every district with biometric activity appears; a missing enrolment
    /// total counts as zero. Sorted by district name.
    pub fn district_pressure(enrolment: &Dataset, biometric: &Dataset) -> Vec<DistrictPressure> {
        let enrol = RegionAggregator::by_district(enrolment);
        RegionAggregator::by_district(biometric)
            .into_iter()
            .map(|(district, biometric_total)| {
                let enrolment_total = enrol.get(&district).copied().unwrap_or(0);
                DistrictPressure {
                    pressure_index: RatioCalculator::pressure_index(
                        biometric_total,
                        enrolment_total,
                    ),
                    district,
                    biometric_total,
                    enrolment_total,
                }
            })
            .collect()
    }

    /// Combined `(state, district)` view: every enrolment pair, with a
    /// missing biometric total counted as zero.
    pub fn health_view(enrolment: &Dataset, biometric: &Dataset) -> Vec<HealthRow> {
        let bio = RegionAggregator::by_state_district(biometric);
        RegionAggregator::by_state_district(enrolment)
            .into_iter()
            .map(|(key, enrolment_total)| {
                let biometric_total = bio.get(&key).copied().unwrap_or(0);
                let (state, district) = key;
                HealthRow {
                    state,
                    district,
                    enrolment_total,
                    biometric_total,
                    pressure_index: RatioCalculator::pressure_index(
                        biometric_total,
                        enrolment_total,
                    ),
                }
            })
            .collect()
    }

    /// Saturation Index for every state seen in any of the three datasets.
    pub fn state_saturation(
        enrolment: &Dataset,
        biometric: &Dataset,
        demographic: &Dataset,
    ) -> Vec<StateSaturation> {
        let enrol = RegionAggregator::by_state(enrolment);
        let bio = RegionAggregator::by_state(biometric);
        let demo = RegionAggregator::by_state(demographic);

        let states: BTreeSet<&String> = enrol.keys().chain(bio.keys()).chain(demo.keys()).collect();

        states
            .into_iter()
            .map(|state| {
                let get = |m: &BTreeMap<String, u64>| m.get(state).copied().unwrap_or(0);
                let (e, b, d) = (get(&enrol), get(&bio), get(&demo));
                StateSaturation {
                    state: state.clone(),
                    enrolment_total: e,
                    biometric_total: b,
                    demographic_total: d,
                    update_total: b.saturating_add(d),
                    saturation_index: RatioCalculator::saturation_index(b, d, e),
                }
            })
            .collect()
    }

    /// Flag districts whose enrolments in the trailing window exceed
    /// `mean + sigma * stddev` of all districts' recent totals.
    pub fn detect_anomalies(&self, enrolment: &Dataset) -> AnomalyReport {
        let Some(max_date) = enrolment.max_date() else {
            return AnomalyReport::default();
        };
        let cutoff = max_date - Duration::days(self.outliers.window_days);

        let recent = RegionAggregator::by_district(&enrolment.after(cutoff));
        let values: Vec<f64> = recent.values().map(|&v| v as f64).collect();
        let threshold = self.outliers.threshold(&values);

        let mut anomalies: Vec<Anomaly> = match threshold {
            Some(t) => recent
                .iter()
                .filter(|(_, &total)| total as f64 > t)
                .map(|(district, &total)| Anomaly {
                    district: district.clone(),
                    recent_total: total,
                })
                .collect(),
            None => Vec::new(),
        };
        anomalies.sort_by(|a, b| {
            b.recent_total
                .cmp(&a.recent_total)
                .then_with(|| a.district.cmp(&b.district))
        });

        debug!(
            "Anomaly check: {} districts after {}, threshold {:?}, {} flagged",
            recent.len(),
            cutoff,
            threshold,
            anomalies.len()
        );

        AnomalyReport {
            cutoff: Some(cutoff),
            districts_considered: recent.len(),
            threshold,
            anomalies,
        }
    }

    /// Growth between the two latest monthly enrolment buckets.
    ///
    /// `None` with fewer than two buckets or a zero previous bucket.
    pub fn growth(enrolment: &Dataset) -> Option<GrowthMetric> {
        let months = RegionAggregator::monthly(enrolment);
        let window: Vec<AggregatedPeriod> = months
            .iter()
            .skip(months.len().saturating_sub(GROWTH_WINDOW_MONTHS))
            .cloned()
            .collect();

        let [.., previous, latest] = window.as_slice() else {
            return None;
        };
        let (previous_total, latest_total) = (previous.total, latest.total);
        let growth = RatioCalculator::growth_rate(latest_total, previous_total)?;

        Some(GrowthMetric {
            window,
            previous_total,
            latest_total,
            growth,
        })
    }

    /// Highest-pressure rows of the health view, descending.
    pub fn top_pressure(rows: &[HealthRow], n: usize) -> Vec<HealthRow> {
        let mut ranked = rows.to_vec();
        ranked.sort_by(|a, b| {
            b.pressure_index
                .total_cmp(&a.pressure_index)
                .then_with(|| a.state.cmp(&b.state))
                .then_with(|| a.district.cmp(&b.district))
        });
        ranked.truncate(n);
        ranked
    }

    /// Highest district-keyed pressure values, descending.
    pub fn top_district_pressure(rows: &[DistrictPressure], n: usize) -> Vec<DistrictPressure> {
        let mut ranked = rows.to_vec();
        ranked.sort_by(|a, b| {
            b.pressure_index
                .total_cmp(&a.pressure_index)
                .then_with(|| a.district.cmp(&b.district))
        });
        ranked.truncate(n);
        ranked
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
