//! One full recomputation of every dashboard view.
//!
//! [`recompute`] is a pure function of the loaded datasets and the filter:
//! no state is carried between calls, so every filter change simply calls
//! it again.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use uidai_core::models::{Datasets, Filter, Record, ALL_INDIA};

use crate::aggregator::{AggregatedPeriod, RegionAggregator};
use crate::metrics::{
    AnomalyReport, DistrictPressure, GrowthMetric, HealthRow, MetricsEngine, StateSaturation,
};
use crate::recommendations::{RecommendationGenerator, Recommendations};

pub const TOP_STATES: usize = 10;
pub const TOP_DISTRICTS: usize = 10;
pub const NEWBORN_STATES: usize = 5;
pub const INSPECTOR_ROWS: usize = 100;

// ── View types ────────────────────────────────────────────────────────────────

/// Headline sums and row counts of the filtered datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Headline {
    pub enrolment_total: u64,
    pub biometric_total: u64,
    pub demographic_total: u64,
    pub enrolment_rows: usize,
    pub biometric_rows: usize,
    pub demographic_rows: usize,
}

/// A named total in a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub name: String,
    pub total: u64,
}

impl From<(String, u64)> for RankedEntry {
    fn from((name, total): (String, u64)) -> Self {
        Self { name, total }
    }
}

/// Outcome of a pincode drill-down.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PincodeResult {
    Found {
        pincode: u32,
        enrolment_total: u64,
        biometric_total: u64,
        daily_trend: Vec<AggregatedPeriod>,
    },
    NoData {
        pincode: u32,
    },
}

impl PincodeResult {
    pub fn pincode(&self) -> u32 {
        match self {
            PincodeResult::Found { pincode, .. } | PincodeResult::NoData { pincode } => *pincode,
        }
    }
}

/// Provenance of a set of views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// RFC 3339 timestamp.
    pub generated_at: String,
    pub filter: Filter,
    /// Records loaded across all three datasets.
    pub loaded_records: usize,
    /// Records left after the state filter.
    pub filtered_records: usize,
    /// Wall-clock seconds spent loading, when known.
    pub load_seconds: Option<f64>,
    pub compute_seconds: f64,
}

/// Everything the presentation layer renders for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViews {
    pub metadata: Metadata,
    pub headline: Headline,
    /// "All India" followed by every state in Enrolment or Biometric.
    pub state_options: Vec<String>,
    pub top_states: Vec<RankedEntry>,
    pub monthly_trend: Vec<AggregatedPeriod>,
    pub high_pressure_districts: Vec<RankedEntry>,
    pub newborn_focus: Vec<RankedEntry>,
    pub district_pressure: Vec<DistrictPressure>,
    pub health: Vec<HealthRow>,
    pub saturation: Vec<StateSaturation>,
    pub anomalies: AnomalyReport,
    pub growth: Option<GrowthMetric>,
    pub inspector: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<PincodeResult>,
    pub recommendations: Recommendations,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Recompute every view for `filter` over the unfiltered `datasets`.
pub fn recompute(datasets: &Datasets, filter: &Filter, engine: &MetricsEngine) -> DashboardViews {
    let started = Instant::now();

    let state_options = state_options(datasets);
    let scoped = datasets.filtered(filter);
    let (enrol, bio, demo) = (&scoped.enrolment, &scoped.biometric, &scoped.demographic);

    let headline = Headline {
        enrolment_total: enrol.total(),
        biometric_total: bio.total(),
        demographic_total: demo.total(),
        enrolment_rows: enrol.len(),
        biometric_rows: bio.len(),
        demographic_rows: demo.len(),
    };

    let ranked = |totals: &BTreeMap<String, u64>, n: usize| -> Vec<RankedEntry> {
        RegionAggregator::largest(totals, n)
            .into_iter()
            .map(RankedEntry::from)
            .collect()
    };

    let newborns = RegionAggregator::age_0_5_by_state(enrol);
    let top_states = ranked(&RegionAggregator::by_state(enrol), TOP_STATES);
    let high_pressure_districts = ranked(&RegionAggregator::by_district(bio), TOP_DISTRICTS);
    let newborn_focus = ranked(&newborns, NEWBORN_STATES);

    let district_pressure = MetricsEngine::top_district_pressure(
        &MetricsEngine::district_pressure(enrol, bio),
        TOP_DISTRICTS,
    );
    let health = MetricsEngine::health_view(enrol, bio);
    let saturation = MetricsEngine::state_saturation(enrol, bio, demo);
    let anomalies = engine.detect_anomalies(enrol);
    let growth = MetricsEngine::growth(enrol);
    let recommendations = RecommendationGenerator::generate(&health, &newborns, &anomalies);

    let pincode = filter.pincode.map(|p| search_pincode(&scoped, p));
    let inspector = enrol.records().iter().take(INSPECTOR_ROWS).cloned().collect();

    let compute_seconds = started.elapsed().as_secs_f64();
    debug!(
        "Recomputed views for {} in {:.3}s ({} records in scope)",
        filter.state_label(),
        compute_seconds,
        scoped.record_count()
    );

    DashboardViews {
        metadata: Metadata {
            generated_at: Utc::now().to_rfc3339(),
            filter: filter.clone(),
            loaded_records: datasets.record_count(),
            filtered_records: scoped.record_count(),
            load_seconds: None,
            compute_seconds,
        },
        headline,
        state_options,
        top_states,
        monthly_trend: RegionAggregator::monthly(enrol),
        high_pressure_districts,
        newborn_focus,
        district_pressure,
        health,
        saturation,
        anomalies,
        growth,
        inspector,
        pincode,
        recommendations,
    }
}

/// "All India" followed by the sorted union of Enrolment and Biometric states.
pub fn state_options(datasets: &Datasets) -> Vec<String> {
    let states: BTreeSet<String> = datasets
        .enrolment
        .states()
        .into_iter()
        .chain(datasets.biometric.states())
        .collect();
    std::iter::once(ALL_INDIA.to_string()).chain(states).collect()
}

/// Enrolment and Biometric activity for one pincode.
pub fn search_pincode(datasets: &Datasets, pincode: u32) -> PincodeResult {
    let enrol = datasets.enrolment.for_pincode(pincode);
    let bio = datasets.biometric.for_pincode(pincode);

    if enrol.is_empty() && bio.is_empty() {
        return PincodeResult::NoData { pincode };
    }

    PincodeResult::Found {
        pincode,
        enrolment_total: enrol.total(),
        biometric_total: bio.total(),
        daily_trend: RegionAggregator::daily(&enrol),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uidai_core::models::{AgeBands, Category, Dataset};
    use uidai_core::stats::OutlierConfig;

    use crate::recommendations::Directive;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn enrol(d: NaiveDate, state: &str, district: &str, pincode: u32, kids: u64, rest: u64) -> Record {
        Record::new(
            d,
            state,
            district,
            pincode,
            AgeBands::Enrolment {
                age_0_5: kids,
                age_5_17: rest,
                age_18_greater: 0,
            },
        )
    }

    fn bio(state: &str, district: &str, pincode: u32, total: u64) -> Record {
        Record::new(
            date(2025, 2, 1),
            state,
            district,
            pincode,
            AgeBands::Biometric {
                bio_age_5_17: total,
                bio_age_17_: 0,
            },
        )
    }

    fn demo(state: &str, total: u64) -> Record {
        Record::new(
            date(2025, 2, 1),
            state,
            "Any",
            110001,
            AgeBands::Demographic {
                demo_age_5_17: total,
                demo_age_17_: 0,
            },
        )
    }

    fn sample() -> Datasets {
        Datasets {
            enrolment: Dataset::new(
                Category::Enrolment,
                vec![
                    enrol(date(2025, 1, 10), "Maharashtra", "Pune", 411001, 4, 96),
                    enrol(date(2025, 2, 10), "Maharashtra", "Pune", 411001, 5, 145),
                    enrol(date(2025, 2, 11), "Maharashtra", "Mumbai", 400001, 1, 9),
                    enrol(date(2025, 2, 12), "Kerala", "Kochi", 682001, 2, 8),
                ],
            ),
            biometric: Dataset::new(
                Category::Biometric,
                vec![
                    bio("Maharashtra", "Pune", 411001, 500),
                    bio("Goa", "Panaji", 403001, 7),
                ],
            ),
            demographic: Dataset::new(Category::Demographic, vec![demo("Maharashtra", 40)]),
        }
    }

    // ── recompute ─────────────────────────────────────────────────────────────

    #[test]
    fn test_recompute_all_india() {
        let views = recompute(&sample(), &Filter::all_india(), &MetricsEngine::default());

        assert_eq!(views.headline.enrolment_total, 270);
        assert_eq!(views.headline.biometric_total, 507);
        assert_eq!(views.headline.demographic_total, 40);
        assert_eq!(views.headline.enrolment_rows, 4);

        assert_eq!(views.state_options, vec!["All India", "Goa", "Kerala", "Maharashtra"]);
        assert_eq!(views.top_states[0], RankedEntry { name: "Maharashtra".into(), total: 260 });
        assert_eq!(views.monthly_trend.len(), 2);
        assert_eq!(views.high_pressure_districts[0].name, "Pune");
        assert_eq!(views.newborn_focus[0].name, "Maharashtra");
        assert_eq!(views.metadata.loaded_records, 7);
        assert!(views.pincode.is_none());
    }

    #[test]
    fn test_recompute_growth_and_inspector() {
        let views = recompute(&sample(), &Filter::all_india(), &MetricsEngine::default());
        let growth = views.growth.unwrap();
        // January 100, February 150 + 10 + 10
        assert_eq!(growth.previous_total, 100);
        assert_eq!(growth.latest_total, 170);
        assert!((growth.growth - 0.7).abs() < 1e-12);
        assert_eq!(views.inspector.len(), 4);
        assert_eq!(views.inspector[0].district, "Pune");
    }

    #[test]
    fn test_recompute_state_filter() {
        let filter = Filter::from_selection("kerala");
        let views = recompute(&sample(), &filter, &MetricsEngine::default());
        assert_eq!(views.headline.enrolment_total, 10);
        assert_eq!(views.headline.biometric_total, 0);
        // Options always come from the unfiltered data.
        assert_eq!(views.state_options.len(), 4);
        assert_eq!(views.metadata.filtered_records, 1);
        assert!(views.growth.is_none());
    }

    #[test]
    fn test_recompute_recommendations() {
        let views = recompute(&sample(), &Filter::all_india(), &MetricsEngine::default());
        // Pune: 500 / (250 + 1) = 1.99
        assert_eq!(
            views.recommendations.mobile_vans[0],
            Directive::MobileVan {
                district: "Pune".into(),
                state: "Maharashtra".into(),
                pressure_index: 1.99,
            }
        );
        assert_eq!(
            views.recommendations.awareness,
            Directive::AwarenessCampaign {
                states: vec!["Kerala".into(), "Maharashtra".into()]
            }
        );
        assert_eq!(views.recommendations.security, Directive::NoAnomalies);
    }

    #[test]
    fn test_recompute_empty_datasets() {
        let views = recompute(&Datasets::default(), &Filter::all_india(), &MetricsEngine::default());
        assert_eq!(views.headline, Headline::default());
        assert_eq!(views.state_options, vec![ALL_INDIA]);
        assert!(views.top_states.is_empty());
        assert!(views.saturation.is_empty());
        assert!(views.anomalies.is_empty());
        assert!(views.growth.is_none());
        assert!(views.recommendations.mobile_vans.is_empty());
        assert_eq!(views.recommendations.security, Directive::NoAnomalies);
    }

    #[test]
    fn test_recompute_custom_outliers() {
        let engine = MetricsEngine::new(OutlierConfig {
            sigma: 0.1,
            window_days: 365,
        });
        let views = recompute(&sample(), &Filter::all_india(), &engine);
        // Recent totals: Pune 250, Mumbai 10, Kochi 10.
        assert_eq!(views.anomalies.top().unwrap().district, "Pune");
        assert!(views.recommendations.security.is_alert());
    }

    #[test]
    fn test_views_serialize_to_json() {
        let views = recompute(&sample(), &Filter::all_india(), &MetricsEngine::default());
        let json = serde_json::to_value(&views).unwrap();
        assert_eq!(json["headline"]["enrolment_total"], 270);
        assert!(json.get("pincode").is_none());
        assert!(json["metadata"]["generated_at"].is_string());
    }

    // ── search_pincode ────────────────────────────────────────────────────────

    #[test]
    fn test_pincode_found() {
        let result = search_pincode(&sample(), 411001);
        match result {
            PincodeResult::Found {
                enrolment_total,
                biometric_total,
                daily_trend,
                ..
            } => {
                assert_eq!(enrolment_total, 250);
                assert_eq!(biometric_total, 500);
                assert_eq!(daily_trend.len(), 2);
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_pincode_biometric_only_is_found() {
        let result = search_pincode(&sample(), 403001);
        assert!(matches!(
            result,
            PincodeResult::Found { enrolment_total: 0, biometric_total: 7, .. }
        ));
    }

    #[test]
    fn test_pincode_no_data() {
        assert_eq!(search_pincode(&sample(), 999999), PincodeResult::NoData { pincode: 999999 });
    }

    #[test]
    fn test_pincode_respects_state_filter() {
        let filter = Filter::from_selection("Kerala").with_pincode(Some(411001));
        let views = recompute(&sample(), &filter, &MetricsEngine::default());
        assert_eq!(views.pincode, Some(PincodeResult::NoData { pincode: 411001 }));
    }
}
