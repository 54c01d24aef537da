//! Templated directives derived from the metrics.
//!
//! Nothing here computes new numbers: each rule picks rows out of an
//! existing metric table and wraps them in a [`Directive`].

use std::collections::BTreeMap;

use serde::Serialize;
use uidai_core::formatting::format_index;

use crate::aggregator::RegionAggregator;
use crate::metrics::{AnomalyReport, HealthRow, MetricsEngine};

/// Districts that receive a mobile-van directive.
pub const MOBILE_VAN_COUNT: usize = 3;
/// States named in the awareness campaign.
pub const AWARENESS_STATE_COUNT: usize = 3;

// ── Directive ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    MobileVan {
        district: String,
        state: String,
        pressure_index: f64,
    },
    AwarenessCampaign {
        states: Vec<String>,
    },
    UrgentInvestigation {
        district: String,
        recent_total: u64,
    },
    NoAnomalies,
}

impl Directive {
    /// Short heading for the directive's group.
    pub fn heading(&self) -> &'static str {
        match self {
            Directive::MobileVan { .. } => "Deployment of Mobile Vans",
            Directive::AwarenessCampaign { .. } => "Awareness Campaign",
            Directive::UrgentInvestigation { .. } => "Urgent Investigation",
            Directive::NoAnomalies => "Security Status",
        }
    }

    /// Human-readable directive text.
    pub fn message(&self) -> String {
        match self {
            Directive::MobileVan {
                district,
                state,
                pressure_index,
            } => format!(
                "Deploy 2 Mobile Vans to {district} ({state}): Biometric update load is {}x higher than enrolments.",
                format_index(*pressure_index)
            ),
            Directive::AwarenessCampaign { states } => format!(
                "Launch 'Bal Aadhaar' Awareness in: {}. These states show the lowest enrolment in the 0-5 age group this month.",
                states.join(", ")
            ),
            Directive::UrgentInvestigation {
                district,
                recent_total,
            } => format!(
                "District {district} showed an unusual spike of {recent_total} activities. Audit of local Aadhaar Seva Kendras is recommended."
            ),
            Directive::NoAnomalies => {
                "No suspicious enrolment patterns detected across the region.".to_string()
            }
        }
    }

    /// Whether the directive needs operator attention.
    pub fn is_alert(&self) -> bool {
        matches!(self, Directive::UrgentInvestigation { .. })
    }
}

// ── Recommendations ───────────────────────────────────────────────────────────

/// One group per rule; the first two may be empty on sparse data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub mobile_vans: Vec<Directive>,
    pub awareness: Directive,
    pub security: Directive,
}

impl Recommendations {
    /// All directives in display order.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.mobile_vans
            .iter()
            .chain(std::iter::once(&self.awareness))
            .chain(std::iter::once(&self.security))
    }
}

/// Maps metric tables to directives.
pub struct RecommendationGenerator;

impl RecommendationGenerator {
    pub fn generate(
        health: &[HealthRow],
        newborns_by_state: &BTreeMap<String, u64>,
        anomalies: &AnomalyReport,
    ) -> Recommendations {
        Recommendations {
            mobile_vans: Self::mobile_vans(health),
            awareness: Self::awareness(newborns_by_state),
            security: Self::security(anomalies),
        }
    }

    /// Top districts of the health view by Pressure Index.
    pub fn mobile_vans(health: &[HealthRow]) -> Vec<Directive> {
        MetricsEngine::top_pressure(health, MOBILE_VAN_COUNT)
            .into_iter()
            .map(|row| Directive::MobileVan {
                district: row.district,
                state: row.state,
                pressure_index: row.pressure_index,
            })
            .collect()
    }

    /// States with the fewest 0-5 enrolments, fewest first.
    pub fn awareness(newborns_by_state: &BTreeMap<String, u64>) -> Directive {
        let states = RegionAggregator::smallest(newborns_by_state, AWARENESS_STATE_COUNT)
            .into_iter()
            .map(|(state, _)| state)
            .collect();
        Directive::AwarenessCampaign { states }
    }

    /// Largest anomaly, or the all-clear.
    pub fn security(anomalies: &AnomalyReport) -> Directive {
        match anomalies.top() {
            Some(top) => Directive::UrgentInvestigation {
                district: top.district.clone(),
                recent_total: top.recent_total,
            },
            None => Directive::NoAnomalies,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Anomaly;

    fn health(state: &str, district: &str, pressure_index: f64) -> HealthRow {
        HealthRow {
            state: state.to_string(),
            district: district.to_string(),
            enrolment_total: 0,
            biometric_total: 0,
            pressure_index,
        }
    }

    // ── mobile_vans ───────────────────────────────────────────────────────────

    #[test]
    fn test_mobile_vans_pick_top_three() {
        let rows = vec![
            health("Goa", "A", 1.0),
            health("Goa", "B", 9.5),
            health("Kerala", "C", 4.25),
            health("Kerala", "D", 7.0),
        ];
        let vans = RecommendationGenerator::mobile_vans(&rows);
        let districts: Vec<&str> = vans
            .iter()
            .map(|d| match d {
                Directive::MobileVan { district, .. } => district.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(districts, vec!["B", "D", "C"]);
    }

    #[test]
    fn test_mobile_vans_fewer_than_three() {
        let vans = RecommendationGenerator::mobile_vans(&[health("Goa", "A", 1.0)]);
        assert_eq!(vans.len(), 1);
        assert!(RecommendationGenerator::mobile_vans(&[]).is_empty());
    }

    #[test]
    fn test_mobile_van_message() {
        let d = Directive::MobileVan {
            district: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pressure_index: 0.48,
        };
        assert_eq!(
            d.message(),
            "Deploy 2 Mobile Vans to Pune (Maharashtra): Biometric update load is 0.48x higher than enrolments."
        );
    }

    // ── awareness ─────────────────────────────────────────────────────────────

    #[test]
    fn test_awareness_lists_bottom_three() {
        let totals: BTreeMap<String, u64> = [("A", 50), ("B", 10), ("C", 200), ("D", 5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let directive = RecommendationGenerator::awareness(&totals);
        assert_eq!(
            directive,
            Directive::AwarenessCampaign {
                states: vec!["D".to_string(), "B".to_string(), "A".to_string()]
            }
        );
        assert!(directive.message().starts_with("Launch 'Bal Aadhaar' Awareness in: D, B, A."));
    }

    #[test]
    fn test_awareness_empty_data() {
        let directive = RecommendationGenerator::awareness(&BTreeMap::new());
        assert_eq!(directive, Directive::AwarenessCampaign { states: vec![] });
    }

    // ── security ──────────────────────────────────────────────────────────────

    #[test]
    fn test_security_reports_largest_anomaly() {
        let report = AnomalyReport {
            cutoff: None,
            districts_considered: 12,
            threshold: Some(100.0),
            anomalies: vec![
                Anomaly {
                    district: "Patna".to_string(),
                    recent_total: 900,
                },
                Anomaly {
                    district: "Gaya".to_string(),
                    recent_total: 300,
                },
            ],
        };
        let directive = RecommendationGenerator::security(&report);
        assert!(directive.is_alert());
        assert_eq!(
            directive.message(),
            "District Patna showed an unusual spike of 900 activities. Audit of local Aadhaar Seva Kendras is recommended."
        );
    }

    #[test]
    fn test_security_all_clear() {
        let directive = RecommendationGenerator::security(&AnomalyReport::default());
        assert_eq!(directive, Directive::NoAnomalies);
        assert!(!directive.is_alert());
        assert_eq!(directive.heading(), "Security Status");
    }

    // ── generate ──────────────────────────────────────────────────────────────

    #[test]
    fn test_generate_always_has_three_groups() {
        let recs = RecommendationGenerator::generate(&[], &BTreeMap::new(), &AnomalyReport::default());
        assert!(recs.mobile_vans.is_empty());
        assert_eq!(recs.directives().count(), 2);
        assert_eq!(recs.security, Directive::NoAnomalies);
    }

    #[test]
    fn test_directive_serializes_with_kind_tag() {
        let json = serde_json::to_value(Directive::NoAnomalies).unwrap();
        assert_eq!(json["kind"], "no_anomalies");
    }
}
