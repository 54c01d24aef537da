//! Grouped sums of row totals by region and by calendar period.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use uidai_core::models::{Dataset, Record};

// ── Keys ──────────────────────────────────────────────────────────────────────

/// A calendar month with no timezone attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of the month.
    pub fn start(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Grouping dimension for [`RegionAggregator::aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    State,
    District,
    StateDistrict,
    Month,
}

/// The key a record falls under for a given [`GroupBy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    State(String),
    District(String),
    StateDistrict(String, String),
    Month(YearMonth),
}

impl GroupBy {
    pub fn key_of(&self, record: &Record) -> GroupKey {
        match self {
            GroupBy::State => GroupKey::State(record.state.clone()),
            GroupBy::District => GroupKey::District(record.district.clone()),
            GroupBy::StateDistrict => {
                GroupKey::StateDistrict(record.state.clone(), record.district.clone())
            }
            GroupBy::Month => GroupKey::Month(YearMonth::of(record.date)),
        }
    }
}

// ── AggregatedPeriod ──────────────────────────────────────────────────────────

/// Totals within one period (one day or one month).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedPeriod {
    /// The period key, e.g. `"2025-03-15"` (daily) or `"2025-03"` (monthly).
    pub period_key: String,
    /// First calendar day of the period.
    pub start: NaiveDate,
    /// Sum of row totals in the period.
    pub total: u64,
    /// Number of records in the period.
    pub count: u32,
}

// ── RegionAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that groups records and sums their totals.
///
/// Groups exist only for keys observed in the data.
pub struct RegionAggregator;

impl RegionAggregator {
    /// Sum `Total` over every record of every dataset, grouped by `by`.
    pub fn aggregate(datasets: &[&Dataset], by: GroupBy) -> BTreeMap<GroupKey, u64> {
        let mut map = BTreeMap::new();
        for dataset in datasets {
            for record in dataset.records() {
                let sum = map.entry(by.key_of(record)).or_insert(0u64);
                *sum = sum.saturating_add(record.total);
            }
        }
        map
    }

    /// `Total` per state.
    pub fn by_state(dataset: &Dataset) -> BTreeMap<String, u64> {
        Self::sum_by(dataset, |r| r.state.clone(), |r| r.total)
    }

    /// `Total` per district name (districts sharing a name across states
    /// are merged).
    pub fn by_district(dataset: &Dataset) -> BTreeMap<String, u64> {
        Self::sum_by(dataset, |r| r.district.clone(), |r| r.total)
    }

    /// `Total` per `(state, district)` pair.
    pub fn by_state_district(dataset: &Dataset) -> BTreeMap<(String, String), u64> {
        Self::sum_by(
            dataset,
            |r| (r.state.clone(), r.district.clone()),
            |r| r.total,
        )
    }

    /// Newborn (0-5) enrolments per state.
    pub fn age_0_5_by_state(dataset: &Dataset) -> BTreeMap<String, u64> {
        Self::sum_by(dataset, |r| r.state.clone(), |r| r.bands.age_0_5())
    }

    /// `Total` per calendar month, sorted ascending. Key format: `"%Y-%m"`.
    pub fn monthly(dataset: &Dataset) -> Vec<AggregatedPeriod> {
        Self::aggregate_by_period(dataset, |d| {
            let ym = YearMonth::of(d);
            (ym.to_string(), ym.start().unwrap_or(d))
        })
    }

    /// `Total` per calendar day, sorted ascending. Key format: `"%Y-%m-%d"`.
    pub fn daily(dataset: &Dataset) -> Vec<AggregatedPeriod> {
        Self::aggregate_by_period(dataset, |d| (d.format("%Y-%m-%d").to_string(), d))
    }

    /// Generic grouped sum.
    pub fn sum_by<K: Ord>(
        dataset: &Dataset,
        key_fn: impl Fn(&Record) -> K,
        value_fn: impl Fn(&Record) -> u64,
    ) -> BTreeMap<K, u64> {
        let mut map: BTreeMap<K, u64> = BTreeMap::new();
        for record in dataset.records() {
            let sum = map.entry(key_fn(record)).or_insert(0);
            *sum = sum.saturating_add(value_fn(record));
        }
        map
    }

    /// The `n` largest groups, descending by total; ties broken by key.
    pub fn largest<K: Ord + Clone>(totals: &BTreeMap<K, u64>, n: usize) -> Vec<(K, u64)> {
        let mut ranked: Vec<(K, u64)> = totals.iter().map(|(k, v)| (k.clone(), *v)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// The `n` smallest groups, ascending by total; ties broken by key.
    pub fn smallest<K: Ord + Clone>(totals: &BTreeMap<K, u64>, n: usize) -> Vec<(K, u64)> {
        let mut ranked: Vec<(K, u64)> = totals.iter().map(|(k, v)| (k.clone(), *v)).collect();
        ranked.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// `key_fn` maps a record date to the period key and the period start.
    fn aggregate_by_period(
        dataset: &Dataset,
        key_fn: impl Fn(NaiveDate) -> (String, NaiveDate),
    ) -> Vec<AggregatedPeriod> {
        let mut map: BTreeMap<String, AggregatedPeriod> = BTreeMap::new();

        for record in dataset.records() {
            let (key, start) = key_fn(record.date);
            let period = map
                .entry(key.clone())
                .or_insert_with(|| AggregatedPeriod {
                    period_key: key,
                    start,
                    total: 0,
                    count: 0,
                });
            period.total = period.total.saturating_add(record.total);
            period.count += 1;
        }

        map.into_values().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
