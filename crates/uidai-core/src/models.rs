use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Sentinel state selection meaning "no state filter".
pub const ALL_INDIA: &str = "All India";

/// Columns every source file must carry regardless of category.
pub const BASE_COLUMNS: [&str; 4] = ["date", "state", "district", "pincode"];

/// The three families of identity-program extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// First-time registrations.
    Enrolment,
    /// Biometric re-capture transactions.
    Biometric,
    /// Non-biometric profile updates.
    Demographic,
}

impl Category {
    /// Display label, e.g. `"Enrolment"`.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Enrolment => "Enrolment",
            Category::Biometric => "Biometric",
            Category::Demographic => "Demographic",
        }
    }

    /// Sub-directory of the data root holding this category's extracts.
    pub fn directory(&self) -> &'static str {
        match self {
            Category::Enrolment => "enrollment",
            Category::Biometric => "biometric",
            Category::Demographic => "demographic",
        }
    }

    /// Age-band columns summed into the row total, in [`AgeBands`] order.
    pub fn band_columns(&self) -> &'static [&'static str] {
        match self {
            Category::Enrolment => &["age_0_5", "age_5_17", "age_18_greater"],
            Category::Biometric => &["bio_age_5_17", "bio_age_17_"],
            Category::Demographic => &["demo_age_5_17", "demo_age_17_"],
        }
    }

    /// Every column a source file of this category must provide.
    pub fn required_columns(&self) -> Vec<&'static str> {
        BASE_COLUMNS
            .iter()
            .chain(self.band_columns().iter())
            .copied()
            .collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category-specific age-banded counts carried by a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum AgeBands {
    Enrolment {
        age_0_5: u64,
        age_5_17: u64,
        age_18_greater: u64,
    },
    Biometric {
        bio_age_5_17: u64,
        bio_age_17_: u64,
    },
    Demographic {
        demo_age_5_17: u64,
        demo_age_17_: u64,
    },
}

impl AgeBands {
    /// Build bands from values listed in [`Category::band_columns`] order.
    ///
    /// Returns `None` when the number of values does not match the category
    /// or the values sum past `u64::MAX`.
    pub fn from_values(category: Category, values: &[u64]) -> Option<Self> {
        let bands = match (category, values) {
            (Category::Enrolment, &[a, b, c]) => AgeBands::Enrolment {
                age_0_5: a,
                age_5_17: b,
                age_18_greater: c,
            },
            (Category::Biometric, &[a, b]) => AgeBands::Biometric {
                bio_age_5_17: a,
                bio_age_17_: b,
            },
            (Category::Demographic, &[a, b]) => AgeBands::Demographic {
                demo_age_5_17: a,
                demo_age_17_: b,
            },
            _ => return None,
        };
        bands.checked_total().map(|_| bands)
    }

    pub fn category(&self) -> Category {
        match self {
            AgeBands::Enrolment { .. } => Category::Enrolment,
            AgeBands::Biometric { .. } => Category::Biometric,
            AgeBands::Demographic { .. } => Category::Demographic,
        }
    }

    /// Sum of the category's sub-totals, `None` on overflow.
    pub fn checked_total(&self) -> Option<u64> {
        match *self {
            AgeBands::Enrolment {
                age_0_5,
                age_5_17,
                age_18_greater,
            } => age_0_5.checked_add(age_5_17)?.checked_add(age_18_greater),
            AgeBands::Biometric {
                bio_age_5_17,
                bio_age_17_,
            } => bio_age_5_17.checked_add(bio_age_17_),
            AgeBands::Demographic {
                demo_age_5_17,
                demo_age_17_,
            } => demo_age_5_17.checked_add(demo_age_17_),
        }
    }

    /// Sum of the category's sub-totals, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.checked_total().unwrap_or(u64::MAX)
    }

    /// Newborn (0-5) enrolments; zero for update categories.
    pub fn age_0_5(&self) -> u64 {
        match *self {
            AgeBands::Enrolment { age_0_5, .. } => age_0_5,
            _ => 0,
        }
    }
}

/// One normalised input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    /// Trimmed, title-cased state name.
    pub state: String,
    /// Trimmed, title-cased district name.
    pub district: String,
    pub pincode: u32,
    pub bands: AgeBands,
    /// Cached `bands.total()`.
    pub total: u64,
}

impl Record {
    pub fn new(
        date: NaiveDate,
        state: impl Into<String>,
        district: impl Into<String>,
        pincode: u32,
        bands: AgeBands,
    ) -> Self {
        Self {
            date,
            state: state.into(),
            district: district.into(),
            pincode,
            total: bands.total(),
            bands,
        }
    }

    pub fn category(&self) -> Category {
        self.bands.category()
    }
}

/// An ordered, immutable collection of records of one category.
///
/// Filtering never mutates a dataset; it produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    category: Category,
    records: Vec<Record>,
}

impl Dataset {
    /// Wrap `records`, dropping any whose bands belong to another category.
    pub fn new(category: Category, records: Vec<Record>) -> Self {
        let records = records
            .into_iter()
            .filter(|r| r.category() == category)
            .collect();
        Self { category, records }
    }

    pub fn empty(category: Category) -> Self {
        Self {
            category,
            records: Vec::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of `Total` over every record, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.records
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.total))
    }

    /// Latest record date, or `None` for an empty dataset.
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).max()
    }

    /// Distinct state names present in the dataset, sorted.
    pub fn states(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.state.clone()).collect()
    }

    /// A new dataset keeping only records for which `keep` holds.
    pub fn filtered(&self, keep: impl Fn(&Record) -> bool) -> Dataset {
        Dataset {
            category: self.category,
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Records whose state matches `state` exactly.
    pub fn for_state(&self, state: &str) -> Dataset {
        self.filtered(|r| r.state == state)
    }

    /// Records carrying `pincode`.
    pub fn for_pincode(&self, pincode: u32) -> Dataset {
        self.filtered(|r| r.pincode == pincode)
    }

    /// Records dated strictly after `cutoff`.
    pub fn after(&self, cutoff: NaiveDate) -> Dataset {
        self.filtered(|r| r.date > cutoff)
    }
}

/// The three datasets the dashboard works from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasets {
    pub enrolment: Dataset,
    pub biometric: Dataset,
    pub demographic: Dataset,
}

impl Default for Datasets {
    fn default() -> Self {
        Self {
            enrolment: Dataset::empty(Category::Enrolment),
            biometric: Dataset::empty(Category::Biometric),
            demographic: Dataset::empty(Category::Demographic),
        }
    }
}

impl Datasets {
    pub fn get(&self, category: Category) -> &Dataset {
        match category {
            Category::Enrolment => &self.enrolment,
            Category::Biometric => &self.biometric,
            Category::Demographic => &self.demographic,
        }
    }

    /// Total number of records across all three datasets.
    pub fn record_count(&self) -> usize {
        self.enrolment.len() + self.biometric.len() + self.demographic.len()
    }

    /// Apply the state part of `filter` to every dataset.
    pub fn filtered(&self, filter: &Filter) -> Datasets {
        Datasets {
            enrolment: filter.apply(&self.enrolment),
            biometric: filter.apply(&self.biometric),
            demographic: filter.apply(&self.demographic),
        }
    }
}

/// Filter input collected by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Normalised state name, or `None` for all of India.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Pincode to drill into, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<u32>,
}

impl Filter {
    pub fn all_india() -> Self {
        Self::default()
    }

    /// Build a filter from a selector value. [`ALL_INDIA`] (or a blank
    /// string) clears the state filter; anything else is normalised the
    /// same way the loader normalises state columns.
    pub fn from_selection(selection: &str) -> Self {
        let mut filter = Self::default();
        filter.select_state(selection);
        filter
    }

    pub fn select_state(&mut self, selection: &str) {
        let trimmed = selection.trim();
        self.state = if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_INDIA) {
            None
        } else {
            Some(crate::data_processors::normalize_region(trimmed))
        };
    }

    pub fn with_pincode(mut self, pincode: Option<u32>) -> Self {
        self.pincode = pincode;
        self
    }

    /// Human-readable scope label.
    pub fn state_label(&self) -> &str {
        self.state.as_deref().unwrap_or(ALL_INDIA)
    }

    /// Apply the state part of the filter to `dataset`.
    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        match &self.state {
            Some(state) => dataset.for_state(state),
            None => dataset.clone(),
        }
    }
}
