//! CSV discovery and loading for the identity-program extracts.
//!
//! Reads each category's source files, caps ingestion per file, normalises
//! dates and region names, and computes the per-row total.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use uidai_core::data_processors::{
    normalize_region, parse_count, parse_pincode_cell, DateParser,
};
use uidai_core::error::{DashboardError, Result};
use uidai_core::models::{AgeBands, Category, Dataset, Datasets, Record, BASE_COLUMNS};
use uidai_core::settings::DEFAULT_ROW_LIMIT;

// ── Source plan ───────────────────────────────────────────────────────────────

/// The list of source files to read for each category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SourcePlan {
    pub enrolment: Vec<PathBuf>,
    pub biometric: Vec<PathBuf>,
    pub demographic: Vec<PathBuf>,
}

impl SourcePlan {
    /// Every `.csv` file under `<data_dir>/<category dir>`.
    pub fn discover(data_dir: &Path) -> Self {
        Self {
            enrolment: find_csv_files(&data_dir.join(Category::Enrolment.directory())),
            biometric: find_csv_files(&data_dir.join(Category::Biometric.directory())),
            demographic: find_csv_files(&data_dir.join(Category::Demographic.directory())),
        }
    }

    /// The fixed split-file layout published with the program's API extracts.
    pub fn default_files(data_dir: &Path) -> Self {
        fn split(dir: &Path, stem: &str, bounds: &[u64]) -> Vec<PathBuf> {
            bounds
                .windows(2)
                .map(|w| dir.join(format!("api_data_aadhar_{}_{}_{}.csv", stem, w[0], w[1])))
                .collect()
        }

        Self {
            enrolment: split(
                &data_dir.join(Category::Enrolment.directory()),
                "enrolment",
                &[0, 500_000, 1_000_000, 1_006_029],
            ),
            biometric: split(
                &data_dir.join(Category::Biometric.directory()),
                "biometric",
                &[0, 500_000, 1_000_000, 1_500_000, 1_861_108],
            ),
            demographic: split(
                &data_dir.join(Category::Demographic.directory()),
                "demographic",
                &[0, 500_000, 1_000_000, 1_500_000, 2_000_000, 2_071_700],
            ),
        }
    }

    pub fn files(&self, category: Category) -> &[PathBuf] {
        match category {
            Category::Enrolment => &self.enrolment,
            Category::Biometric => &self.biometric,
            Category::Demographic => &self.demographic,
        }
    }

    /// Replace one category's file list when `files` is non-empty.
    pub fn with_override(mut self, category: Category, files: Vec<PathBuf>) -> Self {
        if files.is_empty() {
            return self;
        }
        match category {
            Category::Enrolment => self.enrolment = files,
            Category::Biometric => self.biometric = files,
            Category::Demographic => self.demographic = files,
        }
        self
    }
}

/// Find all `.csv` files recursively under `dir`, sorted by path.
pub fn find_csv_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Data directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

// ── Load options and report ───────────────────────────────────────────────────

/// Ingestion parameters shared by every category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Maximum data rows read from each file; `None` reads whole files.
    pub row_limit: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            row_limit: Some(DEFAULT_ROW_LIMIT),
        }
    }
}

/// A source file that could not be read and was left out of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// What happened while loading one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub category: Category,
    pub files_loaded: usize,
    /// Data rows consumed from the files (bounded by the row limit).
    pub rows_read: usize,
    /// Rows dropped because a value could not be parsed.
    pub rows_skipped: usize,
    pub skipped_files: Vec<SkippedFile>,
}

impl LoadReport {
    fn new(category: Category) -> Self {
        Self {
            category,
            files_loaded: 0,
            rows_read: 0,
            rows_skipped: 0,
            skipped_files: Vec::new(),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load one category from `files`, preserving file and row order.
///
/// Unreadable files are skipped and listed in the report; if none load the
/// dataset is empty. A file missing a required column aborts the load with
/// [`DashboardError::Schema`].
pub fn load_dataset(
    files: &[PathBuf],
    category: Category,
    options: &LoadOptions,
) -> Result<(Dataset, LoadReport)> {
    let mut report = LoadReport::new(category);
    let mut records: Vec<Record> = Vec::new();

    for path in files {
        match read_file(path, category, options.row_limit) {
            Ok(file_rows) => {
                debug!(
                    "{} file {}: {} rows read, {} skipped",
                    category,
                    path.display(),
                    file_rows.rows_read,
                    file_rows.rows_skipped,
                );
                report.files_loaded += 1;
                report.rows_read += file_rows.rows_read;
                report.rows_skipped += file_rows.rows_skipped;
                records.extend(file_rows.records);
            }
            Err(e) if e.is_fatal_for_load() => return Err(e),
            Err(e) => {
                warn!("Error loading {}: {}", path.display(), e);
                report.skipped_files.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if report.files_loaded == 0 {
        warn!("No {} files could be loaded; dataset is empty", category);
    }

    info!(
        "Loaded {} {} records from {} of {} files",
        records.len(),
        category,
        report.files_loaded,
        files.len()
    );

    Ok((Dataset::new(category, records), report))
}

/// Load all three categories described by `plan`.
pub fn load_all(plan: &SourcePlan, options: &LoadOptions) -> Result<(Datasets, Vec<LoadReport>)> {
    let (enrolment, enrol_report) =
        load_dataset(plan.files(Category::Enrolment), Category::Enrolment, options)?;
    let (biometric, bio_report) =
        load_dataset(plan.files(Category::Biometric), Category::Biometric, options)?;
    let (demographic, demo_report) =
        load_dataset(plan.files(Category::Demographic), Category::Demographic, options)?;

    Ok((
        Datasets {
            enrolment,
            biometric,
            demographic,
        },
        vec![enrol_report, bio_report, demo_report],
    ))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Rows parsed from a single file.
struct FileRows {
    records: Vec<Record>,
    rows_read: usize,
    rows_skipped: usize,
}

/// Header positions of the columns a category needs.
struct ColumnMap {
    date: usize,
    state: usize,
    district: usize,
    pincode: usize,
    bands: Vec<usize>,
}

impl ColumnMap {
    fn from_headers(
        headers: &csv::StringRecord,
        category: Category,
        path: &Path,
    ) -> Result<Self> {
        let positions = category
            .required_columns()
            .into_iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| DashboardError::Schema {
                        category,
                        path: path.to_path_buf(),
                        column: name.to_string(),
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        // Base columns first, then the category's bands.
        Ok(Self {
            date: positions[0],
            state: positions[1],
            district: positions[2],
            pincode: positions[3],
            bands: positions[BASE_COLUMNS.len()..].to_vec(),
        })
    }
}

fn read_file(path: &Path, category: Category, row_limit: Option<usize>) -> Result<FileRows> {
    let file = std::fs::File::open(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(std::io::BufReader::new(file));

    let csv_err = |source: csv::Error| DashboardError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(csv_err)?.clone();
    let columns = ColumnMap::from_headers(&headers, category, path)?;

    let mut out = FileRows {
        records: Vec::new(),
        rows_read: 0,
        rows_skipped: 0,
    };

    for result in reader.records() {
        if row_limit.is_some_and(|limit| out.rows_read >= limit) {
            debug!("Reached row limit for {}", path.display());
            break;
        }
        let row = result.map_err(csv_err)?;
        out.rows_read += 1;

        match parse_row(&row, &columns, category) {
            Some(record) => out.records.push(record),
            None => {
                out.rows_skipped += 1;
                debug!(
                    "Skipping malformed row {} in {}",
                    out.rows_read,
                    path.display()
                );
            }
        }
    }

    if out.rows_skipped > 0 {
        warn!(
            "Skipped {} malformed rows in {}",
            out.rows_skipped,
            path.display()
        );
    }

    Ok(out)
}

/// Convert one CSV row into a [`Record`], or `None` when any required value
/// is missing or unparseable.
fn parse_row(row: &csv::StringRecord, columns: &ColumnMap, category: Category) -> Option<Record> {
    let date = DateParser::parse_day_first(row.get(columns.date)?)?;
    let state = normalize_region(row.get(columns.state)?);
    let district = normalize_region(row.get(columns.district)?);
    let pincode = parse_pincode_cell(row.get(columns.pincode)?)?;

    let values = columns
        .bands
        .iter()
        .map(|&i| row.get(i).and_then(parse_count))
        .collect::<Option<Vec<u64>>>()?;
    let bands = AgeBands::from_values(category, &values)?;

    Some(Record::new(date, state, district, pincode, bands))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
