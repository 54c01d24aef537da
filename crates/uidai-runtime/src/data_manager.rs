//! Cached dataset loader for a dashboard session.
//!
//! Source files are read once and kept in memory; the cache is keyed on the
//! file lists and the load options, so filter changes never touch the disk.
//! Callers use [`DataManager::get_data`] to obtain the loaded
//! [`LoadedData`]; a failed reload falls back to the previous cache.

use std::time::{Duration, Instant};

use tracing::{debug, warn};
use uidai_core::error::{DashboardError, Result};
use uidai_core::models::Datasets;
use uidai_data::reader::{load_all, LoadOptions, LoadReport, SourcePlan};

// ── LoadedData ────────────────────────────────────────────────────────────────

/// Datasets plus what happened while loading them.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub datasets: Datasets,
    pub reports: Vec<LoadReport>,
    /// Wall-clock seconds spent reading and parsing.
    pub load_seconds: f64,
}

// ── DataManager ───────────────────────────────────────────────────────────────

/// Loads the three datasets once per source configuration.
///
/// # Example
/// ```no_run
/// use uidai_runtime::data_manager::DataManager;
/// use uidai_data::reader::{LoadOptions, SourcePlan};
///
/// let plan = SourcePlan::discover(std::path::Path::new("data"));
/// let mut mgr = DataManager::new(plan, LoadOptions::default());
/// if let Ok(loaded) = mgr.get_data(false) {
///     println!("records: {}", loaded.datasets.record_count());
/// }
/// ```
pub struct DataManager {
    plan: SourcePlan,
    options: LoadOptions,
    /// Most recently loaded data.
    cache: Option<LoadedData>,
    /// Sources the cache was loaded from.
    cache_key: Option<(SourcePlan, LoadOptions)>,
    /// When the cache was last populated.
    cache_timestamp: Option<Instant>,
    /// Human-readable description of the last error encountered.
    last_error: Option<String>,
}

impl DataManager {
    pub fn new(plan: SourcePlan, options: LoadOptions) -> Self {
        Self {
            plan,
            options,
            cache: None,
            cache_key: None,
            cache_timestamp: None,
            last_error: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the loaded datasets, reading the sources only when the cache
    /// is empty, was loaded from different sources, or `force_reload` is set.
    ///
    /// A failed reload keeps serving the previous cache; a failure with no
    /// cache is returned to the caller.
    pub fn get_data(&mut self, force_reload: bool) -> Result<&LoadedData> {
        if !force_reload && self.is_cache_valid() {
            debug!("returning cached datasets");
        } else {
            match self.load_fresh() {
                Ok(loaded) => {
                    debug!(
                        records = loaded.datasets.record_count(),
                        seconds = loaded.load_seconds,
                        "dataset cache updated"
                    );
                    self.cache = Some(loaded);
                    self.cache_key = Some((self.plan.clone(), self.options.clone()));
                    self.cache_timestamp = Some(Instant::now());
                    self.last_error = None;
                }
                Err(e) => {
                    self.last_error = Some(e.to_string());
                    if self.cache.is_none() {
                        return Err(e);
                    }
                    warn!(error = %e, "reload failed; keeping previously loaded datasets");
                }
            }
        }

        self.cache
            .as_ref()
            .ok_or_else(|| DashboardError::Config("no datasets loaded".to_string()))
    }

    /// Discard the current cache, forcing the next `get_data` call to load.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_key = None;
        self.cache_timestamp = None;
        debug!("dataset cache invalidated");
    }

    /// Age of the current cache entry, or `None` if nothing has been loaded.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Human-readable description of the last load error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// `true` when the cache was loaded from the current sources.
    fn is_cache_valid(&self) -> bool {
        match (&self.cache, &self.cache_key) {
            (Some(_), Some((plan, options))) => *plan == self.plan && *options == self.options,
            _ => false,
        }
    }

    fn load_fresh(&self) -> Result<LoadedData> {
        let started = Instant::now();
        let (datasets, reports) = load_all(&self.plan, &self.options)?;
        Ok(LoadedData {
            datasets,
            reports,
            load_seconds: started.elapsed().as_secs_f64(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
