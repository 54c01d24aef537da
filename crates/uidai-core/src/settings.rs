use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data_processors::parse_pincode_query;
use crate::error::{DashboardError, Result};
use crate::models::{Filter, ALL_INDIA};
use crate::stats::{OutlierConfig, DEFAULT_ANOMALY_SIGMA, DEFAULT_ANOMALY_WINDOW_DAYS};

/// Rows read from each source file unless overridden.
pub const DEFAULT_ROW_LIMIT: usize = 50_000;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Operational analytics over identity-program enrolment and update extracts
#[derive(Parser, Debug, Clone)]
#[command(
    name = "uidai-dashboard",
    about = "Operational analytics over identity-program enrolment and update extracts",
    version
)]
pub struct Settings {
    /// Root directory holding enrollment/, biometric/ and demographic/ extracts
    #[arg(long, env = "UIDAI_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enrolment CSV file (repeatable; overrides directory discovery)
    #[arg(long = "enrolment-file")]
    pub enrolment_files: Vec<PathBuf>,

    /// Biometric-update CSV file (repeatable; overrides directory discovery)
    #[arg(long = "biometric-file")]
    pub biometric_files: Vec<PathBuf>,

    /// Demographic-update CSV file (repeatable; overrides directory discovery)
    #[arg(long = "demographic-file")]
    pub demographic_files: Vec<PathBuf>,

    /// Maximum rows read from each file (0 reads whole files)
    #[arg(long, default_value_t = DEFAULT_ROW_LIMIT)]
    pub row_limit: usize,

    /// Standard deviations above the mean that mark an anomalous district
    #[arg(long, default_value_t = DEFAULT_ANOMALY_SIGMA)]
    pub anomaly_sigma: f64,

    /// Days before the latest enrolment considered "recent" (1-365)
    #[arg(long, default_value_t = DEFAULT_ANOMALY_WINDOW_DAYS, value_parser = clap::value_parser!(i64).range(1..=365))]
    pub anomaly_window_days: i64,

    /// State filter
    #[arg(long, default_value = ALL_INDIA)]
    pub state: String,

    /// 6-digit pincode to drill into
    #[arg(long, value_parser = parse_pincode_arg)]
    pub pincode: Option<u32>,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Read filter commands from stdin and re-render after each change
    #[arg(long)]
    pub interactive: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

fn parse_pincode_arg(raw: &str) -> std::result::Result<u32, String> {
    parse_pincode_query(raw).map_err(|e| e.to_string())
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.uidai-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_sigma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_window_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl LastUsedParams {
    /// Directory holding dashboard state, `~/.uidai-dashboard`.
    pub fn app_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".uidai-dashboard")
    }

    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".uidai-dashboard").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation; accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                // Logging is not installed yet at this point.
                eprintln!("Could not clear saved configuration: {e}");
            }
            return Self::resolve_flags(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. File lists and the pincode are never restored.
        if !is_arg_explicitly_set(&matches, "data_dir") && settings.data_dir.is_none() {
            settings.data_dir = last.data_dir;
        }
        if !is_arg_explicitly_set(&matches, "row_limit") {
            if let Some(v) = last.row_limit {
                settings.row_limit = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "anomaly_sigma") {
            if let Some(v) = last.anomaly_sigma.filter(|v| v.is_finite() && *v > 0.0) {
                settings.anomaly_sigma = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "anomaly_window_days") {
            if let Some(v) = last
                .anomaly_window_days
                .filter(|v| (1..=365).contains(v))
            {
                settings.anomaly_window_days = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "state") {
            if let Some(v) = last.state {
                settings.state = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }

        settings = Self::resolve_flags(settings);

        // Invalid values are reported by `validate` and never persisted.
        if settings.validate().is_ok() {
            let params = LastUsedParams::from(&settings);
            if let Err(e) = params.save_to(config_path) {
                tracing::debug!("Could not persist last-used parameters: {}", e);
            }
        }

        settings
    }

    /// Check values clap cannot validate on its own.
    pub fn validate(&self) -> Result<()> {
        if !self.anomaly_sigma.is_finite() || self.anomaly_sigma <= 0.0 {
            return Err(DashboardError::Config(format!(
                "anomaly sigma must be a positive number, got {}",
                self.anomaly_sigma
            )));
        }
        if !(1..=365).contains(&self.anomaly_window_days) {
            return Err(DashboardError::Config(format!(
                "anomaly window must be between 1 and 365 days, got {}",
                self.anomaly_window_days
            )));
        }
        Ok(())
    }

    /// Per-file row cap; `None` means whole files are read.
    pub fn row_limit(&self) -> Option<usize> {
        (self.row_limit > 0).then_some(self.row_limit)
    }

    pub fn outlier_config(&self) -> OutlierConfig {
        OutlierConfig {
            sigma: self.anomaly_sigma,
            window_days: self.anomaly_window_days,
        }
    }

    /// The initial filter requested on the command line.
    pub fn filter(&self) -> Filter {
        Filter::from_selection(&self.state).with_pincode(self.pincode)
    }

    pub fn wants_json(&self) -> bool {
        self.format == "json"
    }

    /// `--debug` overrides the log level.
    fn resolve_flags(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_dir: s.data_dir.clone(),
            row_limit: Some(s.row_limit),
            anomaly_sigma: Some(s.anomaly_sigma),
            anomaly_window_days: Some(s.anomaly_window_days),
            state: Some(s.state.clone()),
            format: Some(s.format.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<OsString> {
        std::iter::once("uidai-dashboard")
            .chain(list.iter().copied())
            .map(OsString::from)
            .collect()
    }

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["uidai-dashboard"]);

        assert!(settings.enrolment_files.is_empty());
        assert_eq!(settings.row_limit, 50_000);
        assert_eq!(settings.row_limit(), Some(50_000));
        assert!((settings.anomaly_sigma - 2.0).abs() < f64::EPSILON);
        assert_eq!(settings.anomaly_window_days, 30);
        assert_eq!(settings.state, "All India");
        assert!(settings.pincode.is_none());
        assert_eq!(settings.format, "text");
        assert!(!settings.interactive);
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_row_limit_zero_means_unlimited() {
        let settings = Settings::parse_from(["uidai-dashboard", "--row-limit", "0"]);
        assert!(settings.row_limit().is_none());
    }

    #[test]
    fn test_repeatable_file_flags() {
        let settings = Settings::parse_from([
            "uidai-dashboard",
            "--enrolment-file",
            "a.csv",
            "--enrolment-file",
            "b.csv",
        ]);
        assert_eq!(
            settings.enrolment_files,
            vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]
        );
    }

    #[test]
    fn test_pincode_flag_is_validated() {
        let ok = Settings::try_parse_from(["uidai-dashboard", "--pincode", "411001"]).unwrap();
        assert_eq!(ok.pincode, Some(411001));

        let bad = Settings::try_parse_from(["uidai-dashboard", "--pincode", "4110"]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_filter_from_settings() {
        let settings =
            Settings::parse_from(["uidai-dashboard", "--state", "bihar", "--pincode", "800001"]);
        let filter = settings.filter();
        assert_eq!(filter.state.as_deref(), Some("Bihar"));
        assert_eq!(filter.pincode, Some(800001));
    }

    // ── validate ──────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_non_positive_sigma() {
        let mut settings = Settings::parse_from(["uidai-dashboard"]);
        assert!(settings.validate().is_ok());
        settings.anomaly_sigma = 0.0;
        assert!(matches!(settings.validate(), Err(DashboardError::Config(_))));
        settings.anomaly_sigma = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_window_days_range_enforced_by_clap() {
        let bad = Settings::try_parse_from(["uidai-dashboard", "--anomaly-window-days", "0"]);
        assert!(bad.is_err());
    }

    // ── LastUsedParams ────────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = LastUsedParams::config_path_in(tmp.path());
        let params = LastUsedParams {
            data_dir: Some(PathBuf::from("/srv/uidai")),
            row_limit: Some(1_000),
            anomaly_sigma: Some(3.0),
            anomaly_window_days: Some(14),
            state: Some("Kerala".to_string()),
            format: Some("json".to_string()),
        };

        params.save_to(&path).expect("save");
        let loaded = LastUsedParams::load_from(&path);

        assert_eq!(loaded, params);
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&LastUsedParams::config_path_in(tmp.path()));
        assert_eq!(loaded, LastUsedParams::default());
    }

    #[test]
    fn test_last_used_params_default_when_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("last_used.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(LastUsedParams::load_from(&path), LastUsedParams::default());
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = LastUsedParams::config_path_in(tmp.path());
        LastUsedParams::default().save_to(&path).expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
        // Clearing twice is fine.
        LastUsedParams::clear_at(&path).expect("clear again");
    }

    // ── load_with_last_used_impl ──────────────────────────────────────────────

    #[test]
    fn test_last_used_values_fill_unset_flags() {
        let tmp = TempDir::new().expect("tempdir");
        let path = LastUsedParams::config_path_in(tmp.path());
        LastUsedParams {
            row_limit: Some(10),
            state: Some("Goa".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .unwrap();

        let settings = Settings::load_with_last_used_impl(args(&[]), &path);
        assert_eq!(settings.row_limit, 10);
        assert_eq!(settings.state, "Goa");
    }

    #[test]
    fn test_cli_wins_over_last_used() {
        let tmp = TempDir::new().expect("tempdir");
        let path = LastUsedParams::config_path_in(tmp.path());
        LastUsedParams {
            row_limit: Some(10),
            ..Default::default()
        }
        .save_to(&path)
        .unwrap();

        let settings = Settings::load_with_last_used_impl(args(&["--row-limit", "99"]), &path);
        assert_eq!(settings.row_limit, 99);

        // The explicit value is persisted for the next run.
        assert_eq!(LastUsedParams::load_from(&path).row_limit, Some(99));
    }

    #[test]
    fn test_clear_flag_removes_config_and_ignores_it() {
        let tmp = TempDir::new().expect("tempdir");
        let path = LastUsedParams::config_path_in(tmp.path());
        LastUsedParams {
            state: Some("Goa".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .unwrap();

        let settings = Settings::load_with_last_used_impl(args(&["--clear"]), &path);
        assert_eq!(settings.state, "All India");
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_sigma_is_not_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let path = LastUsedParams::config_path_in(tmp.path());

        let rejected = Settings::load_with_last_used_impl(args(&["--anomaly-sigma", "0"]), &path);
        assert!(rejected.validate().is_err());

        let next = Settings::load_with_last_used_impl(args(&[]), &path);
        assert_eq!(next.anomaly_sigma, DEFAULT_ANOMALY_SIGMA);
        assert!(next.validate().is_ok());
    }

    #[test]
    fn test_invalid_saved_values_are_ignored() {
        let tmp = TempDir::new().expect("tempdir");
        let path = LastUsedParams::config_path_in(tmp.path());
        LastUsedParams {
            anomaly_sigma: Some(-1.5),
            anomaly_window_days: Some(0),
            row_limit: Some(10),
            ..Default::default()
        }
        .save_to(&path)
        .unwrap();

        let settings = Settings::load_with_last_used_impl(args(&[]), &path);
        assert_eq!(settings.anomaly_sigma, DEFAULT_ANOMALY_SIGMA);
        assert_eq!(settings.anomaly_window_days, DEFAULT_ANOMALY_WINDOW_DAYS);
        assert_eq!(settings.row_limit, 10);
        assert!(settings.validate().is_ok());

        // The cleaned-up values replace the bad ones on disk.
        let saved = LastUsedParams::load_from(&path);
        assert_eq!(saved.anomaly_sigma, Some(DEFAULT_ANOMALY_SIGMA));
        assert_eq!(saved.anomaly_window_days, Some(DEFAULT_ANOMALY_WINDOW_DAYS));
    }

    #[test]
    fn test_debug_flag_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let path = LastUsedParams::config_path_in(tmp.path());
        let settings = Settings::load_with_last_used_impl(args(&["--debug"]), &path);
        assert_eq!(settings.log_level, "DEBUG");
    }
}
