//! Filter state for one dashboard session.
//!
//! [`DashboardSession`] owns the data manager and the current [`Filter`].
//! Every call to [`DashboardSession::views`] recomputes all views from the
//! cached datasets; nothing derived is kept between calls.

use tracing::{debug, info};
use uidai_core::data_processors::parse_pincode_query;
use uidai_core::error::Result;
use uidai_core::models::Filter;
use uidai_data::analysis::{recompute, DashboardViews};
use uidai_data::metrics::MetricsEngine;
use uidai_data::reader::LoadReport;

use crate::data_manager::DataManager;

// ── SessionCommand ────────────────────────────────────────────────────────────

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// `state <name>`
    State(String),
    /// `all`
    AllIndia,
    /// `pincode <n>`; `pincode` alone clears the search.
    Pincode(Option<String>),
    Show,
    Json,
    Reload,
    Help,
    Quit,
    Unknown(String),
}

impl SessionCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        let cmd = match word.to_ascii_lowercase().as_str() {
            "state" if !rest.is_empty() => SessionCommand::State(rest.to_string()),
            "all" => SessionCommand::AllIndia,
            "pincode" | "pin" => {
                SessionCommand::Pincode((!rest.is_empty()).then(|| rest.to_string()))
            }
            "show" => SessionCommand::Show,
            "json" => SessionCommand::Json,
            "reload" => SessionCommand::Reload,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" | "q" => SessionCommand::Quit,
            _ => SessionCommand::Unknown(line.to_string()),
        };
        Some(cmd)
    }

    pub fn help_text() -> &'static str {
        "Commands:\n  \
         state <name>   filter to one state\n  \
         all            show all of India\n  \
         pincode <n>    search a 6-digit pincode (no argument clears it)\n  \
         show           print the dashboard as text\n  \
         json           print the dashboard as JSON\n  \
         reload         re-read the source files\n  \
         help           show this message\n  \
         quit           exit"
    }
}

// ── DashboardSession ──────────────────────────────────────────────────────────

pub struct DashboardSession {
    manager: DataManager,
    engine: MetricsEngine,
    filter: Filter,
}

impl DashboardSession {
    pub fn new(manager: DataManager, engine: MetricsEngine, filter: Filter) -> Self {
        Self {
            manager,
            engine,
            filter,
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Select a state by name; "All India" clears the state filter.
    pub fn select_state(&mut self, selection: &str) -> &Filter {
        self.filter.select_state(selection);
        info!("Scope set to {}", self.filter.state_label());
        &self.filter
    }

    pub fn clear_state(&mut self) {
        self.filter.state = None;
        info!("Scope set to {}", self.filter.state_label());
    }

    /// Validate and set the pincode to drill into.
    pub fn search_pincode(&mut self, raw: &str) -> Result<u32> {
        let pincode = parse_pincode_query(raw)?;
        self.filter.pincode = Some(pincode);
        debug!("Pincode search set to {}", pincode);
        Ok(pincode)
    }

    pub fn clear_pincode(&mut self) {
        self.filter.pincode = None;
    }

    /// Recompute every view for the current filter.
    pub fn views(&mut self) -> Result<DashboardViews> {
        let loaded = self.manager.get_data(false)?;
        let mut views = recompute(&loaded.datasets, &self.filter, &self.engine);
        views.metadata.load_seconds = Some(loaded.load_seconds);
        if let Some(age) = self.manager.cache_age() {
            debug!(cache_age_secs = age.as_secs_f64(), "views recomputed from cache");
        }
        Ok(views)
    }

    /// Re-read the sources, then recompute.
    pub fn reload(&mut self) -> Result<DashboardViews> {
        self.manager.get_data(true)?;
        self.views()
    }

    /// Per-category load reports of the cached datasets.
    pub fn load_reports(&mut self) -> Result<Vec<LoadReport>> {
        Ok(self.manager.get_data(false)?.reports.clone())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
