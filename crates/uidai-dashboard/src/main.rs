mod bootstrap;

use std::io::{self, BufRead, Write};

use anyhow::Result;
use uidai_core::models::Category;
use uidai_core::settings::Settings;
use uidai_data::analysis::DashboardViews;
use uidai_data::metrics::MetricsEngine;
use uidai_data::reader::{LoadOptions, SourcePlan};
use uidai_report::{render_inspector, render_json, render_text};
use uidai_runtime::data_manager::DataManager;
use uidai_runtime::session::{DashboardSession, SessionCommand};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level)?;
    settings.validate()?;

    tracing::info!("UIDAI Dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    let data_path = bootstrap::discover_data_path(settings.data_dir.as_deref())?;
    tracing::info!(
        "Data: {}, Scope: {}, Row limit: {}",
        data_path.display(),
        settings.filter().state_label(),
        settings
            .row_limit()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let plan = SourcePlan::discover(&data_path)
        .with_override(Category::Enrolment, settings.enrolment_files.clone())
        .with_override(Category::Biometric, settings.biometric_files.clone())
        .with_override(Category::Demographic, settings.demographic_files.clone());
    let options = LoadOptions {
        row_limit: settings.row_limit(),
    };

    let manager = DataManager::new(plan, options);
    let mut session = DashboardSession::new(
        manager,
        MetricsEngine::new(settings.outlier_config()),
        settings.filter(),
    );

    for report in session.load_reports()? {
        for skipped in &report.skipped_files {
            eprintln!("skipped {}: {}", skipped.path.display(), skipped.reason);
        }
    }

    if settings.interactive {
        run_interactive(&mut session, settings.wants_json())?;
    } else {
        print_views(&session.views()?, settings.wants_json())?;
    }

    Ok(())
}

fn print_views(views: &DashboardViews, json: bool) -> Result<()> {
    let out = if json {
        render_json(views)?
    } else {
        render_text(views)
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{out}")?;
    stdout.flush()?;
    Ok(())
}

/// Read commands from stdin until `quit` or end of input.
fn run_interactive(session: &mut DashboardSession, json: bool) -> Result<()> {
    tracing::info!("Interactive mode; type `help` for commands");
    print_views(&session.views()?, json)?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let Some(command) = SessionCommand::parse(&line) else {
            continue;
        };

        match command {
            SessionCommand::State(name) => {
                session.select_state(&name);
                print_views(&session.views()?, json)?;
            }
            SessionCommand::AllIndia => {
                session.clear_state();
                print_views(&session.views()?, json)?;
            }
            SessionCommand::Pincode(Some(raw)) => match session.search_pincode(&raw) {
                Ok(_) => print_views(&session.views()?, json)?,
                Err(e) => eprintln!("{e}"),
            },
            SessionCommand::Pincode(None) => {
                session.clear_pincode();
                print_views(&session.views()?, json)?;
            }
            SessionCommand::Show => {
                let views = session.views()?;
                print_views(&views, false)?;
                println!("{}", render_inspector(&views));
            }
            SessionCommand::Json => print_views(&session.views()?, true)?,
            SessionCommand::Reload => match session.reload() {
                Ok(views) => print_views(&views, json)?,
                Err(e) => eprintln!("reload failed: {e}"),
            },
            SessionCommand::Help => println!("{}", SessionCommand::help_text()),
            SessionCommand::Quit => break,
            SessionCommand::Unknown(input) => {
                eprintln!("unknown command: {input} (type `help`)");
            }
        }
    }

    tracing::info!("Session closed");
    Ok(())
}
