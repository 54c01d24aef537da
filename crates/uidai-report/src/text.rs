//! Plain-text rendering of [`DashboardViews`].

use std::fmt::Write as _;

use uidai_core::formatting::{format_count, format_growth, format_index};
use uidai_data::aggregator::AggregatedPeriod;
use uidai_data::analysis::{DashboardViews, PincodeResult, RankedEntry};
use uidai_data::metrics::AnomalyReport;

use crate::table::{Align, TextTable};

/// Render every section of `views` as one printable report.
pub fn render_text(views: &DashboardViews) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "UIDAI Analytics Dashboard: {}",
        views.metadata.filter.state_label()
    );
    let _ = writeln!(out, "Generated {}", views.metadata.generated_at);
    out.push('\n');

    section(&mut out, "Headline", &headline_table(views));
    section(
        &mut out,
        "Regional Performance (Top States)",
        &ranked_table("State", &views.top_states),
    );
    section(&mut out, "Monthly Trend", &period_table("Month", &views.monthly_trend));
    section(
        &mut out,
        "High Pressure Districts",
        &ranked_table("District", &views.high_pressure_districts),
    );
    section(
        &mut out,
        "Newborn (0-5) Focus",
        &ranked_table("State", &views.newborn_focus),
    );
    section(&mut out, "Service Health: Pressure Index", &pressure_table(views));
    section(&mut out, "Saturation Analysis", &saturation_table(views));

    let _ = writeln!(out, "== Growth ==");
    match &views.growth {
        Some(g) => {
            let _ = writeln!(
                out,
                "Month-over-month enrolment growth: {} ({} -> {})",
                format_growth(g.growth),
                format_count(g.previous_total),
                format_count(g.latest_total)
            );
        }
        None => {
            let _ = writeln!(out, "Not enough monthly data for a growth figure.");
        }
    }
    out.push('\n');

    out.push_str(&render_anomalies(&views.anomalies));
    out.push('\n');

    if let Some(result) = &views.pincode {
        out.push_str(&render_pincode(result));
        out.push('\n');
    }

    let _ = writeln!(out, "== Digital Action Plan ==");
    for directive in views.recommendations.directives() {
        let _ = writeln!(out, "[{}] {}", directive.heading(), directive.message());
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "{} of {} records in scope; computed in {:.3}s{}",
        format_count(views.metadata.filtered_records as u64),
        format_count(views.metadata.loaded_records as u64),
        views.metadata.compute_seconds,
        views
            .metadata
            .load_seconds
            .map(|s| format!(", loaded in {s:.2}s"))
            .unwrap_or_default()
    );
    out
}

/// The data inspector: the first enrolment rows in scope.
pub fn render_inspector(views: &DashboardViews) -> String {
    let mut table = TextTable::new(&[
        ("Date", Align::Left),
        ("State", Align::Left),
        ("District", Align::Left),
        ("Pincode", Align::Right),
        ("0-5", Align::Right),
        ("Total", Align::Right),
    ]);
    for r in &views.inspector {
        table.push_row(vec![
            r.date.format("%d-%m-%Y").to_string(),
            r.state.clone(),
            r.district.clone(),
            r.pincode.to_string(),
            format_count(r.bands.age_0_5()),
            format_count(r.total),
        ]);
    }
    let mut out = String::new();
    section(&mut out, "Data Inspector", &table);
    out
}

/// Outcome of a pincode drill-down.
pub fn render_pincode(result: &PincodeResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Pincode {} ==", result.pincode());
    match result {
        PincodeResult::Found {
            enrolment_total,
            biometric_total,
            daily_trend,
            ..
        } => {
            let _ = writeln!(out, "Local enrolments:         {}", format_count(*enrolment_total));
            let _ = writeln!(out, "Local biometric updates:  {}", format_count(*biometric_total));
            if !daily_trend.is_empty() {
                out.push_str(&period_table("Date", daily_trend).render());
            }
        }
        PincodeResult::NoData { .. } => {
            let _ = writeln!(out, "No data found for this pincode.");
        }
    }
    out
}

pub fn render_anomalies(report: &AnomalyReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Anomalies ==");
    match (report.threshold, report.cutoff) {
        (Some(t), Some(cutoff)) => {
            let _ = writeln!(
                out,
                "{} districts active after {}; threshold {}",
                report.districts_considered,
                cutoff,
                format_index(t)
            );
        }
        _ => {
            let _ = writeln!(out, "Not enough recent district activity to test for outliers.");
        }
    }
    for a in &report.anomalies {
        let _ = writeln!(out, "  {}: {}", a.district, format_count(a.recent_total));
    }
    out
}

// ── Section builders ──────────────────────────────────────────────────────────

fn section(out: &mut String, title: &str, table: &TextTable) {
    let _ = writeln!(out, "== {title} ==");
    if table.is_empty() {
        let _ = writeln!(out, "(no data)");
    } else {
        out.push_str(&table.render());
    }
    out.push('\n');
}

fn headline_table(views: &DashboardViews) -> TextTable {
    let h = &views.headline;
    let mut table = TextTable::new(&[
        ("Dataset", Align::Left),
        ("Total", Align::Right),
        ("Rows", Align::Right),
    ]);
    for (label, total, rows) in [
        ("Total Enrolments", h.enrolment_total, h.enrolment_rows),
        ("Biometric Updates", h.biometric_total, h.biometric_rows),
        ("Demographic Updates", h.demographic_total, h.demographic_rows),
    ] {
        table.push_row(vec![
            label.to_string(),
            format_count(total),
            format_count(rows as u64),
        ]);
    }
    table
}

fn ranked_table(label: &str, entries: &[RankedEntry]) -> TextTable {
    let mut table = TextTable::new(&[(label, Align::Left), ("Total", Align::Right)]);
    for e in entries {
        table.push_row(vec![e.name.clone(), format_count(e.total)]);
    }
    table
}

fn period_table(label: &str, periods: &[AggregatedPeriod]) -> TextTable {
    let mut table = TextTable::new(&[(label, Align::Left), ("Total", Align::Right)]);
    for p in periods {
        table.push_row(vec![p.period_key.clone(), format_count(p.total)]);
    }
    table
}

fn pressure_table(views: &DashboardViews) -> TextTable {
    let mut table = TextTable::new(&[
        ("District", Align::Left),
        ("Biometric", Align::Right),
        ("Enrolment", Align::Right),
        ("Pressure", Align::Right),
    ]);
    for row in &views.district_pressure {
        table.push_row(vec![
            row.district.clone(),
            format_count(row.biometric_total),
            format_count(row.enrolment_total),
            format_index(row.pressure_index),
        ]);
    }
    table
}

fn saturation_table(views: &DashboardViews) -> TextTable {
    let mut table = TextTable::new(&[
        ("State", Align::Left),
        ("Enrolment", Align::Right),
        ("Updates", Align::Right),
        ("Saturation", Align::Right),
    ]);
    for row in &views.saturation {
        table.push_row(vec![
            row.state.clone(),
            format_count(row.enrolment_total),
            format_count(row.update_total),
            format_index(row.saturation_index),
        ]);
    }
    table
}
