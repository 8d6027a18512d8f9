use exergy::engine::displacement::{DisplacementMetrics, PeriodChange, PeriodSummary, SectorSummary};
use exergy::engine::error::ConsistencyError;
use exergy::engine::metric::Metric;
use exergy::engine::records::AggregateRecord;
use exergy::workflows::analyze::AnalysisReport;
use std::fmt::Write;

/// Shares and efficiencies are fractions; growth and rate metrics already arrive
/// in percent.
fn percent(metric: Metric) -> Metric {
    metric.map(|v| v * 100.0)
}

pub fn render_aggregates(aggregates: &[AggregateRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:>6} {:>4} {:>10} {:>10} {:>10} {:>8} {:>8} {:>8} {:>7}",
        "Region", "Year", "Unit", "Primary", "Useful", "Services", "Clean U%", "Clean S%", "Leverage", "Eff %"
    );
    for a in aggregates {
        let _ = writeln!(
            out,
            "{:<16} {:>6} {:>4} {:>10.2} {:>10.2} {:>10.2} {:>8.1} {:>8.1} {:>8.2} {:>7.1}",
            a.region.name(),
            a.year,
            a.unit.symbol(),
            a.primary.total,
            a.useful.total,
            a.services.total,
            percent(a.clean_share_useful),
            percent(a.clean_share_services),
            a.leverage,
            percent(a.overall_efficiency),
        );
    }
    out
}

pub fn render_displacement(records: &[DisplacementMetrics]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:>9} {:>8} {:>10} {:>10} {:>10} {:>12} {:>8} {:>10}",
        "Region", "Period", "Tier", "dFossil", "dClean", "Displaced", "FF growth %", "Net", "Rate %"
    );
    for d in records {
        let _ = writeln!(
            out,
            "{:<16} {:>9} {:>8} {:>10.2} {:>10.2} {:>10.2} {:>12.1} {:>8.2} {:>10.1}",
            d.region.name(),
            format!("{}-{}", d.from_year, d.to_year),
            d.tier.to_string(),
            d.delta_fossil,
            d.delta_clean,
            d.displacement,
            d.ff_growth,
            d.net_change,
            d.displacement_rate,
        );
    }
    out
}

fn change_header(out: &mut String, label: &str) {
    let _ = writeln!(
        out,
        "{:<16} {:>9} {:<14} {:>10} {:>10} {:>8} {:>10} {:>10} {:>9}",
        "Region", "Period", label, "Start", "End", "CAGR %", "Fossil %0", "Fossil %1", "Δ share"
    );
}

fn change_row(out: &mut String, region: &str, period: String, label: String, c: &PeriodChange) {
    let _ = writeln!(
        out,
        "{:<16} {:>9} {:<14} {:>10.2} {:>10.2} {:>8.2} {:>10.1} {:>10.1} {:>9.1}",
        region,
        period,
        label,
        c.start_total,
        c.end_total,
        c.cagr,
        percent(c.fossil_share_start),
        percent(c.fossil_share_end),
        percent(c.fossil_share_change),
    );
}

pub fn render_summaries(summaries: &[PeriodSummary]) -> String {
    let mut out = String::new();
    change_header(&mut out, "Tier");
    for s in summaries {
        change_row(
            &mut out,
            s.region.name(),
            format!("{}-{}", s.from_year, s.to_year),
            s.tier.to_string(),
            &s.change,
        );
    }
    out
}

pub fn render_sector_summaries(summaries: &[SectorSummary]) -> String {
    let mut out = String::new();
    change_header(&mut out, "Sector");
    for s in summaries {
        change_row(
            &mut out,
            s.region.name(),
            format!("{}-{}", s.from_year, s.to_year),
            s.sector.to_string(),
            &s.change,
        );
    }
    out
}

pub fn render_issues(issues: &[ConsistencyError]) -> String {
    issues.iter().fold(String::new(), |mut out, issue| {
        let _ = writeln!(out, "  ! {}", issue);
        out
    })
}

/// The full table-format report, sections separated by a blank line.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut sections = vec![
        format!("Aggregates\n{}", render_aggregates(&report.aggregates)),
        format!("Displacement\n{}", render_displacement(&report.displacement)),
    ];
    if !report.summaries.is_empty() {
        sections.push(format!("Period summaries\n{}", render_summaries(&report.summaries)));
    }
    if !report.sector_summaries.is_empty() {
        sections.push(format!(
            "Energy services by sector\n{}",
            render_sector_summaries(&report.sector_summaries)
        ));
    }
    if !report.issues.is_empty() {
        sections.push(format!(
            "Consistency issues ({})\n{}",
            report.issues.len(),
            render_issues(&report.issues)
        ));
    }
    sections.join("\n")
}
