//! Display-ready progress reports.

use serde::{Deserialize, Serialize};
use studymate_core::ProgressReport;

use crate::error::{LedgerError, Result};

/// Placeholder shown for an empty bucket.
pub const EMPTY_BUCKET: &str = "none yet";

/// A progress report shaped for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportView {
    /// Roadmap identifier
    pub roadmap_id: String,

    /// Percentage rounded to one decimal place
    pub completion_percentage: f64,

    /// e.g. `50.0%`
    pub percentage_label: String,

    /// e.g. `1/2 milestones completed`
    pub summary: String,

    /// Day tracking started (`YYYY-MM-DD`)
    pub started_on: String,

    /// Completed milestone names, or the empty-bucket placeholder
    pub completed: Vec<String>,

    /// In-progress milestone names, or the empty-bucket placeholder
    pub in_progress: Vec<String>,

    /// Upcoming milestone names, or the empty-bucket placeholder
    pub upcoming: Vec<String>,
}

/// Round to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Shape a report for display.
pub fn format_report(report: &ProgressReport) -> Result<ReportView> {
    check_shape(report)?;

    let completion_percentage = round_to_tenth(report.completion_percentage);
    Ok(ReportView {
        roadmap_id: report.roadmap_id.clone(),
        completion_percentage,
        percentage_label: format!("{:.1}%", completion_percentage),
        summary: format!(
            "{}/{} milestones completed",
            report.completed, report.total_milestones
        ),
        started_on: report.started_at.format("%Y-%m-%d").to_string(),
        completed: bucket(&report.completed_milestones),
        in_progress: bucket(&report.current_milestones),
        upcoming: bucket(&report.upcoming_milestones),
    })
}

/// Render a view as the plain-text block shown to the learner.
pub fn render_text(view: &ReportView) -> String {
    let mut out = String::new();
    out.push_str(&format!("Progress for {} (since {})\n", view.roadmap_id, view.started_on));
    out.push_str(&format!("🎯 Overall: {} ({})\n", view.percentage_label, view.summary));
    out.push_str(&format!("✅ Completed: {}\n", view.completed.join(", ")));
    out.push_str(&format!("🔄 In progress: {}\n", view.in_progress.join(", ")));
    out.push_str(&format!("📅 Upcoming: {}\n", view.upcoming.join(", ")));
    out
}

fn bucket(names: &[String]) -> Vec<String> {
    if names.is_empty() {
        vec![EMPTY_BUCKET.to_string()]
    } else {
        names.to_vec()
    }
}

fn check_shape(report: &ProgressReport) -> Result<()> {
    let buckets = [
        ("completed", report.completed, report.completed_milestones.len()),
        ("in_progress", report.in_progress, report.current_milestones.len()),
        ("not_started", report.not_started, report.upcoming_milestones.len()),
    ];
    for (name, count, listed) in buckets {
        if count != listed {
            return Err(LedgerError::Validation(format!(
                "{} count {} does not match {} listed milestones",
                name, count, listed
            )));
        }
    }

    let sum = report.completed + report.in_progress + report.not_started;
    if sum != report.total_milestones {
        return Err(LedgerError::Validation(format!(
            "bucket counts sum to {} but total is {}",
            sum, report.total_milestones
        )));
    }

    let pct = report.completion_percentage;
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(LedgerError::Validation(format!(
            "completion percentage {} outside 0-100",
            pct
        )));
    }
    Ok(())
}
