use std::fmt::Write;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::dcma::{DcmaReport, MetricName};
use crate::models::Schedule;

const HOURS_PER_DAY: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub task_id: String,
    pub task_name: String,
    pub target_drtn_hr_cnt: f64,
    pub total_float_hr_cnt: f64,
    pub target_start_date: Option<String>,
    pub target_end_date: Option<String>,
    pub status_code: String,
}

/// Flat task table, at most `limit` rows per project. Durations and float are
/// converted to hours on an 8-hour day; absent values become zero.
pub fn task_rows(schedule: &Schedule, limit: usize) -> Vec<TaskRow> {
    schedule
        .projects
        .iter()
        .flat_map(|project| project.activities.iter().take(limit))
        .map(|activity| TaskRow {
            task_id: activity.id.clone(),
            task_name: activity.name.clone(),
            target_drtn_hr_cnt: activity.duration.unwrap_or(0.0) * HOURS_PER_DAY,
            total_float_hr_cnt: activity.total_float.unwrap_or(0.0) * HOURS_PER_DAY,
            target_start_date: activity.start.as_ref().map(iso),
            target_end_date: activity.finish.as_ref().map(iso),
            status_code: activity.status.code().to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedActivity {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub duration: Option<f64>,
    pub total_float: Option<f64>,
    pub status: String,
    pub task_type: crate::models::TaskType,
    pub start: Option<String>,
    pub finish: Option<String>,
    pub percent_complete: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedProject {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub activities: Vec<ParsedActivity>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseMeta {
    pub file_type: &'static str,
    pub total_projects: usize,
    pub total_activities: usize,
    pub parsed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseSummary {
    pub projects: Vec<ParsedProject>,
    pub meta: ParseMeta,
}

pub fn parse_summary(schedule: &Schedule) -> ParseSummary {
    let projects = schedule
        .projects
        .iter()
        .map(|project| ParsedProject {
            id: project.id.clone(),
            name: project.name.clone(),
            full_name: project
                .full_name
                .clone()
                .unwrap_or_else(|| project.name.clone()),
            activities: project
                .activities
                .iter()
                .map(|a| ParsedActivity {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    code: a.code.clone(),
                    duration: a.duration,
                    total_float: a.total_float,
                    status: a.status.code().to_string(),
                    task_type: a.task_type,
                    start: a.start.as_ref().map(iso),
                    finish: a.finish.as_ref().map(iso),
                    percent_complete: a.percent_complete.unwrap_or(0.0),
                })
                .collect(),
        })
        .collect();

    ParseSummary {
        projects,
        meta: ParseMeta {
            file_type: "xer",
            total_projects: schedule.projects.len(),
            total_activities: schedule.activity_count(),
            parsed_at: Utc::now(),
        },
    }
}

fn iso(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub fn build_report(source: &str, report: &DcmaReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# DCMA 14-Point Assessment");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        source,
        report.summary.analyzed_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Overall score: **{:.2}**", report.overall_score);
    let _ = writeln!(
        output,
        "Activities analyzed: {} | Critical issues: {}",
        report.summary.total_activities, report.summary.critical_issues
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Metric Scores");
    let _ = writeln!(output, "| Metric | Score |");
    let _ = writeln!(output, "|--------|-------|");
    for name in MetricName::ALL {
        let _ = writeln!(
            output,
            "| {} | {:.2} |",
            name.label(),
            report.metrics.score(name)
        );
    }

    let m = &report.metrics;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Findings");
    let _ = writeln!(
        output,
        "- {} of {} tasks without predecessors, {} without successors (milestones excluded)",
        m.logic.tasks_without_predecessors, m.logic.total_tasks, m.logic.tasks_without_successors
    );
    let _ = writeln!(
        output,
        "- {} leads, {} lags over {} days, {} non-FS links across {} relationships",
        m.leads.leads_found,
        m.lags.excessive_lags,
        m.lags.threshold,
        m.relationship_types.non_fs_relationships,
        m.relationship_types.total_relationships
    );
    let _ = writeln!(
        output,
        "- {} hard constraints, {} high float, {} negative float, {} long durations",
        m.hard_constraints.constrained_tasks,
        m.high_float.high_float_tasks,
        m.negative_float.negative_float_tasks,
        m.high_duration.high_duration_tasks
    );
    let _ = writeln!(
        output,
        "- {} activities start after they finish",
        m.invalid_dates.invalid_dates
    );
    let _ = writeln!(
        output,
        "- {:.1}% of activities carry resource assignments",
        m.resources.resource_assignment_rate
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");

    if report.recommendations.is_empty() {
        let _ = writeln!(output, "No remediation required.");
    } else {
        for rec in report.recommendations.iter() {
            let _ = writeln!(
                output,
                "- [{}] {:?}: {}. {}",
                rec.priority.as_str(),
                rec.category,
                rec.message,
                rec.action
            );
        }
    }

    output
}
