//! DCMA 14-Point schedule assessment.
//!
//! Ten independent checks over the flattened activity list. Each check yields
//! a score in `[0, 100]` plus the counts behind it; the overall score is the
//! unweighted mean of the ten.
//!
//! | Check | Penalized when | Weight | Empty fallback |
//! |-------|----------------|--------|----------------|
//! | Missing logic | no predecessor / no successor (milestones excluded) | 100 | 0 |
//! | Leads | predecessor lag < 0 | 100 | 100 |
//! | Lags | predecessor lag > 20d | 100 | 100 |
//! | Relationship types | link is not FS | 50 | 100 |
//! | Hard constraints | constraint other than ASAP | 100 | 0 |
//! | High float | total float > 44d | 100 | 0 |
//! | Negative float | total float < 0 | 200 | - |
//! | High duration | duration > 44d | 100 | 0 |
//! | Invalid dates | start after finish | 200 | - |
//! | Resources | rewarded for >= 1 assignment | - | 0 |

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AnalysisError;
use crate::models::{Activity, LinkType, Schedule};
use crate::recommendations::{self, Priority, Recommendation};

pub const HIGH_FLOAT_THRESHOLD_DAYS: u32 = 44;
pub const HIGH_DURATION_THRESHOLD_DAYS: u32 = 44;
pub const EXCESSIVE_LAG_THRESHOLD_DAYS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicMetric {
    pub score: f64,
    pub tasks_without_predecessors: usize,
    pub tasks_without_successors: usize,
    pub total_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadsMetric {
    pub score: f64,
    pub leads_found: usize,
    pub total_relationships: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LagsMetric {
    pub score: f64,
    pub excessive_lags: usize,
    pub threshold: u32,
    pub total_relationships: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipTypesMetric {
    pub score: f64,
    #[serde(rename = "nonFSRelationships")]
    pub non_fs_relationships: usize,
    pub total_relationships: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardConstraintsMetric {
    pub score: f64,
    pub constrained_tasks: usize,
    pub total_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighFloatMetric {
    pub score: f64,
    pub high_float_tasks: usize,
    pub threshold: u32,
    pub total_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeFloatMetric {
    pub score: f64,
    pub negative_float_tasks: usize,
    pub total_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighDurationMetric {
    pub score: f64,
    pub high_duration_tasks: usize,
    pub threshold: u32,
    pub total_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidDatesMetric {
    pub score: f64,
    pub invalid_dates: usize,
    pub total_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesMetric {
    pub score: f64,
    pub tasks_with_resources: usize,
    pub total_tasks: usize,
    pub resource_assignment_rate: f64,
}

/// The ten metric results, keyed by their wire names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub logic: LogicMetric,
    pub leads: LeadsMetric,
    pub lags: LagsMetric,
    pub relationship_types: RelationshipTypesMetric,
    pub hard_constraints: HardConstraintsMetric,
    pub high_float: HighFloatMetric,
    pub negative_float: NegativeFloatMetric,
    pub high_duration: HighDurationMetric,
    pub invalid_dates: InvalidDatesMetric,
    pub resources: ResourcesMetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricName {
    Logic,
    Leads,
    Lags,
    RelationshipTypes,
    HardConstraints,
    HighFloat,
    NegativeFloat,
    HighDuration,
    InvalidDates,
    Resources,
}

impl MetricName {
    pub const ALL: [MetricName; 10] = [
        MetricName::Logic,
        MetricName::Leads,
        MetricName::Lags,
        MetricName::RelationshipTypes,
        MetricName::HardConstraints,
        MetricName::HighFloat,
        MetricName::NegativeFloat,
        MetricName::HighDuration,
        MetricName::InvalidDates,
        MetricName::Resources,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetricName::Logic => "Missing Logic",
            MetricName::Leads => "Leads",
            MetricName::Lags => "Lags",
            MetricName::RelationshipTypes => "Relationship Types",
            MetricName::HardConstraints => "Hard Constraints",
            MetricName::HighFloat => "High Float",
            MetricName::NegativeFloat => "Negative Float",
            MetricName::HighDuration => "High Duration",
            MetricName::InvalidDates => "Invalid Dates",
            MetricName::Resources => "Resources",
        }
    }
}

impl Metrics {
    pub fn score(&self, name: MetricName) -> f64 {
        match name {
            MetricName::Logic => self.logic.score,
            MetricName::Leads => self.leads.score,
            MetricName::Lags => self.lags.score,
            MetricName::RelationshipTypes => self.relationship_types.score,
            MetricName::HardConstraints => self.hard_constraints.score,
            MetricName::HighFloat => self.high_float.score,
            MetricName::NegativeFloat => self.negative_float.score,
            MetricName::HighDuration => self.high_duration.score,
            MetricName::InvalidDates => self.invalid_dates.score,
            MetricName::Resources => self.resources.score,
        }
    }

    pub fn overall_score(&self) -> f64 {
        let total: f64 = MetricName::ALL.iter().map(|name| self.score(*name)).sum();
        round2(total / MetricName::ALL.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_activities: usize,
    pub critical_issues: usize,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DcmaReport {
    pub metrics: Metrics,
    pub overall_score: f64,
    pub recommendations: Vec<Recommendation>,
    pub summary: AnalysisSummary,
}

/// Wire shape of an analysis: either the full report or `{error, message}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Complete(Box<DcmaReport>),
    Failed { error: bool, message: String },
}

impl From<Result<DcmaReport, AnalysisError>> for AnalysisOutcome {
    fn from(result: Result<DcmaReport, AnalysisError>) -> Self {
        match result {
            Ok(report) => AnalysisOutcome::Complete(Box::new(report)),
            Err(err) => AnalysisOutcome::Failed {
                error: true,
                message: err.to_string(),
            },
        }
    }
}

/// Read-only view over every activity of every project, in project order.
pub struct DcmaAnalyzer<'a> {
    activities: Vec<&'a Activity>,
}

impl<'a> DcmaAnalyzer<'a> {
    pub fn new(schedule: &'a Schedule) -> Self {
        let activities: Vec<&'a Activity> = schedule
            .projects
            .iter()
            .flat_map(|project| project.activities.iter())
            .collect();
        Self { activities }
    }

    pub fn analyze(&self) -> Result<DcmaReport, AnalysisError> {
        if self.activities.is_empty() {
            tracing::warn!("schedule contains no activities");
            return Err(AnalysisError::NoActivities);
        }

        let metrics = Metrics {
            logic: self.missing_logic(),
            leads: self.leads(),
            lags: self.lags(),
            relationship_types: self.relationship_types(),
            hard_constraints: self.hard_constraints(),
            high_float: self.high_float(),
            negative_float: self.negative_float(),
            high_duration: self.high_duration(),
            invalid_dates: self.invalid_dates(),
            resources: self.resources(),
        };
        let overall_score = metrics.overall_score();
        let recommendations = recommendations::generate(&metrics);
        let critical_issues = recommendations
            .iter()
            .filter(|r| r.priority == Priority::High)
            .count();

        tracing::debug!(?metrics, "computed dcma metrics");
        tracing::info!(
            activities = self.activities.len(),
            overall_score,
            critical_issues,
            "dcma analysis complete"
        );

        Ok(DcmaReport {
            metrics,
            overall_score,
            recommendations,
            summary: AnalysisSummary {
                total_activities: self.activities.len(),
                critical_issues,
                analyzed_at: Utc::now(),
            },
        })
    }

    fn missing_logic(&self) -> LogicMetric {
        let regular: Vec<&Activity> = self
            .activities
            .iter()
            .copied()
            .filter(|a| !a.task_type.is_milestone())
            .collect();
        let without_pred = regular.iter().filter(|a| a.predecessors.is_empty()).count();
        let without_succ = regular.iter().filter(|a| a.successors.is_empty()).count();
        let total = regular.len();

        LogicMetric {
            score: penalized_score(without_pred + without_succ, total, 100.0, 0.0),
            tasks_without_predecessors: without_pred,
            tasks_without_successors: without_succ,
            total_tasks: total,
        }
    }

    fn leads(&self) -> LeadsMetric {
        let total = self.relationship_count();
        let leads = self.count_relationships(|lag, _| lag < 0.0);

        LeadsMetric {
            score: penalized_score(leads, total, 100.0, 100.0),
            leads_found: leads,
            total_relationships: total,
        }
    }

    fn lags(&self) -> LagsMetric {
        let threshold = f64::from(EXCESSIVE_LAG_THRESHOLD_DAYS);
        let total = self.relationship_count();
        let excessive = self.count_relationships(|lag, _| lag > threshold);

        LagsMetric {
            score: penalized_score(excessive, total, 100.0, 100.0),
            excessive_lags: excessive,
            threshold: EXCESSIVE_LAG_THRESHOLD_DAYS,
            total_relationships: total,
        }
    }

    fn relationship_types(&self) -> RelationshipTypesMetric {
        let total = self.relationship_count();
        let non_fs = self.count_relationships(|_, link| link != LinkType::FinishStart);

        RelationshipTypesMetric {
            score: penalized_score(non_fs, total, 50.0, 100.0),
            non_fs_relationships: non_fs,
            total_relationships: total,
        }
    }

    fn hard_constraints(&self) -> HardConstraintsMetric {
        let constrained = self.count_activities(|a| a.constraint_type.is_some_and(|c| c.is_hard()));
        let total = self.activities.len();

        HardConstraintsMetric {
            score: penalized_score(constrained, total, 100.0, 0.0),
            constrained_tasks: constrained,
            total_tasks: total,
        }
    }

    fn high_float(&self) -> HighFloatMetric {
        let threshold = f64::from(HIGH_FLOAT_THRESHOLD_DAYS);
        let high = self.count_activities(|a| a.total_float.is_some_and(|tf| tf > threshold));
        let total = self.activities.len();

        HighFloatMetric {
            score: penalized_score(high, total, 100.0, 0.0),
            high_float_tasks: high,
            threshold: HIGH_FLOAT_THRESHOLD_DAYS,
            total_tasks: total,
        }
    }

    fn negative_float(&self) -> NegativeFloatMetric {
        let negative = self.count_activities(|a| a.total_float.is_some_and(|tf| tf < 0.0));
        let total = self.activities.len();

        NegativeFloatMetric {
            score: zero_tolerance_score(negative, total),
            negative_float_tasks: negative,
            total_tasks: total,
        }
    }

    fn high_duration(&self) -> HighDurationMetric {
        let threshold = f64::from(HIGH_DURATION_THRESHOLD_DAYS);
        let long = self.count_activities(|a| a.duration.is_some_and(|d| d > threshold));
        let total = self.activities.len();

        HighDurationMetric {
            score: penalized_score(long, total, 100.0, 0.0),
            high_duration_tasks: long,
            threshold: HIGH_DURATION_THRESHOLD_DAYS,
            total_tasks: total,
        }
    }

    fn invalid_dates(&self) -> InvalidDatesMetric {
        let invalid = self.count_activities(|a| match (a.start, a.finish) {
            (Some(start), Some(finish)) => start > finish,
            _ => false,
        });
        let total = self.activities.len();

        InvalidDatesMetric {
            score: zero_tolerance_score(invalid, total),
            invalid_dates: invalid,
            total_tasks: total,
        }
    }

    fn resources(&self) -> ResourcesMetric {
        let with_resources = self.count_activities(|a| !a.resources.is_empty());
        let total = self.activities.len();
        let rate = if total > 0 {
            round2(with_resources as f64 / total as f64 * 100.0)
        } else {
            0.0
        };

        ResourcesMetric {
            score: rate,
            tasks_with_resources: with_resources,
            total_tasks: total,
            resource_assignment_rate: rate,
        }
    }

    fn count_activities(&self, predicate: impl Fn(&Activity) -> bool) -> usize {
        self.activities.iter().filter(|a| predicate(a)).count()
    }

    fn relationship_count(&self) -> usize {
        self.activities.iter().map(|a| a.predecessors.len()).sum()
    }

    fn count_relationships(&self, predicate: impl Fn(f64, LinkType) -> bool) -> usize {
        self.activities
            .iter()
            .flat_map(|a| a.predecessors.iter())
            .filter(|rel| predicate(rel.lag, rel.link_type))
            .count()
    }
}

/// `max(0, 100 - count/total*weight)`, or `fallback` when there is nothing to measure.
fn penalized_score(count: usize, total: usize, weight: f64, fallback: f64) -> f64 {
    if total == 0 {
        return fallback;
    }
    round2((100.0 - count as f64 / total as f64 * weight).max(0.0))
}

/// Full marks only when nothing is found; otherwise a double-weight penalty.
fn zero_tolerance_score(count: usize, total: usize) -> f64 {
    if count == 0 {
        return 100.0;
    }
    penalized_score(count, total, 200.0, 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
