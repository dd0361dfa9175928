use serde::Serialize;

use crate::dcma::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Logic,
    Schedule,
    Float,
    Duration,
    Constraints,
    Resources,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub category: Category,
    pub priority: Priority,
    pub message: String,
    pub action: String,
}

impl Recommendation {
    fn new(category: Category, priority: Priority, message: String, action: &str) -> Self {
        Self {
            category,
            priority,
            message,
            action: action.to_string(),
        }
    }
}

pub const LOGIC_SCORE_FLOOR: f64 = 80.0;
pub const HIGH_FLOAT_SCORE_FLOOR: f64 = 70.0;
pub const HIGH_DURATION_SCORE_FLOOR: f64 = 70.0;
pub const HARD_CONSTRAINT_SCORE_FLOOR: f64 = 85.0;
pub const RESOURCE_SCORE_FLOOR: f64 = 50.0;

/// Remediation entries in fixed check order. Leads, lags, relationship types
/// and invalid dates are scored but never produce a recommendation.
pub fn generate(metrics: &Metrics) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    let logic = &metrics.logic;
    if logic.score < LOGIC_SCORE_FLOOR {
        recommendations.push(Recommendation::new(
            Category::Logic,
            Priority::High,
            format!(
                "{} activities missing logic relationships",
                logic.tasks_without_predecessors + logic.tasks_without_successors
            ),
            "Add predecessor and successor relationships to all activities",
        ));
    }

    let negative = &metrics.negative_float;
    if negative.negative_float_tasks > 0 {
        recommendations.push(Recommendation::new(
            Category::Schedule,
            Priority::High,
            format!("{} activities have negative float", negative.negative_float_tasks),
            "Review and adjust schedule to resolve negative float",
        ));
    }

    let high_float = &metrics.high_float;
    if high_float.score < HIGH_FLOAT_SCORE_FLOOR {
        recommendations.push(Recommendation::new(
            Category::Float,
            Priority::Medium,
            format!(
                "{} activities have excessive float (>{} days)",
                high_float.high_float_tasks, high_float.threshold
            ),
            "Review task dependencies and network logic",
        ));
    }

    let duration = &metrics.high_duration;
    if duration.score < HIGH_DURATION_SCORE_FLOOR {
        recommendations.push(Recommendation::new(
            Category::Duration,
            Priority::Medium,
            format!(
                "{} activities exceed {} days",
                duration.high_duration_tasks, duration.threshold
            ),
            "Break down long-duration activities into smaller tasks",
        ));
    }

    let constraints = &metrics.hard_constraints;
    if constraints.score < HARD_CONSTRAINT_SCORE_FLOOR {
        recommendations.push(Recommendation::new(
            Category::Constraints,
            Priority::Medium,
            format!("{} activities have hard constraints", constraints.constrained_tasks),
            "Review and minimize use of hard constraints",
        ));
    }

    let resources = &metrics.resources;
    if resources.score < RESOURCE_SCORE_FLOOR {
        recommendations.push(Recommendation::new(
            Category::Resources,
            Priority::Low,
            format!(
                "Only {:.1}% of activities have resource assignments",
                resources.resource_assignment_rate
            ),
            "Improve resource loading and assignment",
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcma::tests::{activity, link, schedule_of};
    use crate::dcma::DcmaAnalyzer;
    use crate::models::{Activity, LinkType};

    fn healthy(id: &str) -> Activity {
        let mut a = activity(id);
        a.predecessors.push(link("prev", LinkType::FinishStart, 0.0));
        a.successors.push(link("next", LinkType::FinishStart, 0.0));
        a.resources.push("R1".to_string());
        a.total_float = Some(5.0);
        a.duration = Some(10.0);
        a
    }

    fn metrics_for(activities: Vec<Activity>) -> Metrics {
        DcmaAnalyzer::new(&schedule_of(activities))
            .analyze()
            .unwrap()
            .metrics
    }

    #[test]
    fn healthy_schedule_needs_no_remediation() {
        let metrics = metrics_for((0..5).map(|i| healthy(&format!("A{i}"))).collect());
        assert!(generate(&metrics).is_empty());
    }

    #[test]
    fn logic_and_negative_float_are_high_priority_in_order() {
        let mut metrics = metrics_for((0..5).map(|i| healthy(&format!("A{i}"))).collect());
        metrics.logic.score = 60.0;
        metrics.logic.tasks_without_predecessors = 1;
        metrics.logic.tasks_without_successors = 1;
        metrics.negative_float.negative_float_tasks = 3;

        let recs = generate(&metrics);
        let high: Vec<&Recommendation> =
            recs.iter().filter(|r| r.priority == Priority::High).collect();
        assert_eq!(high.len(), 2);
        assert_eq!(high[0].category, Category::Logic);
        assert_eq!(high[0].message, "2 activities missing logic relationships");
        assert_eq!(high[1].category, Category::Schedule);
        assert_eq!(high[1].message, "3 activities have negative float");
    }

    #[test]
    fn thresholds_are_strict() {
        let mut metrics = metrics_for(vec![healthy("A1")]);
        metrics.logic.score = 80.0;
        metrics.high_float.score = 70.0;
        metrics.high_duration.score = 70.0;
        metrics.hard_constraints.score = 85.0;
        metrics.resources.score = 50.0;
        assert!(generate(&metrics).is_empty());
    }

    #[test]
    fn medium_and_low_rules_follow_fixed_order() {
        let mut bad = activity("A1");
        bad.total_float = Some(60.0);
        bad.duration = Some(60.0);
        bad.constraint_type = Some(crate::models::ConstraintType::MandatoryFinish);
        bad.predecessors.push(link("prev", LinkType::FinishStart, 0.0));
        bad.successors.push(link("next", LinkType::FinishStart, 0.0));

        let recs = generate(&metrics_for(vec![bad, healthy("A2")]));
        let categories: Vec<Category> = recs.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![Category::Float, Category::Duration, Category::Constraints]
        );
        assert_eq!(recs[0].message, "1 activities have excessive float (>44 days)");
        assert_eq!(recs[1].message, "1 activities exceed 44 days");
        assert!(recs.iter().all(|r| r.priority == Priority::Medium));
    }

    #[test]
    fn low_resource_loading_is_low_priority() {
        let mut loaded = healthy("A1");
        loaded.resources = vec!["R1".to_string()];
        let mut bare: Vec<Activity> = (2..5).map(|i| healthy(&format!("A{i}"))).collect();
        for a in bare.iter_mut() {
            a.resources.clear();
        }
        bare.push(loaded);

        let recs = generate(&metrics_for(bare));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::Low);
        assert_eq!(recs[0].message, "Only 25.0% of activities have resource assignments");
        assert_eq!(recs[0].action, "Improve resource loading and assignment");
    }

    #[test]
    fn relationship_and_date_findings_are_not_recommended() {
        let mut a = healthy("A1");
        a.predecessors = vec![
            link("X", LinkType::StartFinish, -5.0),
            link("Y", LinkType::FinishFinish, 40.0),
        ];
        a.start = chrono::NaiveDate::from_ymd_opt(2026, 5, 10).and_then(|d| d.and_hms_opt(8, 0, 0));
        a.finish = chrono::NaiveDate::from_ymd_opt(2026, 5, 1).and_then(|d| d.and_hms_opt(8, 0, 0));

        let metrics = metrics_for(vec![a]);
        assert!(metrics.leads.score < 100.0);
        assert!(metrics.invalid_dates.score < 100.0);
        assert!(generate(&metrics).is_empty());
    }

    #[test]
    fn priority_serializes_lowercase() {
        let value = serde_json::to_value(Priority::High).unwrap();
        assert_eq!(value, "high");
        assert_eq!(Priority::Medium.as_str(), "medium");
    }
}
