use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// P6 task kinds. Only the two milestone kinds get special treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "TT_Task")]
    Task,
    #[serde(rename = "TT_Mile")]
    StartMilestone,
    #[serde(rename = "TT_FinMile")]
    FinishMilestone,
    #[serde(rename = "TT_LOE")]
    LevelOfEffort,
    #[serde(rename = "TT_WBS")]
    WbsSummary,
    #[serde(rename = "TT_Rsrc")]
    ResourceDependent,
}

impl TaskType {
    pub fn is_milestone(self) -> bool {
        matches!(self, TaskType::StartMilestone | TaskType::FinishMilestone)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "TK_NotStart")]
    NotStarted,
    #[serde(rename = "TK_Active")]
    InProgress,
    #[serde(rename = "TK_Complete")]
    Completed,
}

impl TaskStatus {
    pub fn code(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "TK_NotStart",
            TaskStatus::InProgress => "TK_Active",
            TaskStatus::Completed => "TK_Complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintType {
    #[serde(rename = "CS_ASAP")]
    AsSoonAsPossible,
    #[serde(rename = "CS_ALAP")]
    AsLateAsPossible,
    #[serde(rename = "CS_MSO")]
    StartOn,
    #[serde(rename = "CS_MSOB")]
    StartOnOrBefore,
    #[serde(rename = "CS_MSOA")]
    StartOnOrAfter,
    #[serde(rename = "CS_MEO")]
    FinishOn,
    #[serde(rename = "CS_MEOB")]
    FinishOnOrBefore,
    #[serde(rename = "CS_MEOA")]
    FinishOnOrAfter,
    #[serde(rename = "CS_MANDSTART")]
    MandatoryStart,
    #[serde(rename = "CS_MANDFIN")]
    MandatoryFinish,
}

impl ConstraintType {
    /// ASAP is the unconstrained baseline; everything else overrides logic.
    pub fn is_hard(self) -> bool {
        self != ConstraintType::AsSoonAsPossible
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkType {
    #[serde(rename = "PR_FS")]
    FinishStart,
    #[serde(rename = "PR_SS")]
    StartStart,
    #[serde(rename = "PR_FF")]
    FinishFinish,
    #[serde(rename = "PR_SF")]
    StartFinish,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// The activity on the other end of the link.
    pub activity_id: String,
    pub link_type: LinkType,
    /// Days. Negative values are leads.
    #[serde(default)]
    pub lag: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    pub task_type: TaskType,
    pub status: TaskStatus,
    #[serde(default)]
    pub constraint_type: Option<ConstraintType>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub total_float: Option<f64>,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub finish: Option<NaiveDateTime>,
    #[serde(default)]
    pub percent_complete: Option<f64>,
    #[serde(default)]
    pub predecessors: Vec<Relationship>,
    #[serde(default)]
    pub successors: Vec<Relationship>,
    #[serde(default)]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Schedule {
    pub fn activity_count(&self) -> usize {
        self.projects.iter().map(|p| p.activities.len()).sum()
    }
}

/// A stored analysis, as listed by `history`.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub id: Uuid,
    pub source: String,
    pub overall_score: f64,
    pub total_activities: i32,
    pub critical_issues: i32,
    pub analyzed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_start_and_finish_milestones_are_milestones() {
        assert!(TaskType::StartMilestone.is_milestone());
        assert!(TaskType::FinishMilestone.is_milestone());
        assert!(!TaskType::Task.is_milestone());
        assert!(!TaskType::LevelOfEffort.is_milestone());
    }

    #[test]
    fn asap_is_not_a_hard_constraint() {
        assert!(!ConstraintType::AsSoonAsPossible.is_hard());
        assert!(ConstraintType::MandatoryFinish.is_hard());
        assert!(ConstraintType::AsLateAsPossible.is_hard());
    }

    #[test]
    fn activity_deserializes_from_p6_codes() {
        let json = r#"{
            "id": "A100",
            "name": "Pour foundations",
            "taskType": "TT_Task",
            "status": "TK_Active",
            "constraintType": "CS_MSO",
            "duration": 12.5,
            "start": "2026-03-02T08:00:00",
            "predecessors": [{"activityId": "A090", "linkType": "PR_SS", "lag": -2.0}]
        }"#;

        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.constraint_type, Some(ConstraintType::StartOn));
        assert_eq!(activity.total_float, None);
        assert_eq!(activity.finish, None);
        assert_eq!(activity.predecessors[0].link_type, LinkType::StartStart);
        assert!(activity.successors.is_empty());
    }

    #[test]
    fn unknown_codes_are_rejected() {
        let json = r#"{"id": "A1", "name": "x", "taskType": "TT_Bogus", "status": "TK_Active"}"#;
        assert!(serde_json::from_str::<Activity>(json).is_err());
    }
}
