//! Loading the schedule model from exported P6 data.
//!
//! XER decoding lives elsewhere; this module accepts either a JSON dump of the
//! parsed model or CSV exports of the `TASK`, `TASKPRED` and `TASKRSRC` tables.

use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::ScheduleError;
use crate::models::{
    Activity, ConstraintType, LinkType, Project, Relationship, Schedule, TaskStatus, TaskType,
};

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub fn load_json(path: &Path) -> Result<Schedule, ScheduleError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ScheduleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let schedule: Schedule = serde_json::from_str(&raw)?;
    tracing::info!(
        path = %path.display(),
        projects = schedule.projects.len(),
        activities = schedule.activity_count(),
        "loaded schedule model"
    );
    Ok(schedule)
}

#[derive(Debug, Deserialize)]
struct TaskRow {
    task_id: String,
    proj_id: String,
    #[serde(default)]
    task_code: Option<String>,
    task_name: String,
    task_type: TaskType,
    status_code: TaskStatus,
    #[serde(default)]
    cstr_type: Option<ConstraintType>,
    #[serde(default)]
    target_drtn_days: Option<f64>,
    #[serde(default)]
    total_float_days: Option<f64>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    phys_complete_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PredRow {
    task_id: String,
    pred_task_id: String,
    pred_type: LinkType,
    #[serde(default)]
    lag_days: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AssignmentRow {
    task_id: String,
    rsrc_id: String,
}

/// Builds a schedule from CSV table exports.
///
/// Each `TASKPRED` row is recorded on both ends: as a predecessor of `task_id`
/// and as a successor of `pred_task_id`. Projects keep the order in which they
/// first appear in the task table.
pub fn load_csv(
    tasks: &Path,
    relationships: &Path,
    assignments: Option<&Path>,
) -> Result<Schedule, ScheduleError> {
    let mut schedule = Schedule::default();
    let mut project_index: HashMap<String, usize> = HashMap::new();
    let mut task_index: HashMap<String, (usize, usize)> = HashMap::new();

    let mut reader = csv::Reader::from_path(tasks)?;
    for result in reader.deserialize::<TaskRow>() {
        let row = result?;
        let start = parse_optional_date(&row.task_id, row.start_date.as_deref())?;
        let finish = parse_optional_date(&row.task_id, row.end_date.as_deref())?;

        let project_slot = *project_index.entry(row.proj_id.clone()).or_insert_with(|| {
            schedule.projects.push(Project {
                id: row.proj_id.clone(),
                name: row.proj_id.clone(),
                full_name: None,
                activities: Vec::new(),
            });
            schedule.projects.len() - 1
        });

        let activities = &mut schedule.projects[project_slot].activities;
        task_index.insert(row.task_id.clone(), (project_slot, activities.len()));
        activities.push(Activity {
            id: row.task_id,
            name: row.task_name,
            code: row.task_code,
            task_type: row.task_type,
            status: row.status_code,
            constraint_type: row.cstr_type,
            duration: row.target_drtn_days,
            total_float: row.total_float_days,
            start,
            finish,
            percent_complete: row.phys_complete_pct,
            predecessors: Vec::new(),
            successors: Vec::new(),
            resources: Vec::new(),
        });
    }

    let mut reader = csv::Reader::from_path(relationships)?;
    let mut links = 0usize;
    for result in reader.deserialize::<PredRow>() {
        let row = result?;
        let (succ_project, succ_slot) = lookup(&task_index, &row.task_id)?;
        let (pred_project, pred_slot) = lookup(&task_index, &row.pred_task_id)?;
        let lag = row.lag_days.unwrap_or(0.0);

        schedule.projects[succ_project].activities[succ_slot]
            .predecessors
            .push(Relationship {
                activity_id: row.pred_task_id.clone(),
                link_type: row.pred_type,
                lag,
            });
        schedule.projects[pred_project].activities[pred_slot]
            .successors
            .push(Relationship {
                activity_id: row.task_id,
                link_type: row.pred_type,
                lag,
            });
        links += 1;
    }

    if let Some(path) = assignments {
        let mut reader = csv::Reader::from_path(path)?;
        for result in reader.deserialize::<AssignmentRow>() {
            let row = result?;
            let (project, slot) = lookup(&task_index, &row.task_id)?;
            schedule.projects[project].activities[slot]
                .resources
                .push(row.rsrc_id);
        }
    }

    tracing::info!(
        projects = schedule.projects.len(),
        activities = task_index.len(),
        relationships = links,
        "loaded schedule tables"
    );
    Ok(schedule)
}

fn lookup(index: &HashMap<String, (usize, usize)>, task_id: &str) -> Result<(usize, usize), ScheduleError> {
    index
        .get(task_id)
        .copied()
        .ok_or_else(|| ScheduleError::UnknownTask(task_id.to_string()))
}

fn parse_optional_date(
    task_id: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDateTime>, ScheduleError> {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(None),
    };

    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(parsed));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Some)
        .ok_or_else(|| ScheduleError::InvalidDate {
            task_id: task_id.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TASKS: &str = "\
task_id,proj_id,task_code,task_name,task_type,status_code,cstr_type,target_drtn_days,total_float_days,start_date,end_date,phys_complete_pct
T1,P1,A1000,Mobilize,TT_Mile,TK_Complete,,0,,2026-01-05 08:00,2026-01-05 08:00,100
T2,P1,A1010,Excavate,TT_Task,TK_Active,CS_ASAP,15,4,2026-01-06,2026-01-26,40
T3,P2,B1000,Survey,TT_Task,TK_NotStart,CS_MSO,3,-2,2026-02-01T08:00:00,,
";

    const PREDS: &str = "\
task_id,pred_task_id,pred_type,lag_days
T2,T1,PR_FS,0
T3,T2,PR_SS,-1.5
";

    const ASSIGNMENTS: &str = "\
task_id,rsrc_id
T2,R-EXC
T2,R-CREW
";

    fn write_fixture(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_tables_and_links_both_ends() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = write_fixture(dir.path(), "TASK.csv", TASKS);
        let preds = write_fixture(dir.path(), "TASKPRED.csv", PREDS);
        let rsrc = write_fixture(dir.path(), "TASKRSRC.csv", ASSIGNMENTS);

        let schedule = load_csv(&tasks, &preds, Some(&rsrc)).unwrap();
        assert_eq!(schedule.projects.len(), 2);
        assert_eq!(schedule.activity_count(), 3);

        let p1 = &schedule.projects[0];
        assert_eq!(p1.id, "P1");
        let mobilize = &p1.activities[0];
        assert!(mobilize.task_type.is_milestone());
        assert_eq!(mobilize.constraint_type, None);
        assert_eq!(mobilize.total_float, None);
        assert_eq!(mobilize.successors.len(), 1);
        assert_eq!(mobilize.successors[0].activity_id, "T2");

        let excavate = &p1.activities[1];
        assert_eq!(excavate.predecessors[0].activity_id, "T1");
        assert_eq!(excavate.successors[0].link_type, LinkType::StartStart);
        assert_eq!(excavate.resources, vec!["R-EXC", "R-CREW"]);

        let survey = &schedule.projects[1].activities[0];
        assert_eq!(survey.predecessors[0].lag, -1.5);
        assert_eq!(survey.total_float, Some(-2.0));
        assert!(survey.start.is_some());
        assert!(survey.finish.is_none());
    }

    #[test]
    fn unknown_predecessor_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = write_fixture(dir.path(), "TASK.csv", TASKS);
        let preds = write_fixture(
            dir.path(),
            "TASKPRED.csv",
            "task_id,pred_task_id,pred_type,lag_days\nT2,T99,PR_FS,0\n",
        );

        let err = load_csv(&tasks, &preds, None).unwrap_err();
        assert!(matches!(err, ScheduleError::UnknownTask(ref id) if id == "T99"));
    }

    #[test]
    fn rejects_unparseable_dates() {
        let err = parse_optional_date("T1", Some("next tuesday")).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidDate { .. }));
        assert_eq!(parse_optional_date("T1", Some("  ")).unwrap(), None);
    }

    #[test]
    fn loads_json_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "schedule.json",
            r#"{"projects": [{"id": "P1", "name": "Depot", "activities": [
                {"id": "T1", "name": "Start", "taskType": "TT_Mile", "status": "TK_Complete"}
            ]}]}"#,
        );

        let schedule = load_json(&path).unwrap();
        assert_eq!(schedule.activity_count(), 1);
        assert_eq!(schedule.projects[0].full_name, None);
    }

    #[test]
    fn missing_json_file_reports_path() {
        let err = load_json(Path::new("/nonexistent/schedule.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/schedule.json"));
    }
}
