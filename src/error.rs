use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading a schedule export.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schedule JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV row: {0}")]
    Csv(#[from] csv::Error),

    #[error("relationship references unknown task '{0}'")]
    UnknownTask(String),

    #[error("unrecognized date '{value}' on task '{task_id}'")]
    InvalidDate { task_id: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("No activities found in XER file")]
    NoActivities,
}
