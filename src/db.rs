use anyhow::Context;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::dcma::DcmaReport;
use crate::models::AnalysisRun;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn save_run(pool: &PgPool, source: &str, report: &DcmaReport) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let total_activities = i32::try_from(report.summary.total_activities)
        .context("activity count does not fit the runs table")?;
    let critical_issues = i32::try_from(report.summary.critical_issues)
        .context("critical issue count does not fit the runs table")?;

    sqlx::query(
        r#"
        INSERT INTO dcma.analysis_runs
        (id, source, overall_score, total_activities, critical_issues,
         metrics, recommendations, analyzed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(source)
    .bind(report.overall_score)
    .bind(total_activities)
    .bind(critical_issues)
    .bind(Json(&report.metrics))
    .bind(Json(&report.recommendations))
    .bind(report.summary.analyzed_at)
    .execute(pool)
    .await?;

    tracing::info!(%id, source, "saved analysis run");
    Ok(id)
}

pub async fn fetch_runs(
    pool: &PgPool,
    source: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<AnalysisRun>> {
    let mut query = String::from(
        "SELECT id, source, overall_score, total_activities, critical_issues, analyzed_at \
         FROM dcma.analysis_runs",
    );

    if source.is_some() {
        query.push_str(" WHERE source = $2");
    }
    query.push_str(" ORDER BY analyzed_at DESC LIMIT $1");

    let mut rows = sqlx::query(&query).bind(limit.max(1));

    if let Some(value) = source {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut runs = Vec::new();

    for row in records {
        runs.push(AnalysisRun {
            id: row.get("id"),
            source: row.get("source"),
            overall_score: row.get("overall_score"),
            total_activities: row.get("total_activities"),
            critical_issues: row.get("critical_issues"),
            analyzed_at: row.get("analyzed_at"),
        });
    }

    tracing::debug!(count = runs.len(), "fetched analysis runs");
    Ok(runs)
}
