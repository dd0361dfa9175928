use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

mod db;
mod dcma;
mod error;
mod models;
mod recommendations;
mod report;
mod schedule;

use dcma::{AnalysisOutcome, DcmaAnalyzer};
use models::Schedule;

#[derive(Parser)]
#[command(name = "p6-dcma")]
#[command(about = "DCMA 14-Point schedule quality assessment for Primavera P6 exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the schedule model comes from: a JSON dump or CSV table exports.
#[derive(Args)]
#[command(group(
    ArgGroup::new("input")
        .args(["schedule", "tasks"])
        .required(true)
        .multiple(false)
))]
struct ScheduleInput {
    /// JSON schedule model
    #[arg(long)]
    schedule: Option<PathBuf>,
    /// TASK table export
    #[arg(long, requires = "relationships")]
    tasks: Option<PathBuf>,
    /// TASKPRED table export
    #[arg(long, requires = "tasks")]
    relationships: Option<PathBuf>,
    /// TASKRSRC table export
    #[arg(long, requires = "tasks")]
    assignments: Option<PathBuf>,
}

impl ScheduleInput {
    fn load(&self) -> anyhow::Result<Schedule> {
        match (&self.schedule, &self.tasks, &self.relationships) {
            (Some(path), _, _) => schedule::load_json(path)
                .with_context(|| format!("failed to load schedule from {}", path.display())),
            (None, Some(tasks), Some(relationships)) => {
                schedule::load_csv(tasks, relationships, self.assignments.as_deref())
                    .with_context(|| format!("failed to load tables from {}", tasks.display()))
            }
            _ => anyhow::bail!("either --schedule or --tasks with --relationships is required"),
        }
    }

    fn label(&self) -> String {
        self.schedule
            .as_ref()
            .or(self.tasks.as_ref())
            .map(|path| path.display().to_string())
            .unwrap_or_default()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Run the DCMA assessment and print the result as JSON
    Analyze {
        #[command(flatten)]
        input: ScheduleInput,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Store the run in Postgres (requires DATABASE_URL)
        #[arg(long)]
        save: bool,
    },
    /// Generate a markdown assessment report
    Report {
        #[command(flatten)]
        input: ScheduleInput,
        #[arg(long, default_value = "dcma-report.md")]
        out: PathBuf,
    },
    /// Summarize projects and activities as JSON
    Parse {
        #[command(flatten)]
        input: ScheduleInput,
    },
    /// Export the flat task table as CSV
    Tasks {
        #[command(flatten)]
        input: ScheduleInput,
        #[arg(long, default_value_t = 500)]
        limit: usize,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List stored analysis runs
    History {
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("p6_dcma=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Analyze { input, out, save } => {
            let schedule = input.load()?;
            let result = DcmaAnalyzer::new(&schedule).analyze();

            if save {
                if let Ok(report) = &result {
                    let pool = connect().await?;
                    let id = db::save_run(&pool, &input.label(), report).await?;
                    eprintln!("Saved run {id}.");
                }
            }

            let body = serde_json::to_string_pretty(&AnalysisOutcome::from(result))?;
            match out {
                Some(path) => {
                    std::fs::write(&path, body)?;
                    println!("Analysis written to {}.", path.display());
                }
                None => println!("{body}"),
            }
        }
        Commands::Report { input, out } => {
            let schedule = input.load()?;
            let result = DcmaAnalyzer::new(&schedule).analyze()?;
            let report = report::build_report(&input.label(), &result);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Parse { input } => {
            let schedule = input.load()?;
            let summary = report::parse_summary(&schedule);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Tasks { input, limit, out } => {
            let schedule = input.load()?;
            let rows = report::task_rows(&schedule, limit);

            let sink: Box<dyn std::io::Write> = match &out {
                Some(path) => Box::new(
                    std::fs::File::create(path)
                        .with_context(|| format!("failed to create {}", path.display()))?,
                ),
                None => Box::new(std::io::stdout()),
            };
            let mut writer = csv::Writer::from_writer(sink);
            for row in rows.iter() {
                writer.serialize(row)?;
            }
            writer.flush()?;

            if let Some(path) = out {
                println!("Exported {} tasks to {}.", rows.len(), path.display());
            }
        }
        Commands::History { source, limit } => {
            let pool = connect().await?;
            let runs = db::fetch_runs(&pool, source.as_deref(), limit).await?;

            if runs.is_empty() {
                println!("No analysis runs recorded.");
                return Ok(());
            }

            println!("Recent analysis runs:");
            for run in runs.iter() {
                println!(
                    "- {} {} score {:.2} across {} activities ({} critical) [{}]",
                    run.analyzed_at.format("%Y-%m-%d %H:%M"),
                    run.source,
                    run.overall_score,
                    run.total_activities,
                    run.critical_issues,
                    run.id
                );
            }
        }
    }

    Ok(())
}
