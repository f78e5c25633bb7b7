use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod compliance;
mod db;
mod error;
mod matching;
mod models;
mod report;
mod rounds;
mod schedule;
mod site_time;

use error::EngineError;
use models::RecomputeOutcome;

#[derive(Parser)]
#[command(name = "patrol-compliance")]
#[command(about = "Patrol compliance engine for factory security rounds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import scan events from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Per-guard compliance statistics for one date
    GuardCompliance {
        #[arg(long)]
        guard: String,
        #[arg(long)]
        date: String,
        #[arg(long, default_value_t = schedule::DEFAULT_GRACE_SECONDS)]
        grace_seconds: i64,
        #[arg(long)]
        json: bool,
    },
    /// Factory round table for one date, one row per checkpoint and round
    RoundReport {
        #[arg(long)]
        factory: String,
        #[arg(long)]
        date: String,
        #[arg(long, default_value_t = schedule::DEFAULT_GRACE_SECONDS)]
        grace_seconds: i64,
        #[arg(long)]
        generated_by: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Patrol log grouped into rounds inferred from scan gaps
    PatrolLog {
        #[arg(long)]
        factory: String,
        #[arg(long)]
        date: String,
        #[arg(long, default_value_t = rounds::DEFAULT_ROUND_GAP_MINUTES)]
        gap_minutes: i64,
        #[arg(long)]
        generated_by: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Recompute and persist scan statuses for one date
    Recompute {
        #[arg(long)]
        date: String,
        #[arg(long, default_value_t = schedule::DEFAULT_GRACE_SECONDS)]
        grace_seconds: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} scan events from {}.", csv.display());
        }
        Commands::GuardCompliance {
            guard,
            date,
            grace_seconds,
            json,
        } => {
            let date = site_time::parse_report_date(&date)?;
            let (from, to) = site_time::day_bounds(date);
            let scans = db::fetch_scans(
                &pool,
                db::ScanFilter {
                    factory_code: None,
                    guard_name: Some(&guard),
                    from,
                    to,
                },
            )
            .await?;

            let report =
                compliance::guard_compliance(&guard, date, &scans, Duration::seconds(grace_seconds))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report::build_guard_report(&report));
            }
        }
        Commands::RoundReport {
            factory,
            date,
            grace_seconds,
            generated_by,
            out,
            json,
        } => {
            let report_date = site_time::parse_report_date(&date)?;
            let factory = db::fetch_factory(&pool, &factory)
                .await?
                .ok_or_else(|| EngineError::FactoryNotFound(factory.clone()))?;
            let checkpoints = db::fetch_checkpoints(&pool, &factory.factory_code).await?;
            if checkpoints.is_empty() {
                return Err(EngineError::FactoryNotFound(factory.factory_code).into());
            }

            let expected =
                schedule::expected_checkpoints(report_date, Duration::seconds(grace_seconds))?;
            // The patrol cycle starts the previous evening, so fetch the
            // whole expected window rather than the calendar day.
            let (from, to) = match (expected.first(), expected.last()) {
                (Some(first), Some(last)) => {
                    (first.window_start, last.window_end + Duration::seconds(1))
                }
                _ => site_time::day_bounds(report_date),
            };
            let scans = db::fetch_scans(
                &pool,
                db::ScanFilter {
                    factory_code: Some(&factory.factory_code),
                    guard_name: None,
                    from,
                    to,
                },
            )
            .await?;

            let rows = compliance::round_report(&checkpoints, &expected, &scans);

            let generated_at = Utc::now().with_timezone(&site_time::site_offset());
            let generated_by = generated_by.as_deref().unwrap_or("system");
            db::record_report_audit(
                &pool,
                "PATROL_ROUND",
                &factory.factory_code,
                report_date,
                generated_by,
                generated_at,
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                let rendered = report::build_round_report(&factory, report_date, &rows);
                let path = out.unwrap_or_else(|| {
                    PathBuf::from(report::build_report_filename(
                        "PATROL_ROUND",
                        &factory.factory_code,
                        report_date,
                        Some(generated_by),
                        generated_at,
                    ))
                });
                std::fs::write(&path, rendered)?;
                println!("Report written to {}.", path.display());
            }
        }
        Commands::PatrolLog {
            factory,
            date,
            gap_minutes,
            generated_by,
            out,
        } => {
            let report_date = site_time::parse_report_date(&date)?;
            let factory = db::fetch_factory(&pool, &factory)
                .await?
                .ok_or_else(|| EngineError::FactoryNotFound(factory.clone()))?;

            let (from, to) = site_time::day_bounds(report_date);
            let scans = db::fetch_scans(
                &pool,
                db::ScanFilter {
                    factory_code: Some(&factory.factory_code),
                    guard_name: None,
                    from,
                    to,
                },
            )
            .await?;

            let grouped = rounds::split_into_rounds(&scans, Duration::minutes(gap_minutes));
            let rendered = report::build_patrol_log(&factory, report_date, &grouped);

            let generated_at = Utc::now().with_timezone(&site_time::site_offset());
            let generated_by = generated_by.as_deref().unwrap_or("system");
            db::record_report_audit(
                &pool,
                "PATROL_LOG",
                &factory.factory_code,
                report_date,
                generated_by,
                generated_at,
            )
            .await?;

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Patrol log written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Recompute {
            date,
            grace_seconds,
        } => {
            let report_date = site_time::parse_report_date(&date)?;
            let grace = Duration::seconds(grace_seconds);
            let expected = schedule::expected_checkpoints(report_date, grace)?;

            let (from, to) = site_time::day_bounds(report_date);
            let scans = db::fetch_scans(
                &pool,
                db::ScanFilter {
                    factory_code: None,
                    guard_name: None,
                    from,
                    to,
                },
            )
            .await?;

            if scans.is_empty() {
                let outcome = RecomputeOutcome {
                    total_expected: 0,
                    total_processed: 0,
                    updated_count: 0,
                    failed_count: 0,
                };
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                return Ok(());
            }

            let proposals = compliance::classify_for_date(&scans, &expected, grace);

            let mut updated_count = 0usize;
            let mut failed_count = 0usize;
            for (scan_id, status) in proposals {
                match db::update_scan_status(&pool, scan_id, status).await {
                    Ok(()) => updated_count += 1,
                    Err(err) => {
                        failed_count += 1;
                        tracing::warn!(scan_id = %scan_id, error = %err, "scan status update failed");
                    }
                }
            }

            let outcome = RecomputeOutcome {
                total_expected: expected.len(),
                total_processed: scans.len(),
                updated_count,
                failed_count,
            };
            tracing::info!(
                processed = outcome.total_processed,
                updated = outcome.updated_count,
                failed = outcome.failed_count,
                "status recomputation finished"
            );
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
