use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{Checkpoint, ComplianceStatus, Factory, ScanEvent};
use crate::site_time::{parse_site_timestamp, site_offset};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO patrol_compliance.factories (factory_code, factory_name, factory_address)
        VALUES ($1, $2, $3)
        ON CONFLICT (factory_code) DO UPDATE
        SET factory_name = EXCLUDED.factory_name, factory_address = EXCLUDED.factory_address
        "#,
    )
    .bind("F1")
    .bind("Coimbatore Spinning Mill")
    .bind("Avinashi Road, Coimbatore 641014")
    .execute(pool)
    .await?;

    let checkpoints = vec![
        (
            Uuid::parse_str("7b0c3c7e-55f1-4d6e-9a6e-0a4f2b9b1c01")?,
            "Main Gate",
        ),
        (
            Uuid::parse_str("2f9a1d44-8c25-4a1b-bb6e-5a9c3d2e1f02")?,
            "Boiler House",
        ),
        (
            Uuid::parse_str("c4e8f6a2-1b3d-4c5e-8f7a-9d0b1c2e3f03")?,
            "Warehouse North",
        ),
    ];

    for (id, label) in &checkpoints {
        sqlx::query(
            r#"
            INSERT INTO patrol_compliance.checkpoints (id, factory_code, label)
            VALUES ($1, $2, $3)
            ON CONFLICT (factory_code, label) DO UPDATE
            SET label = EXCLUDED.label
            "#,
        )
        .bind(id)
        .bind("F1")
        .bind(label)
        .execute(pool)
        .await?;
    }

    let scans = vec![
        (
            "seed-001",
            "Ravi Kumar",
            checkpoints[0].0,
            "2026-01-22T06:02:10+05:30",
            Some("2026-01-22T06:00:00+05:30"),
        ),
        (
            "seed-002",
            "Ravi Kumar",
            checkpoints[1].0,
            "2026-01-22T07:08:45+05:30",
            Some("2026-01-22T07:00:00+05:30"),
        ),
        (
            "seed-003",
            "Ravi Kumar",
            checkpoints[2].0,
            "2026-01-22T08:27:30+05:30",
            None,
        ),
        (
            "seed-004",
            "Suresh Babu",
            checkpoints[0].0,
            "2026-01-22T12:00:05+05:30",
            Some("2026-01-22T12:00:00+05:30"),
        ),
        (
            "seed-005",
            "Suresh Babu",
            checkpoints[1].0,
            "2026-01-21T21:04:20+05:30",
            Some("2026-01-21T21:00:00+05:30"),
        ),
    ];

    for (source_key, guard, checkpoint_id, scan_time, round_slot) in scans {
        let scan_time = parse_site_timestamp(scan_time)?;
        let round_slot = round_slot.map(parse_site_timestamp).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO patrol_compliance.scan_events
            (id, checkpoint_id, factory_code, guard_name, scan_time,
             latitude, longitude, round_slot, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(checkpoint_id)
        .bind("F1")
        .bind(guard)
        .bind(scan_time.with_timezone(&Utc))
        .bind(11.0168)
        .bind(76.9558)
        .bind(round_slot.map(|slot| slot.with_timezone(&Utc)))
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        guard_name: String,
        checkpoint_label: String,
        factory_code: String,
        scan_time: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
        round_slot: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let scan_time = parse_site_timestamp(&row.scan_time)?;
        let round_slot = row
            .round_slot
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(parse_site_timestamp)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO patrol_compliance.factories (factory_code, factory_name)
            VALUES ($1, $1)
            ON CONFLICT (factory_code) DO NOTHING
            "#,
        )
        .bind(&row.factory_code)
        .execute(pool)
        .await?;

        let checkpoint_id: Uuid = sqlx::query(
            r#"
            INSERT INTO patrol_compliance.checkpoints (id, factory_code, label)
            VALUES ($1, $2, $3)
            ON CONFLICT (factory_code, label) DO UPDATE
            SET label = EXCLUDED.label
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.factory_code)
        .bind(&row.checkpoint_label)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO patrol_compliance.scan_events
            (id, checkpoint_id, factory_code, guard_name, scan_time,
             latitude, longitude, round_slot, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(checkpoint_id)
        .bind(&row.factory_code)
        .bind(&row.guard_name)
        .bind(scan_time.with_timezone(&Utc))
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(round_slot.map(|slot| slot.with_timezone(&Utc)))
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn fetch_factory(pool: &PgPool, factory_code: &str) -> anyhow::Result<Option<Factory>> {
    let row = sqlx::query(
        "SELECT factory_code, factory_name, factory_address \
         FROM patrol_compliance.factories WHERE factory_code = $1",
    )
    .bind(factory_code)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Factory {
        factory_code: row.get("factory_code"),
        factory_name: row.get("factory_name"),
        factory_address: row.get("factory_address"),
    }))
}

pub async fn fetch_checkpoints(pool: &PgPool, factory_code: &str) -> anyhow::Result<Vec<Checkpoint>> {
    let rows = sqlx::query(
        "SELECT id, factory_code, label \
         FROM patrol_compliance.checkpoints WHERE factory_code = $1 ORDER BY label",
    )
    .bind(factory_code)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Checkpoint {
            id: row.get("id"),
            factory_code: row.get("factory_code"),
            label: row.get("label"),
        })
        .collect())
}

pub struct ScanFilter<'a> {
    pub factory_code: Option<&'a str>,
    pub guard_name: Option<&'a str>,
    pub from: DateTime<FixedOffset>,
    pub to: DateTime<FixedOffset>,
}

pub async fn fetch_scans(pool: &PgPool, filter: ScanFilter<'_>) -> anyhow::Result<Vec<ScanEvent>> {
    let mut query = String::from(
        "SELECT s.id, s.guard_name, s.checkpoint_id, c.label AS checkpoint_label, \
         s.scan_time, s.latitude, s.longitude, s.factory_code, s.round_slot, s.status \
         FROM patrol_compliance.scan_events s \
         JOIN patrol_compliance.checkpoints c ON c.id = s.checkpoint_id \
         WHERE s.scan_time >= $1 AND s.scan_time < $2",
    );

    let mut next_param = 3;
    if filter.factory_code.is_some() {
        query.push_str(&format!(" AND s.factory_code = ${next_param}"));
        next_param += 1;
    }
    if filter.guard_name.is_some() {
        query.push_str(&format!(" AND s.guard_name = ${next_param}"));
    }
    query.push_str(" ORDER BY s.scan_time");

    let mut rows = sqlx::query(&query)
        .bind(filter.from.with_timezone(&Utc))
        .bind(filter.to.with_timezone(&Utc));

    if let Some(factory_code) = filter.factory_code {
        rows = rows.bind(factory_code);
    }
    if let Some(guard_name) = filter.guard_name {
        rows = rows.bind(guard_name);
    }

    let records = rows.fetch_all(pool).await?;
    let mut scans = Vec::new();

    for row in records {
        let scan_time: DateTime<Utc> = row.get("scan_time");
        let round_slot: Option<DateTime<Utc>> = row.get("round_slot");
        let status: Option<String> = row.get("status");

        scans.push(ScanEvent {
            id: row.get("id"),
            guard_name: row.get("guard_name"),
            checkpoint_id: row.get("checkpoint_id"),
            checkpoint_label: row.get("checkpoint_label"),
            scan_time: scan_time.with_timezone(&site_offset()),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            factory_code: row.get("factory_code"),
            round_slot: round_slot.map(|slot| slot.with_timezone(&site_offset())),
            status: status.as_deref().and_then(ComplianceStatus::parse),
        });
    }

    Ok(scans)
}

pub async fn update_scan_status(
    pool: &PgPool,
    scan_id: Uuid,
    status: ComplianceStatus,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE patrol_compliance.scan_events SET status = $2 WHERE id = $1")
        .bind(scan_id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn record_report_audit(
    pool: &PgPool,
    report_type: &str,
    factory_code: &str,
    report_date: NaiveDate,
    generated_by: &str,
    generated_at: DateTime<FixedOffset>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO patrol_compliance.report_audit
        (id, report_type, factory_code, report_date, generated_by, generated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(report_type)
    .bind(factory_code)
    .bind(report_date)
    .bind(generated_by)
    .bind(generated_at.with_timezone(&Utc))
    .execute(pool)
    .await?;
    Ok(())
}
