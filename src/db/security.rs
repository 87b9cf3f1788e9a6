use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};

use super::enum_col;
use crate::model::{EventStatus, MilitaryBranch, SecurityEvent, SecurityThreat, Severity};
use crate::rules::security::GeneratedEvent;

const THREAT_COLUMNS: &str =
    "id, country_id, threat_type, severity, likelihood, description, is_active, created_at";

const EVENT_COLUMNS: &str = "id, country_id, event_type, severity, title, description, \
                             casualties, economic_impact, status, is_active, created_at";

fn threat_from_row(row: &PgRow) -> Result<SecurityThreat, sqlx::Error> {
    Ok(SecurityThreat {
        id: row.try_get("id")?,
        country_id: row.try_get("country_id")?,
        threat_type: row.try_get("threat_type")?,
        severity: enum_col(row, "severity")?,
        likelihood: row.try_get("likelihood")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn event_from_row(row: &PgRow) -> Result<SecurityEvent, sqlx::Error> {
    Ok(SecurityEvent {
        id: row.try_get("id")?,
        country_id: row.try_get("country_id")?,
        event_type: enum_col(row, "event_type")?,
        severity: enum_col(row, "severity")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        casualties: row.try_get("casualties")?,
        economic_impact: row.try_get("economic_impact")?,
        status: enum_col(row, "status")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn branch_from_row(row: &PgRow) -> Result<MilitaryBranch, sqlx::Error> {
    Ok(MilitaryBranch {
        id: row.try_get("id")?,
        country_id: row.try_get("country_id")?,
        name: row.try_get("name")?,
        readiness: row.try_get("readiness")?,
    })
}

// --- Threats ---

pub async fn insert_threat<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
    threat_type: &str,
    severity: Severity,
    likelihood: f64,
    description: &str,
) -> Result<SecurityThreat, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO security_threats (country_id, threat_type, severity, likelihood, description) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {THREAT_COLUMNS}"
    ))
    .bind(country_id)
    .bind(threat_type)
    .bind(severity.as_str())
    .bind(likelihood)
    .bind(description)
    .fetch_one(exec)
    .await?;
    threat_from_row(&row)
}

pub async fn get_threat<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<SecurityThreat>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {THREAT_COLUMNS} FROM security_threats WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?
    .map(|row| threat_from_row(&row))
    .transpose()
}

pub async fn active_threats<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
) -> Result<Vec<SecurityThreat>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {THREAT_COLUMNS} FROM security_threats \
         WHERE country_id = $1 AND is_active ORDER BY created_at DESC, id DESC"
    ))
    .bind(country_id)
    .fetch_all(exec)
    .await?
    .iter()
    .map(threat_from_row)
    .collect()
}

pub async fn deactivate_threat<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<SecurityThreat>, sqlx::Error> {
    sqlx::query(&format!(
        "UPDATE security_threats SET is_active = FALSE WHERE id = $1 RETURNING {THREAT_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?
    .map(|row| threat_from_row(&row))
    .transpose()
}

// --- Events ---

pub async fn insert_event<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
    event: &GeneratedEvent,
) -> Result<SecurityEvent, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO security_events (country_id, event_type, severity, title, description, \
                                      casualties, economic_impact, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {EVENT_COLUMNS}"
    ))
    .bind(country_id)
    .bind(event.event_type.as_str())
    .bind(event.severity.as_str())
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.casualties)
    .bind(event.economic_impact)
    .bind(EventStatus::Active.as_str())
    .fetch_one(exec)
    .await?;
    event_from_row(&row)
}

pub async fn list_events<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
    active_only: bool,
) -> Result<Vec<SecurityEvent>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {EVENT_COLUMNS} FROM security_events \
         WHERE country_id = $1 AND (NOT $2 OR is_active) ORDER BY created_at DESC, id DESC"
    ))
    .bind(country_id)
    .bind(active_only)
    .fetch_all(exec)
    .await?
    .iter()
    .map(event_from_row)
    .collect()
}

pub async fn get_event<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<SecurityEvent>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {EVENT_COLUMNS} FROM security_events WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?
    .map(|row| event_from_row(&row))
    .transpose()
}

pub async fn resolve_event<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<SecurityEvent>, sqlx::Error> {
    sqlx::query(&format!(
        "UPDATE security_events SET status = $2, is_active = FALSE \
         WHERE id = $1 RETURNING {EVENT_COLUMNS}"
    ))
    .bind(id)
    .bind(EventStatus::Resolved.as_str())
    .fetch_optional(exec)
    .await?
    .map(|row| event_from_row(&row))
    .transpose()
}

// --- Military ---

pub async fn list_branches<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
) -> Result<Vec<MilitaryBranch>, sqlx::Error> {
    sqlx::query("SELECT id, country_id, name, readiness FROM military_branches WHERE country_id = $1 ORDER BY id")
        .bind(country_id)
        .fetch_all(exec)
        .await?
        .iter()
        .map(branch_from_row)
        .collect()
}

pub async fn get_branch<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<MilitaryBranch>, sqlx::Error> {
    sqlx::query("SELECT id, country_id, name, readiness FROM military_branches WHERE id = $1")
        .bind(id)
        .fetch_optional(exec)
        .await?
        .map(|row| branch_from_row(&row))
        .transpose()
}

pub async fn insert_branch<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
    name: &str,
    readiness: f64,
) -> Result<MilitaryBranch, sqlx::Error> {
    let row = sqlx::query(
        "INSERT INTO military_branches (country_id, name, readiness) VALUES ($1, $2, $3) \
         RETURNING id, country_id, name, readiness",
    )
    .bind(country_id)
    .bind(name)
    .bind(readiness)
    .fetch_one(exec)
    .await?;
    branch_from_row(&row)
}

pub async fn set_readiness<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
    readiness: f64,
) -> Result<Option<MilitaryBranch>, sqlx::Error> {
    sqlx::query(
        "UPDATE military_branches SET readiness = $2 WHERE id = $1 \
         RETURNING id, country_id, name, readiness",
    )
    .bind(id)
    .bind(readiness)
    .fetch_optional(exec)
    .await?
    .map(|row| branch_from_row(&row))
    .transpose()
}

pub async fn readiness_levels<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
) -> Result<Vec<f64>, sqlx::Error> {
    sqlx::query_scalar("SELECT readiness FROM military_branches WHERE country_id = $1")
        .bind(country_id)
        .fetch_all(exec)
        .await
}

/// Update the two country-level stats the security score reads.
pub async fn set_country_stats<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
    internal_stability: Option<f64>,
    border_security: Option<f64>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE countries SET \
             internal_stability = COALESCE($2, internal_stability), \
             border_security = COALESCE($3, border_security), \
             updated_at = now() \
         WHERE id = $1",
    )
    .bind(country_id)
    .bind(internal_stability)
    .bind(border_security)
    .execute(exec)
    .await?;
    Ok(result.rows_affected() == 1)
}
