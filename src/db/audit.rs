use sqlx::PgExecutor;

use crate::audit::AuditEntry;

pub async fn insert_audit<'e>(
    exec: impl PgExecutor<'e>,
    entry: &AuditEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_log (actor, action, target, details, success) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&entry.actor)
    .bind(&entry.action)
    .bind(&entry.target)
    .bind(sqlx::types::Json(&entry.details))
    .bind(entry.success)
    .execute(exec)
    .await?;
    Ok(())
}

/// Most recent audit rows for an action, as `(actor, target, success)`.
pub async fn recent_for_action<'e>(
    exec: impl PgExecutor<'e>,
    action: &str,
    limit: i64,
) -> Result<Vec<(String, String, bool)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT actor, target, success FROM audit_log WHERE action = $1 \
         ORDER BY created_at DESC, id DESC LIMIT $2",
    )
    .bind(action)
    .bind(limit)
    .fetch_all(exec)
    .await
}
