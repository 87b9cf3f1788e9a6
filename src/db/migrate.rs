use sqlx::PgPool;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

/// Arbitrary key for the advisory lock that serializes concurrent migrations.
const SCHEMA_LOCK_KEY: i64 = 0x6e61_7469_6f6e;

/// Apply `sql/schema.sql` (every statement is IF NOT EXISTS). Servers starting
/// together take turns on a transaction-scoped advisory lock.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *tx)
        .await?;
    sqlx::raw_sql(SCHEMA).execute(&mut *tx).await?;
    tx.commit().await?;
    tracing::info!("schema up to date");
    Ok(())
}
