use std::future::Future;

use serde::Serialize;
use sqlx::PgPool;

/// One audited action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub actor: String,
    pub action: String,
    pub target: String,
    pub details: serde_json::Value,
    pub success: bool,
}

impl AuditEntry {
    pub fn new(actor: &str, action: &str, target: impl Into<String>) -> Self {
        Self {
            actor: actor.to_string(),
            action: action.to_string(),
            target: target.into(),
            details: serde_json::Value::Null,
            success: true,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }
}

/// Where audit entries go. Recording never fails the audited operation.
pub trait AuditSink: Send + Sync + 'static {
    fn record(&self, entry: AuditEntry) -> impl Future<Output = ()> + Send;
}

/// Emits entries as structured log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    async fn record(&self, entry: AuditEntry) {
        tracing::info!(
            target: "nation_sim::audit",
            actor = %entry.actor,
            action = %entry.action,
            target_id = %entry.target,
            success = entry.success,
            details = %entry.details,
            "audit"
        );
    }
}

/// Writes entries to the `audit_log` table, falling back to a warning.
#[derive(Debug, Clone)]
pub struct PgAudit {
    pool: PgPool,
}

impl PgAudit {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AuditSink for PgAudit {
    async fn record(&self, entry: AuditEntry) {
        if let Err(err) = crate::db::audit::insert_audit(&self.pool, &entry).await {
            tracing::warn!(error = %err, action = %entry.action, "audit write failed");
        }
    }
}

/// The sink a running service is configured with.
#[derive(Debug, Clone)]
pub enum AuditLog {
    Tracing(TracingAudit),
    Postgres(PgAudit),
}

impl AuditSink for AuditLog {
    async fn record(&self, entry: AuditEntry) {
        match self {
            AuditLog::Tracing(sink) => sink.record(entry).await,
            AuditLog::Postgres(sink) => sink.record(entry).await,
        }
    }
}
