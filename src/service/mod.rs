//! Procedure handlers, one module per router.
//!
//! Each procedure takes the shared [`Context`], the calling [`Actor`] and a
//! deserialized input, checks bounds and capabilities, then reads and writes
//! through `db`. Multi-row writes run in one transaction; notifications and
//! audit entries are emitted only after the transaction commits.
//!
//! [`Actor`]: crate::access::Actor

pub mod crafting;
pub mod diplomacy;
pub mod embassy;
pub mod intelligence;
pub mod mission;
pub mod security;
pub mod wiki_import;

use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use sqlx::{PgExecutor, PgPool};

use crate::audit::{AuditEntry, AuditLog, AuditSink};
use crate::error::ServiceError;
use crate::model::{Country, Notification};
use crate::notify::Outbox;
use crate::rules::mission::ResolutionPolicy;

/// Everything a procedure needs besides its input. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Context {
    pub pool: PgPool,
    pub outbox: Outbox,
    pub audit: AuditLog,
    pub resolution: ResolutionPolicy,
    rng: Arc<Mutex<SmallRng>>,
}

impl Context {
    pub fn new(
        pool: PgPool,
        outbox: Outbox,
        audit: AuditLog,
        resolution: ResolutionPolicy,
    ) -> Self {
        Self {
            pool,
            outbox,
            audit,
            resolution,
            rng: Arc::new(Mutex::new(SmallRng::from_os_rng())),
        }
    }

    /// Replace the random source with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(SmallRng::seed_from_u64(seed)));
        self
    }

    /// Run `f` with the shared random source. Never hold the result across an
    /// await point that needs the lock again.
    pub(crate) fn with_rng<T>(&self, f: impl FnOnce(&mut SmallRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    pub(crate) fn notify(&self, notification: Notification) -> bool {
        self.outbox.enqueue(notification)
    }

    pub(crate) async fn record(&self, entry: AuditEntry) {
        self.audit.record(entry).await;
    }
}

pub(crate) async fn load_country<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
) -> Result<Country, ServiceError> {
    crate::db::country::get_country(exec, country_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("country", country_id))
}

/// Map a unique-constraint violation to a caller-facing message; anything
/// else stays an internal error.
pub(crate) fn unique_violation(err: sqlx::Error, message: &str) -> ServiceError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ServiceError::bad_request(message)
        }
        _ => err.into(),
    }
}

/// Audit name for an actor.
pub(crate) fn actor_name(actor: &crate::access::Actor) -> &str {
    actor.user_id.as_deref().unwrap_or("anonymous")
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::audit::TracingAudit;

    fn context() -> Context {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/nation_sim")
            .unwrap();
        let (outbox, _rx) = Outbox::detached(4);
        Context::new(
            pool,
            outbox,
            AuditLog::Tracing(TracingAudit),
            ResolutionPolicy::Roll,
        )
    }

    #[tokio::test]
    async fn seeded_contexts_draw_the_same_numbers() {
        let a = context().with_seed(11);
        let b = context().with_seed(11);
        let xs: Vec<u32> = (0..5).map(|_| a.with_rng(|r| r.random_range(0..1000))).collect();
        let ys: Vec<u32> = (0..5).map(|_| b.with_rng(|r| r.random_range(0..1000))).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn unrelated_errors_stay_internal() {
        let err = unique_violation(sqlx::Error::RowNotFound, "duplicate");
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
    }
}
