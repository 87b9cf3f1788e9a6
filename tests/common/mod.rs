#![allow(dead_code)]

use nation_sim::audit::{AuditLog, TracingAudit};
use nation_sim::db;
use nation_sim::model::Notification;
use nation_sim::notify::Outbox;
use nation_sim::rules::mission::ResolutionPolicy;
use nation_sim::service::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::mpsc;

pub struct Harness {
    pub ctx: Context,
    /// Notifications the procedures queued, in order.
    pub notifications: mpsc::Receiver<Notification>,
    _container: ContainerAsync<Postgres>,
}

impl Harness {
    pub fn pool(&self) -> &PgPool {
        &self.ctx.pool
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut seen = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            seen.push(n);
        }
        seen
    }
}

/// Fresh migrated database, seeded random source, threshold resolution so
/// mission outcomes are predictable.
pub async fn setup() -> Harness {
    let container = Postgres::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let pool = PgPoolOptions::new()
        .connect(&format!(
            "postgres://postgres:postgres@{}:{}/postgres",
            host, port
        ))
        .await
        .unwrap();
    db::migrate(&pool).await.unwrap();

    let (outbox, notifications) = Outbox::detached(64);
    let ctx = Context::new(
        pool,
        outbox,
        AuditLog::Tracing(TracingAudit),
        ResolutionPolicy::Threshold,
    )
    .with_seed(42);
    Harness {
        ctx,
        notifications,
        _container: container,
    }
}

pub async fn country(pool: &PgPool, name: &str, stability: f64, border: f64) -> i64 {
    db::country::insert_country(pool, name, stability, border)
        .await
        .unwrap()
}

pub const CAPHIRIA_WIKITEXT: &str = r#"
{{Infobox country
| conventional_long_name = Imperial State of Caphiria
| common_name = Caphiria
| capital = [[Venceia]]
| population_estimate = 437,000,000
| GDP_PPP_per_capita = $48,122<ref>IMF</ref>
| government_type = [[Unitary state|Unitary]] [[Absolute monarchy|imperial monarchy]]
| continent = Sarpedon
}}
'''Caphiria''' is a country in southern [[Sarpedon]].
"#;
