use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use nation_sim::audit::{AuditLog, PgAudit, TracingAudit};
use nation_sim::config::{AuditSinkKind, Config};
use nation_sim::notify::{Outbox, PgNotifier};
use nation_sim::service::Context;
use nation_sim::{api, db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await?;
    db::migrate(&pool).await?;

    let (outbox, dispatcher) =
        Outbox::spawn(PgNotifier::new(pool.clone()), config.notify_queue_capacity);
    let audit = match config.audit_sink {
        AuditSinkKind::Postgres => AuditLog::Postgres(PgAudit::new(pool.clone())),
        AuditSinkKind::Log => AuditLog::Tracing(TracingAudit),
    };
    let mut ctx = Context::new(pool.clone(), outbox, audit, config.mission_resolution);
    if let Some(seed) = config.rng_seed {
        ctx = ctx.with_seed(seed);
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        resolution = ?config.mission_resolution,
        audit = ?config.audit_sink,
        "server listening"
    );
    axum::serve(listener, api::router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last outbox sender; the dispatcher drains and exits.
    if let Err(err) = dispatcher.await {
        tracing::warn!(error = %err, "notification dispatcher panicked");
    }
    pool.close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown requested");
}
