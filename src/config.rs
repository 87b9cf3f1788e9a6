use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

use crate::rules::mission::ResolutionPolicy;

/// Runtime settings. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Nation simulation game server", long_about = None)]
pub struct Config {
    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Address the HTTP server listens on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    #[arg(long, env = "MAX_DB_CONNECTIONS", default_value_t = 10)]
    pub max_db_connections: u32,

    /// How completed missions decide success: `roll` or `threshold`.
    #[arg(long, env = "MISSION_RESOLUTION", default_value = "roll")]
    pub mission_resolution: ResolutionPolicy,

    /// Notifications queued beyond this are dropped.
    #[arg(long, env = "NOTIFY_QUEUE_CAPACITY", default_value_t = 256)]
    pub notify_queue_capacity: usize,

    #[arg(long, value_enum, env = "AUDIT_SINK", default_value_t = AuditSinkKind::Postgres)]
    pub audit_sink: AuditSinkKind,

    /// Tracing filter used when RUST_LOG is unset.
    #[arg(long, env = "LOG_FILTER", default_value = "info")]
    pub log_filter: String,

    /// Seed for the shared random source. Unset draws from the OS.
    #[arg(long, env = "RNG_SEED")]
    pub rng_seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum AuditSinkKind {
    /// Rows in the `audit_log` table.
    Postgres,
    /// Structured log lines only.
    Log,
}
