//! Application entry point for the `endpoint-checker` service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Opening the record store (PostgreSQL pool + schema, or in-memory)
//! - Spawning the liveness checker scheduler
//! - Binding the Axum HTTP server and serving requests until Ctrl-C/SIGTERM
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required** for postgres) – PostgreSQL connection string
//! - `STORE_BACKEND` (optional) – `postgres` or `memory` (default: postgres)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the remaining knobs.
use std::{env, io::IsTerminal, sync::Arc};

use anyhow::Result;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use endpoint_checker::config::{self, Config, StoreBackend};
use endpoint_checker::{build_app, scheduler, schema, Checker, MemoryStore, PgStore, SharedStore};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let store = open_store(&cfg).await?;

    let scheduler = match cfg.check_interval() {
        Some(every) => {
            let checker = Checker::from_config(store.clone(), &cfg);
            Some(scheduler::spawn(checker, every))
        }
        None => {
            tracing::info!("CHECK_INTERVAL_SECS is 0, scheduler disabled");
            None
        }
    };

    let addr = cfg.listen_addr;
    let app = build_app(store, cfg);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let an in-flight tick finish before exiting.
    if let Some(handle) = scheduler {
        handle.stop().await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

// ---

async fn open_store(cfg: &Config) -> Result<SharedStore> {
    // ---
    match cfg.store_backend {
        StoreBackend::Postgres => {
            let db_url = cfg
                .db_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set for the postgres backend"))?;

            tracing::info!("Attempting to connect to database");

            let pool = PgPoolOptions::new()
                .max_connections(cfg.db_pool_max)
                .connect(db_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

            tracing::info!("Successfully connected to database");

            schema::create_schema(&pool, &cfg.table_name).await?;
            Ok(Arc::new(PgStore::new(pool, cfg.table_name.clone())))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; records are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    // ---
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}

/// Install the process-wide log subscriber.
///
/// Every handler and checker tick logs through this one subscriber, so it has
/// to be in place before the config is even read. There is no teardown.
///
/// Knobs, all read straight from the environment since logging comes up
/// before [`Config`] exists:
/// - `RUST_LOG` wins when set; otherwise `AXUM_LOG_LEVEL` picks one level
///   (default `debug`) and sqlx query logging is held at `warn`.
/// - `AXUM_SPAN_EVENTS=full|enter_exit` adds span enter/exit events; by
///   default only span close is reported.
/// - `FORCE_COLOR` forces ANSI colour on or off; without it colour follows
///   whether stdout is a terminal.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AXUM_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
