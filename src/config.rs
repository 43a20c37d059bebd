//! Configuration loader for the `endpoint-checker` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). The resulting [`Config`] is built once at startup
//! and handed to the router, the checker and the scheduler; nothing else reads
//! the process environment.
use std::{env, net::SocketAddr, time::Duration};

use anyhow::{anyhow, bail, Result};

/// Parse an optional numeric variable with a default value.
macro_rules! parse_var {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string variable.
macro_rules! require_var {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name)
            .ok_or_else(|| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Where endpoint records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Record store implementation.
    pub store_backend: StoreBackend,

    /// PostgreSQL connection string, required for the postgres backend.
    pub db_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Table holding endpoint records.
    pub table_name: String,

    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,

    /// Records fetched per store scan page.
    pub scan_page_size: u32,

    /// Seconds between scheduled checker ticks; 0 disables the scheduler.
    pub check_interval_secs: u64,

    /// Upper bound for a single probe attempt on one port.
    pub probe_timeout_secs: u64,

    /// Ports tried in order for every target.
    pub probe_ports: Vec<u16>,

    /// Probes in flight at once during a tick; 1 keeps the checker sequential.
    pub probe_concurrency: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            db_url: None,
            db_pool_max: 5,
            table_name: "endpoint_checker".to_string(),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            scan_page_size: 100,
            check_interval_secs: 300,
            probe_timeout_secs: 3,
            probe_ports: vec![80, 443],
            probe_concurrency: 1,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string (postgres backend only)
///
/// Optional:
/// - `STORE_BACKEND` – `postgres` or `memory` (default: postgres)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `TABLE_NAME` – record table (default: endpoint_checker)
/// - `LISTEN_ADDR` – HTTP bind address (default: 0.0.0.0:8080)
/// - `SCAN_PAGE_SIZE` – records per scan page (default: 100)
/// - `CHECK_INTERVAL_SECS` – scheduler period (default: 300)
/// - `PROBE_TIMEOUT_SECS` – per-port probe timeout (default: 3)
/// - `PROBE_PORTS` – comma separated probe ports (default: 80,443)
/// - `PROBE_CONCURRENCY` – parallel probes per tick (default: 1)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    load(|name| env::var(name).ok())
}

fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    // ---
    let defaults = Config::default();

    let store_backend = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
        None | Some("postgres") => StoreBackend::Postgres,
        Some("memory") => StoreBackend::Memory,
        Some(other) => bail!("Invalid STORE_BACKEND: {other} (expected postgres or memory)"),
    };

    let db_url = match store_backend {
        StoreBackend::Postgres => Some(require_var!(lookup, "DATABASE_URL")),
        StoreBackend::Memory => lookup("DATABASE_URL"),
    };

    let table_name = lookup("TABLE_NAME").unwrap_or(defaults.table_name);
    validate_table_name(&table_name)?;

    let listen_addr = parse_var!(lookup, "LISTEN_ADDR", SocketAddr, defaults.listen_addr);
    let db_pool_max = parse_var!(lookup, "DB_POOL_MAX", u32, defaults.db_pool_max);
    let scan_page_size = parse_var!(lookup, "SCAN_PAGE_SIZE", u32, defaults.scan_page_size);
    let check_interval_secs = parse_var!(
        lookup,
        "CHECK_INTERVAL_SECS",
        u64,
        defaults.check_interval_secs
    );
    let probe_timeout_secs =
        parse_var!(lookup, "PROBE_TIMEOUT_SECS", u64, defaults.probe_timeout_secs);
    let probe_concurrency =
        parse_var!(lookup, "PROBE_CONCURRENCY", u32, defaults.probe_concurrency);

    let probe_ports = match lookup("PROBE_PORTS") {
        Some(raw) => parse_ports(&raw)?,
        None => defaults.probe_ports,
    };

    if scan_page_size == 0 {
        bail!("Invalid SCAN_PAGE_SIZE: must be greater than 0");
    }
    if probe_timeout_secs == 0 {
        bail!("Invalid PROBE_TIMEOUT_SECS: must be greater than 0");
    }
    if probe_concurrency == 0 {
        bail!("Invalid PROBE_CONCURRENCY: must be greater than 0");
    }

    Ok(Config {
        store_backend,
        db_url,
        db_pool_max,
        table_name,
        listen_addr,
        scan_page_size,
        check_interval_secs,
        probe_timeout_secs,
        probe_ports,
        probe_concurrency,
    })
}

fn parse_ports(raw: &str) -> Result<Vec<u16>> {
    // ---
    let ports = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<u16>()
                .map_err(|e| anyhow!("Invalid PROBE_PORTS entry '{}': {}", s.trim(), e))
        })
        .collect::<Result<Vec<_>>>()?;

    if ports.is_empty() {
        bail!("Invalid PROBE_PORTS: at least one port is required");
    }
    Ok(ports)
}

/// The table name is spliced into SQL, so keep it to a safe alphabet.
fn validate_table_name(name: &str) -> Result<()> {
    // ---
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        bail!("Invalid TABLE_NAME '{name}': use letters, digits, '_' or '-'");
    }
    Ok(())
}

impl Config {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn check_interval(&self) -> Option<Duration> {
        (self.check_interval_secs > 0).then(|| Duration::from_secs(self.check_interval_secs))
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        let masked_db_url = self.db_url.as_deref().map(mask_password);

        tracing::info!("Configuration loaded:");
        tracing::info!("  STORE_BACKEND       : {:?}", self.store_backend);
        tracing::info!(
            "  DATABASE_URL        : {}",
            masked_db_url.as_deref().unwrap_or("<unset>")
        );
        tracing::info!("  DB_POOL_MAX         : {}", self.db_pool_max);
        tracing::info!("  TABLE_NAME          : {}", self.table_name);
        tracing::info!("  LISTEN_ADDR         : {}", self.listen_addr);
        tracing::info!("  SCAN_PAGE_SIZE      : {}", self.scan_page_size);
        tracing::info!("  CHECK_INTERVAL_SECS : {}", self.check_interval_secs);
        tracing::info!("  PROBE_TIMEOUT_SECS  : {}", self.probe_timeout_secs);
        tracing::info!("  PROBE_PORTS         : {:?}", self.probe_ports);
        tracing::info!("  PROBE_CONCURRENCY   : {}", self.probe_concurrency);
    }
}

fn mask_password(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // "postgres://host" has its only colon in the scheme
            if !db_url[colon_pos..].starts_with("://") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}
