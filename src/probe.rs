//! Socket-level HTTP liveness probe.
//!
//! A probe opens a plain TCP connection to each configured port in turn,
//! sends `HEAD /` and waits for the status line. Any HTTP status counts as
//! alive; only transport failures are errors.

use std::{io, time::Duration};

use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use crate::Config;

const STATUS_PREFIX: &[u8] = b"HTTP/";

// ---

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no host in target url '{0}'")]
    InvalidTarget(String),

    #[error("no probe ports configured")]
    NoPorts,

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("i/o error talking to {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("timed out after {timeout:?} waiting for {addr}")]
    Timeout { addr: String, timeout: Duration },

    #[error("{0} closed the connection without a response")]
    NoResponse(String),

    #[error("{0} answered with something other than HTTP")]
    NotHttp(String),
}

/// Probes one URL across a fixed, ordered list of ports.
#[derive(Debug, Clone)]
pub struct Prober {
    ports: Vec<u16>,
    timeout: Duration,
}

impl Prober {
    pub fn new(ports: Vec<u16>, timeout: Duration) -> Self {
        Self { ports, timeout }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.probe_ports.clone(), config.probe_timeout())
    }

    /// Check whether `url` answers HTTP on any configured port.
    ///
    /// Ports are tried in order and the first that completes a round-trip
    /// wins; later ports are never contacted. When every port fails the last
    /// error is returned.
    pub async fn check(&self, url: &str) -> Result<u16, ProbeError> {
        // ---
        let host = target_host(url).ok_or_else(|| ProbeError::InvalidTarget(url.to_string()))?;
        let mut last_error = ProbeError::NoPorts;

        for &port in &self.ports {
            match self.attempt(host, port).await {
                Ok(()) => return Ok(port),
                Err(e) => {
                    tracing::debug!("Probe of {} on port {} failed: {}", host, port, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn attempt(&self, host: &str, port: u16) -> Result<(), ProbeError> {
        // ---
        let addr = format!("{host}:{port}");
        match tokio::time::timeout(self.timeout, head_request(host, &addr)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout {
                addr,
                timeout: self.timeout,
            }),
        }
    }
}

async fn head_request(host: &str, addr: &str) -> Result<(), ProbeError> {
    // ---
    let io_err = |source: io::Error| ProbeError::Io {
        addr: addr.to_string(),
        source,
    };

    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|source| ProbeError::Connect {
            addr: addr.to_string(),
            source,
        })?;

    let request = format!(
        "HEAD / HTTP/1.1\r\nHost: {host}\r\nUser-Agent: endpoint-checker/{}\r\nConnection: close\r\n\r\n",
        env!("CARGO_PKG_VERSION")
    );
    stream.write_all(request.as_bytes()).await.map_err(io_err)?;

    let mut buf = [0u8; 64];
    let mut filled = 0;
    while filled < STATUS_PREFIX.len() {
        let n = stream.read(&mut buf[filled..]).await.map_err(io_err)?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    if filled == 0 {
        return Err(ProbeError::NoResponse(addr.to_string()));
    }
    if !buf[..filled].starts_with(STATUS_PREFIX) {
        return Err(ProbeError::NotHttp(addr.to_string()));
    }
    Ok(())
}

/// Extract the host to probe from a loosely formed URL.
///
/// Accepts `scheme://host[:port]/path` as well as bare `host/path`. Userinfo
/// and any explicit port are dropped since the probe picks its own ports.
/// Bracketed IPv6 literals keep their brackets.
pub fn target_host(url: &str) -> Option<&str> {
    // ---
    let rest = url.trim();
    let rest = match rest.split_once("://") {
        Some((scheme, after)) if is_scheme(scheme) => after,
        _ => rest,
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);

    let host = if authority.starts_with('[') {
        let end = authority.find(']')?;
        &authority[..=end]
    } else {
        authority.split(':').next().unwrap_or_default()
    };

    (!host.is_empty()).then_some(host)
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn is_scheme(candidate: &str) -> bool {
    // ---
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
