//! The liveness checker: one tick scans every active record and probes its
//! target, logging a verdict per URL.
//!
//! Probe failures are per-URL and never abort the batch. Only a failed store
//! scan fails the tick, and in that case no probe is attempted.

use futures_util::{stream, StreamExt};
use tracing::{error, info};

use crate::error::StoreError;
use crate::probe::{ProbeError, Prober};
use crate::store::{scan_all, ScanFilter, SharedStore};
use crate::Config;

// ---

/// Verdict for a single target.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub target_url: String,
    /// The port that answered, or the last probe error.
    pub result: Result<u16, ProbeError>,
}

impl ProbeOutcome {
    pub fn is_online(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of one completed tick, in scan order.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub outcomes: Vec<ProbeOutcome>,
}

impl CheckReport {
    pub fn online(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_online()).count()
    }

    pub fn offline(&self) -> usize {
        self.outcomes.len() - self.online()
    }
}

#[derive(Clone)]
pub struct Checker {
    store: SharedStore,
    prober: Prober,
    page_size: usize,
    concurrency: usize,
}

impl Checker {
    pub fn new(store: SharedStore, prober: Prober, page_size: usize, concurrency: usize) -> Self {
        Self {
            store,
            prober,
            page_size: page_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(store: SharedStore, config: &Config) -> Self {
        Self::new(
            store,
            Prober::from_config(config),
            config.scan_page_size as usize,
            config.probe_concurrency as usize,
        )
    }

    /// Run one tick.
    ///
    /// With a concurrency of 1 the targets are probed strictly one after the
    /// other. Higher values keep that many probes in flight but still report
    /// and log in scan order.
    pub async fn run(&self) -> Result<CheckReport, StoreError> {
        // ---
        let records = scan_all(self.store.as_ref(), ScanFilter::ActiveOnly, self.page_size).await?;
        info!("Checking {} active endpoints", records.len());

        let mut report = CheckReport::default();

        if self.concurrency == 1 {
            for record in records {
                let result = self.prober.check(&record.target_url).await;
                report.outcomes.push(log_outcome(record.target_url, result));
            }
        } else {
            let prober = &self.prober;
            report.outcomes = stream::iter(records)
                .map(|record| async move {
                    let result = prober.check(&record.target_url).await;
                    (record.target_url, result)
                })
                .buffered(self.concurrency)
                .map(|(url, result)| log_outcome(url, result))
                .collect()
                .await;
        }

        info!(
            "Check complete: {} online, {} offline",
            report.online(),
            report.offline()
        );
        Ok(report)
    }
}

fn log_outcome(target_url: String, result: Result<u16, ProbeError>) -> ProbeOutcome {
    // ---
    match &result {
        Ok(_) => info!("The status of '{}' is: OK", target_url),
        Err(e) => error!("The status of '{}' is: NOT OK: {}", target_url, e),
    }
    ProbeOutcome { target_url, result }
}
