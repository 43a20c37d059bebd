use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

use crate::checker::Checker;

/// A scheduler running on the tokio runtime.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Spawn [`run`] as a background task.
pub fn spawn(checker: Checker, every: Duration) -> SchedulerHandle {
    // ---
    let (shutdown, rx) = watch::channel(false);
    let task = tokio::spawn(run(checker, every, rx));
    SchedulerHandle { shutdown, task }
}

impl SchedulerHandle {
    /// Signal shutdown and wait for an in-flight tick to finish.
    ///
    /// Returns `false` when the loop had already exited and nobody was
    /// listening for the signal.
    pub async fn stop(self) -> Result<bool, JoinError> {
        // ---
        let signalled = self.shutdown.send(true).is_ok();
        if !signalled {
            tracing::debug!("Scheduler already stopped before shutdown was signalled");
        }
        self.task.await?;
        Ok(signalled)
    }
}

/// Run the checker on a fixed interval until shutdown is signalled.
///
/// The first tick fires immediately. A tick that overruns the interval delays
/// the next one instead of bursting to catch up, and a failed tick is logged
/// and skipped, never retried.
pub async fn run(checker: Checker, every: Duration, mut shutdown: watch::Receiver<bool>) {
    // ---
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!("Scheduler started, checking every {:?}", every);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        if *shutdown.borrow() {
            break;
        }

        match checker.run().await {
            Ok(report) => tracing::debug!("Tick finished with {} outcomes", report.outcomes.len()),
            Err(e) => tracing::error!("Tick failed, skipping until next interval: {}", e),
        }
    }

    tracing::info!("Scheduler stopped");
}
