//! Fixed-period scheduler driving the controller.
//!
//! Passes run one at a time on a single task, so no pass can overlap another.
//! Periods that elapse while a pass is still running are skipped rather than
//! queued.
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api::Result;
use crate::controller::{EncounterController, EncounterSummary};

pub(crate) struct Scheduler {
    controller: EncounterController,
}

impl Scheduler {
    pub(crate) fn new(controller: EncounterController) -> Self {
        Self { controller }
    }

    /// Runs passes until shutdown or a fatal error.
    ///
    /// On shutdown the controller is reset and the summary it held just before
    /// is returned. A fatal error is returned as is.
    pub(crate) async fn run(mut self) -> Result<EncounterSummary> {
        let flags = self.controller.flags().clone();
        let period = self.controller.config().tick_period();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            target: "encounter::scheduler",
            period_ms = period.as_millis() as u64,
            "Scheduler started"
        );

        let mut passes: u64 = 0;
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = flags.woken() => {}
            }
            if flags.is_shutdown() {
                break;
            }

            passes += 1;
            match self.controller.step().await {
                Ok(()) => {}
                Err(error) if error.is_fatal() => {
                    self.controller.release_postures().await;
                    info!(target: "encounter::scheduler", passes, "Scheduler halted");
                    return Err(error);
                }
                Err(error) => {
                    debug!(target: "encounter::scheduler", pass = passes, %error, "Pass ended early");
                    self.controller.report(&error);
                }
            }
        }

        let summary = self.controller.summary();
        self.controller.shutdown().await;
        info!(target: "encounter::scheduler", passes, "Scheduler stopped");
        Ok(summary)
    }
}
