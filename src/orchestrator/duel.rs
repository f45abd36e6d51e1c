//! Drives one confirmed duel chapter from initiation to a terminal outcome.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bridge::GameBridge;
use crate::chapter::{ChapterId, Outcome};
use crate::config::Timings;
use crate::orchestrator::status::RunStatus;
use crate::stop::StopToken;

/// Executes the fixed duel protocol: force-start, wait for the engine,
/// instant win, advance the end screens, wait for the engine to go quiet,
/// settle the result screens.
pub struct DuelExecutor {
    bridge: Arc<dyn GameBridge>,
    status: Arc<RunStatus>,
    stop: StopToken,
    timings: Timings,
}

impl DuelExecutor {
    pub fn new(
        bridge: Arc<dyn GameBridge>,
        status: Arc<RunStatus>,
        stop: StopToken,
        timings: Timings,
    ) -> Self {
        Self {
            bridge,
            status,
            stop,
            timings,
        }
    }

    /// Run the full protocol for `chapter`.
    ///
    /// A rejected initiation is `Failed` (retried on a later run). A duel
    /// that never activates after an accepted initiation is `Skipped`: it is
    /// most likely already resolved server-side, and the skip fallback on a
    /// later pass is always safe. A duel that never ends is `Failed`.
    pub async fn run(&self, chapter: ChapterId) -> Outcome {
        self.status.set_phase(format!("retry duel {chapter}"));
        if !self.bridge.retry_duel(chapter, true).await {
            debug!(%chapter, "duel initiation rejected");
            return Outcome::Failed;
        }

        self.status.set_phase(format!("waiting for duel {chapter}"));
        if !self.wait_for_duel().await {
            warn!(%chapter, "duel never started; treating as already resolved");
            self.bridge.clean_vc_stack().await;
            return Outcome::Skipped;
        }

        // Life totals need a moment to initialize before an instant win
        // means anything.
        self.stop.sleep(self.timings.duel_settle).await;

        self.status.set_phase(format!("instant win {chapter}"));
        self.instant_win().await;

        self.status.set_phase(format!("advancing {chapter}"));
        self.advance_end().await;

        if !self.wait_for_duel_end().await {
            warn!(%chapter, "duel never ended");
            return Outcome::Failed;
        }

        // Result screens auto-dismiss via the installed hooks; give them
        // time, then clear anything left on the stack.
        self.status.set_phase(format!("settling results {chapter}"));
        self.stop.sleep(self.timings.results_settle).await;
        self.bridge.clean_vc_stack().await;
        self.stop.sleep(self.timings.post_clean_delay).await;

        Outcome::Won
    }

    /// Best-effort instant win: bounded attempts, each failure non-fatal.
    async fn instant_win(&self) {
        for _ in 0..self.timings.instant_win_attempts {
            if self.stop.is_stopped() || !self.bridge.is_duel_active().await {
                break;
            }
            if self.bridge.instant_win().await {
                break;
            }
            self.stop.sleep(self.timings.instant_win_delay).await;
        }
    }

    /// Click through the end-of-duel message until the engine goes inactive.
    async fn advance_end(&self) {
        let mut elapsed = Duration::ZERO;
        while elapsed < self.timings.advance_timeout && !self.stop.is_stopped() {
            if !self.bridge.is_duel_active().await {
                break;
            }
            self.bridge.advance_duel_end().await;
            self.bridge.dismiss_dialogs().await;
            if !self.stop.sleep(self.timings.advance_interval).await {
                break;
            }
            elapsed += self.timings.advance_interval;
        }
    }

    /// Bounded wait for the duel engine to become active. Dialogs can block
    /// session start, so each unsuccessful poll also dismisses them.
    async fn wait_for_duel(&self) -> bool {
        let mut elapsed = Duration::ZERO;
        while elapsed < self.timings.wait_active && !self.stop.is_stopped() {
            if self.bridge.is_duel_active().await {
                return true;
            }
            self.bridge.dismiss_dialogs().await;
            if !self.stop.sleep(self.timings.activity_poll).await {
                break;
            }
            elapsed += self.timings.activity_poll;
        }
        false
    }

    /// Bounded wait for the duel engine to go inactive (scene transition).
    async fn wait_for_duel_end(&self) -> bool {
        let mut elapsed = Duration::ZERO;
        while elapsed < self.timings.wait_inactive && !self.stop.is_stopped() {
            if !self.bridge.is_duel_active().await {
                info!("duel engine inactive");
                return true;
            }
            self.bridge.dismiss_dialogs().await;
            if !self.stop.sleep(self.timings.activity_poll).await {
                break;
            }
            elapsed += self.timings.activity_poll;
        }
        false
    }
}
