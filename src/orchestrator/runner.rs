//! Top-level run driver: startup recovery, loading, the per-chapter loop,
//! and stopped-state cleanup.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::bridge::{GameBridge, methods};
use crate::chapter::{ChapterId, GateId, Outcome, load_chapters};
use crate::config::Config;
use crate::errors::RunError;
use crate::orchestrator::classify::{ChapterClassifier, ChapterKind};
use crate::orchestrator::duel::DuelExecutor;
use crate::orchestrator::recovery::{Recovery, RecoveryManager};
use crate::orchestrator::status::RunStatus;
use crate::stop::StopToken;
use crate::store::ProgressStore;

/// Why a run that reached the chapter loop came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every remaining chapter was processed.
    Exhausted,
    /// The external stop signal was observed.
    StopRequested,
    /// The consecutive-failure breaker tripped.
    FailureThreshold,
    /// The bridge was lost mid-run and could not be restored.
    BridgeLost,
}

/// Final counts for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub won: u32,
    pub failed: u32,
    pub skipped: u32,
    /// Chapters whose outcome was taken this run (recorded or failed).
    pub processed: u32,
    pub reason: StopReason,
}

/// Sequential driver completing every remaining solo chapter.
///
/// Single worker; no chapter executes concurrently with another. All waits
/// observe the stop token at increment granularity.
pub struct SoloRunner {
    bridge: Arc<dyn GameBridge>,
    config: Config,
    status: Arc<RunStatus>,
    stop: StopToken,
    classifier: ChapterClassifier,
    duels: DuelExecutor,
    recovery: RecoveryManager,
    /// Session-scoped gate cache; reset whenever the game reboots.
    current_gate: Option<GateId>,
}

impl SoloRunner {
    pub fn new(bridge: Arc<dyn GameBridge>, config: Config) -> Self {
        let status = Arc::new(RunStatus::default());
        let stop = StopToken::new();
        let classifier = ChapterClassifier::new(bridge.clone());
        let duels = DuelExecutor::new(
            bridge.clone(),
            status.clone(),
            stop.clone(),
            config.timings.clone(),
        );
        let recovery = RecoveryManager::new(
            bridge.clone(),
            status.clone(),
            stop.clone(),
            config.timings.clone(),
            config.time_scale,
        );
        Self {
            bridge,
            config,
            status,
            stop,
            classifier,
            duels,
            recovery,
            current_gate: None,
        }
    }

    /// Observable status surface for presentation layers.
    pub fn status(&self) -> Arc<RunStatus> {
        self.status.clone()
    }

    /// Handle for requesting a cooperative stop from another task.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Run to completion.
    ///
    /// Fatal setup failures (chapter list missing or empty, store
    /// unopenable, bridge unusable at startup) return an error; once the
    /// chapter loop has begun, premature ends are reported through
    /// [`RunSummary::reason`]. Stopped-state cleanup (neutral speed, final
    /// counts, status idle) runs on every path.
    pub async fn run(&mut self) -> Result<RunSummary, RunError> {
        info!("auto-solo starting");
        self.status.set_running(true);

        let result = self.run_to_completion().await;

        // Stopped-state cleanup, best-effort even if the bridge is gone.
        self.bridge.set_time_scale(1.0).await;
        self.status.set_current_chapter(None);
        self.status.set_phase("stopped");
        self.status.set_running(false);
        match &result {
            Ok(summary) => info!(
                won = summary.won,
                failed = summary.failed,
                skipped = summary.skipped,
                reason = ?summary.reason,
                "auto-solo stopped"
            ),
            Err(err) => error!(error = %err, "auto-solo aborted"),
        }
        result
    }

    async fn run_to_completion(&mut self) -> Result<RunSummary, RunError> {
        self.startup_recovery().await?;

        // Result screens dismiss themselves from here on.
        self.bridge.hook_result_screens().await;

        self.status.set_phase("loading");
        let all_chapters = load_chapters(&self.config.chapters_file)?;
        let identity = self.config.resolve_identity();
        let mut store =
            ProgressStore::open(&self.config.db_path(), identity).map_err(RunError::Store)?;
        let completed = store.completed().map_err(RunError::Store)?;
        let remaining: Vec<ChapterId> = all_chapters
            .iter()
            .copied()
            .filter(|chapter| !completed.contains(chapter))
            .collect();
        let prior_skipped = store
            .stats()
            .map(|stats| stats.get(&Outcome::Skipped).copied().unwrap_or(0))
            .unwrap_or(0);
        info!(
            identity = store.identity(),
            done = completed.len(),
            remaining = remaining.len(),
            total = all_chapters.len(),
            "session loaded"
        );
        self.status.seed(
            all_chapters.len() as u32,
            completed.len() as u32,
            prior_skipped as u32,
        );

        self.bridge.set_time_scale(self.config.time_scale).await;

        let summary = self.drive(&remaining, &store).await;

        if let Ok(stats) = store.stats() {
            info!(?stats, "ledger totals");
        }
        store.close();
        Ok(summary)
    }

    /// Verify the bridge and clear any stuck state before loading anything.
    async fn startup_recovery(&mut self) -> Result<(), RunError> {
        if !self.bridge.is_attached().await {
            self.status.set_phase("reconnecting bridge");
            if !self.bridge.reattach().await {
                error!("bridge not attached; cannot start run");
                return Err(RunError::BridgeUnavailable);
            }
        }

        self.status.set_phase("startup cleanup");
        self.bridge.dismiss_dialogs().await;
        self.stop.sleep(self.config.timings.dialog_settle).await;
        if !self.bridge.clean_vc_stack().await {
            warn!("startup: game in bad state, rebooting");
            if !self.recovery.full_reboot().await {
                error!("startup reboot failed; cannot start run");
                return Err(RunError::BridgeUnavailable);
            }
            self.current_gate = None;
        }
        Ok(())
    }

    async fn drive(&mut self, remaining: &[ChapterId], store: &ProgressStore) -> RunSummary {
        let mut consecutive_failures = 0u32;
        let mut won = 0u32;
        let mut failed = 0u32;
        let mut skipped = 0u32;
        let mut processed = 0u32;
        let mut reason = StopReason::Exhausted;

        for (index, &chapter) in remaining.iter().enumerate() {
            if self.stop.is_stopped() {
                reason = StopReason::StopRequested;
                break;
            }
            if !self.ensure_bridge().await {
                reason = StopReason::BridgeLost;
                break;
            }

            self.status.set_current_chapter(Some(chapter));
            self.status.set_phase(format!(
                "chapter {chapter} ({}/{})",
                index + 1,
                remaining.len()
            ));
            info!(%chapter, n = index + 1, of = remaining.len(), "processing chapter");

            let outcome = self.process_chapter(chapter).await;

            // A stop observed mid-chapter abandons the chapter in place:
            // whatever the executor returned is not recorded, so the
            // chapter is retried on the next run.
            if self.stop.is_stopped() {
                info!(%chapter, "stop observed mid-chapter; outcome not recorded");
                reason = StopReason::StopRequested;
                break;
            }

            processed += 1;
            self.status.record(outcome);
            match outcome {
                Outcome::Won | Outcome::Skipped => {
                    consecutive_failures = 0;
                    if outcome == Outcome::Won {
                        won += 1;
                        info!(%chapter, total_won = won, "chapter won");
                    } else {
                        skipped += 1;
                    }
                    if let Err(err) = store.mark(chapter, outcome) {
                        warn!(
                            %chapter, error = %err,
                            "failed to record outcome; chapter may be re-attempted next run"
                        );
                    }
                }
                Outcome::Failed => {
                    failed += 1;
                    consecutive_failures += 1;
                    warn!(%chapter, consecutive_failures, "chapter failed; recovering");
                    match self.recovery.recover().await {
                        Recovery::Cleaned => {}
                        Recovery::Rebooted => self.current_gate = None,
                        Recovery::Failed => {
                            reason = StopReason::BridgeLost;
                            break;
                        }
                    }
                }
            }

            // Let the game breathe between chapters.
            self.stop.sleep(self.config.timings.between_chapters).await;

            if consecutive_failures >= self.config.max_consecutive_failures {
                warn!(
                    limit = self.config.max_consecutive_failures,
                    "too many consecutive failures; stopping"
                );
                reason = StopReason::FailureThreshold;
                break;
            }
        }

        if reason == StopReason::Exhausted && self.stop.is_stopped() {
            reason = StopReason::StopRequested;
        }

        RunSummary {
            won,
            failed,
            skipped,
            processed,
            reason,
        }
    }

    /// Re-verify bridge liveness before a chapter; reattach and reinstall
    /// hooks and speed if it dropped. `false` means the run must stop.
    async fn ensure_bridge(&self) -> bool {
        if self.bridge.is_attached().await {
            return true;
        }
        self.status.set_phase("reconnecting bridge");
        if !self.bridge.reattach().await {
            error!("bridge reconnect failed; stopping run");
            return false;
        }
        self.bridge.hook_result_screens().await;
        self.bridge.set_time_scale(self.config.time_scale).await;
        true
    }

    /// Resolve one chapter: gate entry on gate change, skip-first, then
    /// probe, then the duel protocol for confirmed duel chapters.
    async fn process_chapter(&mut self, chapter: ChapterId) -> Outcome {
        let gate = chapter.gate();
        if self.current_gate != Some(gate) {
            info!(%gate, "entering gate");
            self.bridge
                .call_fire_and_forget(methods::SOLO_GATE_ENTRY, Some(i64::from(gate.get())))
                .await;
            self.stop.sleep(self.config.timings.gate_entry_delay).await;
            self.current_gate = Some(gate);
        }

        // Already-completed chapters resolve here without a session.
        self.status.set_phase(format!("skip {chapter}"));
        if self.try_skip(chapter).await {
            info!(%chapter, "skipped");
            self.stop.sleep(self.config.timings.skip_settle).await;
            return Outcome::Skipped;
        }

        self.status.set_phase(format!("probing {chapter}"));
        match self.classifier.probe(chapter).await {
            ChapterKind::Story => {
                // Story content with no deck cannot be meaningfully
                // retried; record it as resolved either way.
                if self.try_skip(chapter).await {
                    info!(%chapter, "completed via skip");
                    self.stop.sleep(self.config.timings.skip_settle).await;
                } else {
                    info!(%chapter, "story chapter refused skip; recording as resolved");
                }
                Outcome::Skipped
            }
            ChapterKind::Duel => self.duels.run(chapter).await,
        }
    }

    async fn try_skip(&self, chapter: ChapterId) -> bool {
        matches!(
            self.bridge
                .call_with_result(methods::SOLO_SKIP, Some(i64::from(chapter.get())))
                .await,
            Some(reply) if reply.accepted()
        )
    }
}
