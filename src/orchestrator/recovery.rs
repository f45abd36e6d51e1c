//! Escalating remediation after a failed chapter or an unhealthy bridge.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::bridge::GameBridge;
use crate::config::Timings;
use crate::orchestrator::status::RunStatus;
use crate::stop::StopToken;

/// Net effect of a recovery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Dialogs dismissed and the view stack cleaned; no reboot needed.
    Cleaned,
    /// The game was rebooted and the bridge reattached; session-scoped
    /// caches must be re-established by the caller.
    Rebooted,
    /// The bridge could not be restored; the run must stop.
    Failed,
}

/// Dismiss dialogs, clean the view stack, and as a last resort reboot the
/// game and reattach. Never raises; each rung reports via its return value.
pub struct RecoveryManager {
    bridge: Arc<dyn GameBridge>,
    status: Arc<RunStatus>,
    stop: StopToken,
    timings: Timings,
    time_scale: f64,
}

impl RecoveryManager {
    pub fn new(
        bridge: Arc<dyn GameBridge>,
        status: Arc<RunStatus>,
        stop: StopToken,
        timings: Timings,
        time_scale: f64,
    ) -> Self {
        Self {
            bridge,
            status,
            stop,
            timings,
            time_scale,
        }
    }

    /// Run the ladder: dismiss dialogs, clean the view stack, and only if
    /// cleaning fails, fall back to a full reboot.
    pub async fn recover(&self) -> Recovery {
        self.status.set_phase("recovering");

        self.bridge.dismiss_dialogs().await;
        self.stop.sleep(self.timings.dialog_settle).await;

        if self.bridge.clean_vc_stack().await {
            info!("recovery: view stack cleaned");
            self.stop.sleep(self.timings.dialog_settle).await;
            return Recovery::Cleaned;
        }

        warn!("recovery: view stack clean failed, rebooting game");
        if self.full_reboot().await {
            Recovery::Rebooted
        } else {
            Recovery::Failed
        }
    }

    /// Reboot the game process and reattach the bridge.
    ///
    /// Returns `true` once the bridge is usable again with the result-screen
    /// hooks and the speed multiplier reinstalled. The caller must reset any
    /// session-scoped cache (e.g. the current gate) on success.
    pub async fn full_reboot(&self) -> bool {
        self.status.set_phase("rebooting game");
        // The reboot can sever the connection before a reply arrives, which
        // is itself evidence the reboot happened; ignore the call's result.
        self.bridge.force_reboot().await;

        self.status.set_phase("waiting for game restart");
        self.stop.sleep(self.timings.reboot_wait).await;

        self.status.set_phase("reattaching bridge");
        let mut attached = false;
        for attempt in 1..=self.timings.reattach_attempts {
            if self.stop.is_stopped() {
                return false;
            }
            info!(
                attempt,
                total = self.timings.reattach_attempts,
                "reattach attempt"
            );
            if self.bridge.reattach().await {
                attached = true;
                break;
            }
            self.stop.sleep(self.timings.reattach_delay).await;
        }
        if !attached {
            error!("failed to reattach bridge after reboot");
            return false;
        }

        self.bridge.hook_result_screens().await;
        self.bridge.set_time_scale(self.time_scale).await;
        info!("reboot recovery complete; bridge reattached");
        true
    }
}
