//! The consumed command channel to the remote game process.
//!
//! The transport itself (attach, framing, script injection) lives outside
//! this crate; the orchestrator only depends on this trait. Every call is a
//! blocking round-trip from the caller's perspective, and expected failures
//! come back as `false` or `None` rather than errors.

use async_trait::async_trait;

use crate::chapter::ChapterId;

#[cfg(test)]
pub(crate) mod fake;

/// Named remote calls issued through the generic entry points.
pub mod methods {
    pub const SOLO_SKIP: &str = "Solo_skip";
    pub const SOLO_GATE_ENTRY: &str = "Solo_gate_entry";
    pub const SOLO_SET_USE_DECK_TYPE: &str = "Solo_set_use_deck_type";
}

/// Structured reply from a result-bearing remote call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Remote response code; `0` means the command was accepted.
    pub code: i64,
    /// Raw reply payload, for callers that need more than the code.
    pub payload: serde_json::Value,
}

impl ApiResponse {
    pub fn accepted(&self) -> bool {
        self.code == 0
    }
}

/// Remote command surface the orchestrator drives the game through.
///
/// Result-bearing calls are distinct from fire-and-forget ones so the type
/// system documents which outcomes are safe to ignore.
#[async_trait]
pub trait GameBridge: Send + Sync {
    /// Liveness check for the underlying connection.
    async fn is_attached(&self) -> bool;

    /// Re-establish the connection. Returns `false` if the process is gone
    /// or injection failed.
    async fn reattach(&self) -> bool;

    /// Named remote call expecting a structured reply.
    /// `None` means the transport failed before a reply arrived.
    async fn call_with_result(&self, method: &str, arg: Option<i64>) -> Option<ApiResponse>;

    /// Named remote call whose reply is never polled.
    async fn call_fire_and_forget(&self, method: &str, arg: Option<i64>);

    /// Two-argument variant of [`call_with_result`](Self::call_with_result).
    async fn call_two_args(&self, method: &str, arg1: i64, arg2: i64) -> Option<ApiResponse>;

    /// Whether the duel engine is currently running a session.
    async fn is_duel_active(&self) -> bool;

    /// Set the opponent's life points to zero.
    async fn instant_win(&self) -> bool;

    /// Click through the end-of-duel message.
    async fn advance_duel_end(&self) -> bool;

    /// Dismiss any open error/notice dialogs.
    async fn dismiss_dialogs(&self) -> bool;

    /// Remove stuck view controllers from the UI stack.
    async fn clean_vc_stack(&self) -> bool;

    /// Force the game process to restart itself.
    async fn force_reboot(&self) -> bool;

    /// Set the engine speed multiplier (1.0 is neutral).
    async fn set_time_scale(&self, scale: f64) -> bool;

    /// Install hooks that auto-dismiss result/clear screens.
    async fn hook_result_screens(&self) -> bool;

    /// Force-start the duel for `chapter`, optionally with a rental deck.
    async fn retry_duel(&self, chapter: ChapterId, is_rental: bool) -> bool;
}
