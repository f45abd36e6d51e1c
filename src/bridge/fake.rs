//! Scripted in-memory bridge used by orchestrator tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ApiResponse, GameBridge, methods};
use crate::chapter::ChapterId;

/// Queue of scripted results; once drained, `default` answers every call.
struct Script<T: Clone> {
    queue: VecDeque<T>,
    default: T,
}

impl<T: Clone> Script<T> {
    fn new(default: T) -> Self {
        Self {
            queue: VecDeque::new(),
            default,
        }
    }

    fn push_all(&mut self, values: &[T]) {
        self.queue.extend(values.iter().cloned());
    }

    fn next(&mut self) -> T {
        self.queue.pop_front().unwrap_or_else(|| self.default.clone())
    }
}

/// Simulated duel engine: activates after a number of activity polls once a
/// duel has been started, deactivates after a number of end-advances.
struct DuelSim {
    started: bool,
    active: bool,
    activate_after_polls: Option<u32>,
    deactivate_after_advances: Option<u32>,
    polls: u32,
    advances: u32,
}

impl DuelSim {
    fn begin(&mut self) {
        self.started = true;
        self.active = false;
        self.polls = 0;
        self.advances = 0;
    }

    fn poll(&mut self) -> bool {
        if self.active {
            return true;
        }
        if !self.started {
            return false;
        }
        if let Some(n) = self.activate_after_polls {
            self.polls += 1;
            if self.polls >= n {
                self.active = true;
            }
        }
        self.active
    }

    fn advance(&mut self) {
        if !self.active {
            return;
        }
        if let Some(n) = self.deactivate_after_advances {
            self.advances += 1;
            if self.advances >= n {
                // Finished for good until the next retry_duel.
                self.active = false;
                self.started = false;
            }
        }
    }
}

impl Default for DuelSim {
    fn default() -> Self {
        Self {
            started: false,
            active: false,
            activate_after_polls: None,
            deactivate_after_advances: None,
            polls: 0,
            advances: 0,
        }
    }
}

struct State {
    attached: Script<bool>,
    reattach: Script<bool>,
    clean: Script<bool>,
    instant_win: Script<bool>,
    /// Skip-call codes per chapter; `None` entries simulate transport loss.
    skip_codes: HashMap<ChapterId, Script<Option<i64>>>,
    skip_default: Option<i64>,
    /// Deck-probe codes per chapter; missing entries answer `probe_default`.
    probe_codes: HashMap<ChapterId, Option<i64>>,
    probe_default: Option<i64>,
    retry_results: HashMap<ChapterId, bool>,
    duel: DuelSim,
    calls: Vec<String>,
}

/// Scripted test double for [`GameBridge`].
///
/// Defaults: attached, reattach/clean/instant-win succeed, skip and probe
/// are rejected with code 1 (story-shaped), duels start but never activate.
/// Every call is appended to a log that tests assert against.
pub struct FakeBridge {
    state: Mutex<State>,
}

impl Default for FakeBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBridge {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                attached: Script::new(true),
                reattach: Script::new(true),
                clean: Script::new(true),
                instant_win: Script::new(true),
                skip_codes: HashMap::new(),
                skip_default: Some(1),
                probe_codes: HashMap::new(),
                probe_default: Some(1),
                retry_results: HashMap::new(),
                duel: DuelSim::default(),
                calls: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn script_attached(&self, seq: &[bool], default: bool) {
        let mut s = self.lock();
        s.attached = Script::new(default);
        s.attached.push_all(seq);
    }

    pub fn script_reattach(&self, seq: &[bool], default: bool) {
        let mut s = self.lock();
        s.reattach = Script::new(default);
        s.reattach.push_all(seq);
    }

    pub fn script_clean(&self, seq: &[bool], default: bool) {
        let mut s = self.lock();
        s.clean = Script::new(default);
        s.clean.push_all(seq);
    }

    pub fn script_instant_win(&self, seq: &[bool], default: bool) {
        let mut s = self.lock();
        s.instant_win = Script::new(default);
        s.instant_win.push_all(seq);
    }

    /// Answer every skip call for `chapter` with `code` (`None` = transport
    /// failure).
    pub fn set_skip_code(&self, chapter: ChapterId, code: Option<i64>) {
        self.lock().skip_codes.insert(chapter, Script::new(code));
    }

    pub fn set_probe_code(&self, chapter: ChapterId, code: Option<i64>) {
        self.lock().probe_codes.insert(chapter, code);
    }

    pub fn set_retry_result(&self, chapter: ChapterId, ok: bool) {
        self.lock().retry_results.insert(chapter, ok);
    }

    /// Configure the simulated duel engine for subsequently started duels.
    pub fn set_duel_script(
        &self,
        activate_after_polls: Option<u32>,
        deactivate_after_advances: Option<u32>,
    ) {
        let mut s = self.lock();
        s.duel.activate_after_polls = activate_after_polls;
        s.duel.deactivate_after_advances = deactivate_after_advances;
    }

    pub fn count_calls(&self, entry: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == entry).count()
    }

    fn log(&self, entry: impl Into<String>) {
        self.lock().calls.push(entry.into());
    }

    fn response(code: i64) -> ApiResponse {
        ApiResponse {
            code,
            payload: serde_json::Value::Null,
        }
    }
}

#[async_trait]
impl GameBridge for FakeBridge {
    async fn is_attached(&self) -> bool {
        let mut s = self.lock();
        s.calls.push("is_attached".into());
        s.attached.next()
    }

    async fn reattach(&self) -> bool {
        let mut s = self.lock();
        s.calls.push("reattach".into());
        s.reattach.next()
    }

    async fn call_with_result(&self, method: &str, arg: Option<i64>) -> Option<ApiResponse> {
        let mut s = self.lock();
        match arg {
            Some(a) => s.calls.push(format!("{method}({a})")),
            None => s.calls.push(format!("{method}()")),
        }
        if method == methods::SOLO_SKIP {
            let chapter = ChapterId::new(arg.unwrap_or(0) as u32);
            let default = s.skip_default;
            let code = s
                .skip_codes
                .entry(chapter)
                .or_insert_with(|| Script::new(default))
                .next();
            return code.map(Self::response);
        }
        Some(Self::response(0))
    }

    async fn call_fire_and_forget(&self, method: &str, arg: Option<i64>) {
        match arg {
            Some(a) => self.log(format!("{method}({a})")),
            None => self.log(format!("{method}()")),
        }
    }

    async fn call_two_args(&self, method: &str, arg1: i64, arg2: i64) -> Option<ApiResponse> {
        let mut s = self.lock();
        s.calls.push(format!("{method}({arg1},{arg2})"));
        if method == methods::SOLO_SET_USE_DECK_TYPE {
            let chapter = ChapterId::new(arg1 as u32);
            let code = s
                .probe_codes
                .get(&chapter)
                .copied()
                .unwrap_or(s.probe_default);
            return code.map(Self::response);
        }
        Some(Self::response(0))
    }

    async fn is_duel_active(&self) -> bool {
        self.lock().duel.poll()
    }

    async fn instant_win(&self) -> bool {
        let mut s = self.lock();
        s.calls.push("instant_win".into());
        s.instant_win.next()
    }

    async fn advance_duel_end(&self) -> bool {
        let mut s = self.lock();
        s.calls.push("advance_duel_end".into());
        s.duel.advance();
        true
    }

    async fn dismiss_dialogs(&self) -> bool {
        self.log("dismiss_dialogs");
        true
    }

    async fn clean_vc_stack(&self) -> bool {
        let mut s = self.lock();
        s.calls.push("clean_vc_stack".into());
        s.clean.next()
    }

    async fn force_reboot(&self) -> bool {
        self.log("force_reboot");
        true
    }

    async fn set_time_scale(&self, scale: f64) -> bool {
        self.log(format!("set_time_scale({scale})"));
        true
    }

    async fn hook_result_screens(&self) -> bool {
        self.log("hook_result_screens");
        true
    }

    async fn retry_duel(&self, chapter: ChapterId, is_rental: bool) -> bool {
        let mut s = self.lock();
        s.calls.push(format!("retry_duel({chapter},{is_rental})"));
        let ok = s.retry_results.get(&chapter).copied().unwrap_or(true);
        if ok {
            s.duel.begin();
        }
        ok
    }
}
