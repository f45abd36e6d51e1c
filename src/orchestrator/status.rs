//! Observable run status for presentation layers.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::Serialize;

use crate::chapter::{ChapterId, Outcome};

/// Live status of a run, mutated only by the runner.
///
/// Every counter is a single-field atomic write; readers may observe torn
/// combinations across fields (e.g. a new chapter id with the previous phase
/// string). That is acceptable by contract: this surface is display-only and
/// never feeds control decisions.
#[derive(Debug, Default)]
pub struct RunStatus {
    running: AtomicBool,
    /// 0 means no chapter is being processed.
    current_chapter: AtomicU32,
    won: AtomicU32,
    failed: AtomicU32,
    skipped: AtomicU32,
    total: AtomicU32,
    done: AtomicU32,
    prior_done: AtomicU32,
    phase: Mutex<String>,
}

/// Owned point-in-time copy of [`RunStatus`] for presenters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub current_chapter: Option<ChapterId>,
    pub phase: String,
    pub won: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total: u32,
    pub done: u32,
    pub prior_done: u32,
}

impl RunStatus {
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    pub fn set_current_chapter(&self, chapter: Option<ChapterId>) {
        self.current_chapter
            .store(chapter.map_or(0, ChapterId::get), Ordering::Relaxed);
    }

    pub fn set_phase(&self, phase: impl Into<String>) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = phase.into();
    }

    /// Seed the totals at run start from the chapter list and the ledger.
    ///
    /// `done` starts at `prior_done`; the skipped counter is seeded with the
    /// prior runs' skip count so the display carries across restarts.
    pub fn seed(&self, total: u32, prior_done: u32, prior_skipped: u32) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(prior_done, Ordering::Relaxed);
        self.prior_done.store(prior_done, Ordering::Relaxed);
        self.skipped.store(prior_skipped, Ordering::Relaxed);
    }

    pub fn record(&self, outcome: Outcome) {
        match outcome {
            Outcome::Won => {
                self.won.fetch_add(1, Ordering::Relaxed);
                self.done.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                self.done.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let raw_chapter = self.current_chapter.load(Ordering::Relaxed);
        StatusSnapshot {
            running: self.running.load(Ordering::Relaxed),
            current_chapter: (raw_chapter != 0).then(|| ChapterId::new(raw_chapter)),
            phase: self
                .phase
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            won: self.won.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            done: self.done.load(Ordering::Relaxed),
            prior_done: self.prior_done.load(Ordering::Relaxed),
        }
    }
}
