mod classify;
mod duel;
mod recovery;
mod runner;
mod status;

pub use classify::{ChapterClassifier, ChapterKind};
pub use duel::DuelExecutor;
pub use recovery::{Recovery, RecoveryManager};
pub use runner::{RunSummary, SoloRunner, StopReason};
pub use status::{RunStatus, StatusSnapshot};
