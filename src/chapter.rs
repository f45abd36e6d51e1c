//! Chapter identity, gate grouping, outcomes, and chapter-list loading.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::errors::RunError;

/// Chapters are grouped into gates by integer division; consecutive chapters
/// in the same gate skip the gate-entry call.
pub const GATE_DIVISOR: u32 = 10_000;

/// Opaque identifier for one solo chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(u32);

impl ChapterId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Gate this chapter belongs to (e.g. 30009 -> 3, 710001 -> 71).
    pub fn gate(self) -> GateId {
        GateId(self.0 / GATE_DIVISOR)
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse chapter grouping sharing one session-context switch cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GateId(u32);

impl GateId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal result of one chapter attempt.
///
/// `Won` and `Skipped` are terminal-success and are never re-attempted;
/// `Failed` chapters are retried on a later run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    Skipped,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Won => "won",
            Outcome::Skipped => "skipped",
            Outcome::Failed => "failed",
        }
    }

    pub fn is_terminal_success(self) -> bool {
        matches!(self, Outcome::Won | Outcome::Skipped)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown outcome '{0}'")]
pub struct ParseOutcomeError(String);

impl FromStr for Outcome {
    type Err = ParseOutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "won" => Ok(Outcome::Won),
            "skipped" => Ok(Outcome::Skipped),
            "failed" => Ok(Outcome::Failed),
            other => Err(ParseOutcomeError(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct ChapterFile {
    chapters: Vec<ChapterId>,
}

/// Load the ordered chapter list from its JSON file.
///
/// The file is the static job source: `{"chapters": [30009, 30010, ...]}`.
pub fn load_chapters(path: &Path) -> Result<Vec<ChapterId>, RunError> {
    if !path.exists() {
        return Err(RunError::ChapterListMissing {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path).map_err(|source| RunError::ChapterListUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ChapterFile =
        serde_json::from_str(&raw).map_err(|source| RunError::ChapterListInvalid {
            path: path.to_path_buf(),
            source,
        })?;
    if file.chapters.is_empty() {
        return Err(RunError::ChapterListEmpty {
            path: path.to_path_buf(),
        });
    }
    info!(count = file.chapters.len(), "loaded chapter list");
    Ok(file.chapters)
}
