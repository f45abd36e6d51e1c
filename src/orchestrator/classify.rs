//! Cheap duel-vs-story classification for a chapter.

use std::sync::Arc;

use tracing::info;

use crate::bridge::{GameBridge, methods};
use crate::chapter::ChapterId;

/// What a chapter needs in order to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterKind {
    /// Requires a full interactive duel session.
    Duel,
    /// Story/dialog content, resolvable by a skip call.
    Story,
}

/// One-shot classifier probing whether a chapter accepts a deck.
pub struct ChapterClassifier {
    bridge: Arc<dyn GameBridge>,
}

impl ChapterClassifier {
    pub fn new(bridge: Arc<dyn GameBridge>) -> Self {
        Self { bridge }
    }

    /// Probe the chapter type without mutating durable game state.
    ///
    /// Only duel chapters accept a deck-type configuration, so an accepted
    /// call classifies as `Duel`. A rejection or a transport failure both
    /// classify as `Story`: a false Story is safe because the runner falls
    /// back to skip-then-move-on, which can never produce a false win.
    /// Never retried.
    pub async fn probe(&self, chapter: ChapterId) -> ChapterKind {
        let reply = self
            .bridge
            .call_two_args(methods::SOLO_SET_USE_DECK_TYPE, i64::from(chapter.get()), 1)
            .await;
        match reply {
            Some(reply) if reply.accepted() => {
                info!(%chapter, "duel chapter (deck type accepted)");
                ChapterKind::Duel
            }
            Some(reply) => {
                info!(%chapter, code = reply.code, "story chapter");
                ChapterKind::Story
            }
            None => {
                info!(%chapter, "story chapter (probe transport failure)");
                ChapterKind::Story
            }
        }
    }
}
