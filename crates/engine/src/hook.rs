//! Entry point for save events coming from the host content system.

use serde::Serialize;

use postbell_common::types::{ArticleStatus, ContentSaved};

use crate::scheduler::DebounceScheduler;

/// What a save event did to the article's pending notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SaveDecision {
    /// Published save: the quiet period (re)started.
    Armed { generation: u64 },
    /// The article left the published state; any pending notification was dropped.
    Cancelled { had_pending: bool },
    /// Revision records never touch the schedule.
    Ignored,
}

impl DebounceScheduler {
    /// Route a save event: arm on a published save, cancel when the article
    /// is no longer published, ignore revision records.
    pub fn on_content_saved(&self, event: &ContentSaved) -> SaveDecision {
        if event.is_revision || event.status == ArticleStatus::Revision {
            tracing::trace!(article_id = %event.article_id, "Revision save ignored");
            return SaveDecision::Ignored;
        }

        match event.status {
            ArticleStatus::Published => SaveDecision::Armed {
                generation: self.arm(event.article_id),
            },
            _ => SaveDecision::Cancelled {
                had_pending: self.cancel(event.article_id),
            },
        }
    }
}
