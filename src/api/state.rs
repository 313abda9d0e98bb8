//! Shared API state: the agent and the latest-result slot.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::types::AskResponse;
use crate::agent::Agent;

/// State shared across request handlers.
pub struct AppState {
    pub agent: Agent,
    pub results: ResultSlot,
}

/// The single "latest result" slot the page re-reads.
///
/// Each submission obtains a generation from [`begin`](ResultSlot::begin),
/// which also clears the previous result, and may only publish through
/// [`commit`](ResultSlot::commit). A commit from a superseded generation is
/// discarded, so a stale in-flight chain can never overwrite a newer
/// submission's result.
#[derive(Default)]
pub struct ResultSlot {
    generation: AtomicU64,
    slot: RwLock<Option<(u64, AskResponse)>>,
}

impl ResultSlot {
    /// Start a new submission: clear the prior result and return this
    /// submission's generation.
    pub async fn begin(&self) -> u64 {
        // The write lock is held across the bump so a slower, earlier
        // begin() cannot clear a result committed after it.
        let mut slot = self.slot.write().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *slot = None;
        generation
    }

    /// Publish a submission's result. Returns false (and stores nothing)
    /// if a newer submission has begun since.
    pub async fn commit(&self, generation: u64, result: AskResponse) -> bool {
        let mut slot = self.slot.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *slot = Some((generation, result));
        true
    }

    /// The latest committed result, if any.
    pub async fn latest(&self) -> Option<AskResponse> {
        self.slot
            .read()
            .await
            .as_ref()
            .map(|(_, result)| result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> AskResponse {
        AskResponse {
            answer: Some(text.to_string()),
            weather: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_current_generation() {
        let slot = ResultSlot::default();

        let generation = slot.begin().await;
        assert!(slot.commit(generation, answer("first")).await);

        let latest = slot.latest().await.expect("latest result");
        assert_eq!(latest.answer.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_stale_commit_is_discarded() {
        let slot = ResultSlot::default();

        let stale = slot.begin().await;
        let current = slot.begin().await;

        assert!(slot.commit(current, answer("current")).await);
        assert!(!slot.commit(stale, answer("stale")).await);

        let latest = slot.latest().await.expect("latest result");
        assert_eq!(latest.answer.as_deref(), Some("current"));
    }

    #[tokio::test]
    async fn test_begin_clears_prior_result() {
        let slot = ResultSlot::default();

        let generation = slot.begin().await;
        slot.commit(generation, answer("old")).await;

        slot.begin().await;
        assert!(slot.latest().await.is_none());
    }
}
