use std::sync::Arc;

use tokio::task::JoinHandle;

use drill_core::model::WordCard;

use crate::content::ContentProvider;
use crate::error::ProviderError;

/// Single-slot prefetch for word-card batches.
///
/// At most one fetch is ever in flight: `begin` while the slot is occupied
/// reuses the outstanding fetch instead of issuing a duplicate, and `take`
/// consumes the slot at most once. There is no cancellation; an issued
/// fetch runs to completion or failure, and an unconsumed result is simply
/// discarded when the slot is dropped or retaken.
#[derive(Default)]
pub struct BatchPrefetcher {
    slot: Option<JoinHandle<Result<Vec<WordCard>, ProviderError>>>,
}

impl BatchPrefetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Start a background fetch unless one is already outstanding.
    pub fn begin(&mut self, provider: &Arc<dyn ContentProvider>) {
        if self.slot.is_some() {
            return;
        }
        let provider = Arc::clone(provider);
        self.slot = Some(tokio::spawn(async move { provider.fetch_batch().await }));
    }

    /// Consume the slot, awaiting the in-flight fetch if there is one.
    ///
    /// Returns `None` when no prefetch was outstanding.
    pub async fn take(&mut self) -> Option<Result<Vec<WordCard>, ProviderError>> {
        let handle = self.slot.take()?;
        match handle.await {
            Ok(result) => Some(result),
            Err(err) => Some(Err(ProviderError::TaskFailed(err.to_string()))),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use drill_core::model::WordCardDraft;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentProvider for CountingProvider {
        async fn fetch_batch(&self) -> Result<Vec<WordCard>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let card = WordCardDraft {
                word: "prefetch".into(),
                phonetic: String::new(),
                meaning: "预取".into(),
                options: vec!["预取".into(), "b".into(), "c".into(), "d".into()],
                mnemonic: String::new(),
                sentence: String::new(),
                sentence_translation: String::new(),
            }
            .validate()?;
            Ok(vec![card])
        }
    }

    #[tokio::test]
    async fn second_begin_reuses_the_outstanding_fetch() {
        let counting = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let provider: Arc<dyn ContentProvider> = counting.clone();
        let mut prefetch = BatchPrefetcher::new();

        prefetch.begin(&provider);
        prefetch.begin(&provider);
        assert!(prefetch.is_pending());

        let batch = prefetch.take().await.unwrap().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slot_is_consumed_at_most_once() {
        let provider: Arc<dyn ContentProvider> = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let mut prefetch = BatchPrefetcher::new();

        prefetch.begin(&provider);
        assert!(prefetch.take().await.is_some());
        assert!(!prefetch.is_pending());
        assert!(prefetch.take().await.is_none());
    }
}
