use std::sync::Arc;

use chrono::{DateTime, Utc};

use drill_core::ledger::MistakeLedger;
use drill_core::model::{MistakeRecord, WordCard};
use storage::repository::LedgerStore;

/// The mistake notebook: an in-memory ledger written through to a store.
///
/// Loaded once at startup; after that the ledger is the source of truth
/// and every mutation is followed by a full save, in mutation order.
/// Persistence is best-effort: a failed read or write is logged and the
/// book keeps operating in-memory.
pub struct MistakeBook {
    ledger: MistakeLedger,
    store: Arc<dyn LedgerStore>,
}

impl MistakeBook {
    /// Load the saved ledger from the store, or start empty when nothing
    /// was saved yet or the read fails.
    pub async fn load(store: Arc<dyn LedgerStore>) -> Self {
        let ledger = match store.load().await {
            Ok(Some(records)) => MistakeLedger::from_records(records),
            Ok(None) => MistakeLedger::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load mistake ledger, starting empty");
                MistakeLedger::new()
            }
        };
        Self { ledger, store }
    }

    #[must_use]
    pub fn records(&self) -> &[MistakeRecord] {
        self.ledger.records()
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.ledger.contains(word)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    /// Records still below the mastery threshold, in ledger order.
    #[must_use]
    pub fn eligible_for_review(&self) -> Vec<MistakeRecord> {
        self.ledger.eligible_for_review()
    }

    /// Add a missed card to the front of the notebook. A no-op if the
    /// word is already present. Returns whether the notebook changed.
    pub async fn add(&mut self, card: WordCard, now: DateTime<Utc>) -> bool {
        let changed = self.ledger.add(card, now);
        if changed {
            self.persist().await;
        }
        changed
    }

    /// Remove the record for `word`, if present.
    pub async fn remove(&mut self, word: &str) -> bool {
        let changed = self.ledger.remove(word);
        if changed {
            self.persist().await;
        }
        changed
    }

    /// Record a review outcome for `word`: correct extends the streak,
    /// wrong resets it. No effect if the word is not tracked.
    pub async fn record_review_outcome(&mut self, word: &str, correct: bool) -> bool {
        let changed = self.ledger.record_review_outcome(word, correct);
        if changed {
            self.persist().await;
        }
        changed
    }

    async fn persist(&self) {
        if let Err(err) = self.store.save(self.ledger.records()).await {
            tracing::warn!(error = %err, "failed to persist mistake ledger");
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::WordCardDraft;
    use drill_core::time::fixed_now;
    use storage::repository::InMemoryLedgerStore;

    fn card(word: &str) -> WordCard {
        WordCardDraft {
            word: word.into(),
            phonetic: String::new(),
            meaning: "对".into(),
            options: vec!["对".into(), "b".into(), "c".into(), "d".into()],
            mnemonic: String::new(),
            sentence: String::new(),
            sentence_translation: String::new(),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn every_mutation_writes_through() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let mut book = MistakeBook::load(store.clone()).await;

        book.add(card("one"), fixed_now()).await;
        book.add(card("two"), fixed_now()).await;
        book.record_review_outcome("one", true).await;
        book.remove("two").await;
        assert_eq!(store.save_count(), 4);

        let saved = store.load().await.unwrap().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].word(), "one");
        assert_eq!(saved[0].streak(), 1);
    }

    #[tokio::test]
    async fn noop_mutations_do_not_save() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let mut book = MistakeBook::load(store.clone()).await;

        book.add(card("one"), fixed_now()).await;
        assert_eq!(store.save_count(), 1);

        book.add(card("one"), fixed_now()).await;
        book.remove("absent").await;
        book.record_review_outcome("absent", true).await;
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn write_failures_keep_the_book_usable() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let mut book = MistakeBook::load(store.clone()).await;
        store.set_fail_saves(true);

        assert!(book.add(card("one"), fixed_now()).await);
        assert!(book.contains("one"));
        assert_eq!(store.save_count(), 0);

        // Once the store recovers, the next mutation saves the full state.
        store.set_fail_saves(false);
        book.add(card("two"), fixed_now()).await;
        let saved = store.load().await.unwrap().unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[tokio::test]
    async fn loads_previously_saved_ledger() {
        let store = Arc::new(InMemoryLedgerStore::new());
        {
            let mut book = MistakeBook::load(store.clone()).await;
            book.add(card("kept"), fixed_now()).await;
        }

        let book = MistakeBook::load(store).await;
        assert_eq!(book.len(), 1);
        assert!(book.contains("kept"));
    }
}
