use chrono::{DateTime, Utc};

use crate::model::{MistakeRecord, WordCard};

/// Ordered collection of missed words, keyed uniquely by the word itself.
///
/// Newly missed words go to the front so the notebook reads
/// most-recent-first. The ledger is pure in-memory state; the services
/// layer writes it through to a store after every mutation, which is why
/// the mutators report whether anything actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MistakeLedger {
    records: Vec<MistakeRecord>,
}

impl MistakeLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted records, preserving order. Should a
    /// payload ever contain the same word twice, only the first occurrence
    /// is kept.
    #[must_use]
    pub fn from_records(records: Vec<MistakeRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            if !ledger.contains(record.word()) {
                ledger.records.push(record);
            }
        }
        ledger
    }

    #[must_use]
    pub fn records(&self) -> &[MistakeRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.records.iter().any(|r| r.word() == word)
    }

    #[must_use]
    pub fn get(&self, word: &str) -> Option<&MistakeRecord> {
        self.records.iter().find(|r| r.word() == word)
    }

    /// Insert a fresh record for the card at the front of the ledger.
    ///
    /// Adding a word that is already present is a no-op: the existing
    /// record keeps its timestamp and streak. Returns whether the ledger
    /// changed.
    pub fn add(&mut self, card: WordCard, now: DateTime<Utc>) -> bool {
        if self.contains(card.word()) {
            return false;
        }
        self.records.insert(0, MistakeRecord::new(card, now));
        true
    }

    /// Delete the record for `word`, if present. Returns whether the
    /// ledger changed.
    pub fn remove(&mut self, word: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.word() != word);
        self.records.len() != before
    }

    /// Apply a review outcome to the record for `word`: correct extends the
    /// streak, wrong resets it. No effect if the word is not present.
    /// Returns whether the ledger changed.
    pub fn record_review_outcome(&mut self, word: &str, correct: bool) -> bool {
        match self.records.iter_mut().find(|r| r.word() == word) {
            Some(record) => {
                record.record_outcome(correct);
                true
            }
            None => false,
        }
    }

    /// Records still below the mastery threshold, in ledger order. These
    /// are the candidates for review injection.
    #[must_use]
    pub fn eligible_for_review(&self) -> Vec<MistakeRecord> {
        self.records
            .iter()
            .filter(|r| !r.is_mastered())
            .cloned()
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MASTERY_THRESHOLD, WordCardDraft};

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

    #[test]
    fn adds_to_front() {
        let mut ledger = MistakeLedger::new();
        assert!(ledger.add(card("first"), Utc::now()));
        assert!(ledger.add(card("second"), Utc::now()));

        let words: Vec<_> = ledger.records().iter().map(MistakeRecord::word).collect();
        assert_eq!(words, ["second", "first"]);
    }

    #[test]
    fn duplicate_add_is_a_noop() {
        let mut ledger = MistakeLedger::new();
        let added_at = Utc::now();
        ledger.add(card("word"), added_at);
        ledger.record_review_outcome("word", true);

        assert!(!ledger.add(card("word"), added_at + chrono::Duration::hours(1)));
        assert_eq!(ledger.len(), 1);
        // Timestamp and streak of the existing record are untouched.
        assert_eq!(ledger.get("word").unwrap().added_at(), added_at);
        assert_eq!(ledger.get("word").unwrap().streak(), 1);
    }

    #[test]
    fn remove_missing_word_is_a_noop() {
        let mut ledger = MistakeLedger::new();
        ledger.add(card("kept"), Utc::now());

        assert!(!ledger.remove("absent"));
        assert!(ledger.remove("kept"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn outcome_for_missing_word_changes_nothing() {
        let mut ledger = MistakeLedger::new();
        assert!(!ledger.record_review_outcome("ghost", true));
    }

    #[test]
    fn mastered_records_leave_eligibility_but_stay_listed() {
        let mut ledger = MistakeLedger::new();
        ledger.add(card("easy"), Utc::now());
        ledger.add(card("hard"), Utc::now());

        for _ in 0..MASTERY_THRESHOLD {
            ledger.record_review_outcome("easy", true);
        }

        let eligible = ledger.eligible_for_review();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].word(), "hard");
        // Still visible in the notebook.
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("easy"));
    }

    #[test]
    fn from_records_drops_duplicate_words() {
        let now = Utc::now();
        let records = vec![
            MistakeRecord::new(card("a"), now),
            MistakeRecord::new(card("b"), now),
            MistakeRecord::new(card("a"), now),
        ];
        let ledger = MistakeLedger::from_records(records);
        assert_eq!(ledger.len(), 2);
    }
}
