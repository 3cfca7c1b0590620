use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use drill_core::model::{MistakeRecord, WordCardDraft};

/// Errors surfaced by ledger store adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── LEDGER RECORD ─────────────────────────────────────────────────────────────
//

/// Persisted shape of one mistake record.
///
/// Mirrors the domain `MistakeRecord` field by field so stores can
/// serialize without leaking storage concerns into the domain layer.
/// Deserialized payloads are re-validated on the way back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub word: String,
    pub phonetic: String,
    pub meaning: String,
    pub options: Vec<String>,
    pub mnemonic: String,
    pub sentence: String,
    pub sentence_translation: String,
    pub added_at: DateTime<Utc>,
    pub streak: u8,
}

impl LedgerRecord {
    #[must_use]
    pub fn from_record(record: &MistakeRecord) -> Self {
        let card = record.card();
        Self {
            word: card.word().to_owned(),
            phonetic: card.phonetic().to_owned(),
            meaning: card.meaning().to_owned(),
            options: card.options().to_vec(),
            mnemonic: card.mnemonic().to_owned(),
            sentence: card.sentence().to_owned(),
            sentence_translation: card.sentence_translation().to_owned(),
            added_at: record.added_at(),
            streak: record.streak(),
        }
    }

    /// Convert the persisted shape back into a domain record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored card no longer
    /// passes draft validation (e.g. a corrupted options array).
    pub fn into_record(self) -> Result<MistakeRecord, StorageError> {
        let card = WordCardDraft {
            word: self.word,
            phonetic: self.phonetic,
            meaning: self.meaning,
            options: self.options,
            mnemonic: self.mnemonic,
            sentence: self.sentence,
            sentence_translation: self.sentence_translation,
        }
        .validate()
        .map_err(|err| StorageError::Serialization(err.to_string()))?;

        Ok(MistakeRecord::from_parts(card, self.added_at, self.streak))
    }
}

/// Serialize a ledger snapshot to its JSON payload.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_ledger(records: &[MistakeRecord]) -> Result<String, StorageError> {
    let rows: Vec<LedgerRecord> = records.iter().map(LedgerRecord::from_record).collect();
    serde_json::to_string(&rows).map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Parse a JSON payload back into domain records, preserving order.
///
/// # Errors
///
/// Returns `StorageError::Serialization` on malformed JSON or on records
/// that fail re-validation.
pub fn decode_ledger(payload: &str) -> Result<Vec<MistakeRecord>, StorageError> {
    let rows: Vec<LedgerRecord> =
        serde_json::from_str(payload).map_err(|err| StorageError::Serialization(err.to_string()))?;
    rows.into_iter().map(LedgerRecord::into_record).collect()
}

//
// ─── STORE CONTRACT ────────────────────────────────────────────────────────────
//

/// Durable home for the mistake ledger.
///
/// The whole ledger lives under a single well-known key and is replaced
/// wholesale on every save; there is no partial update. `load` returns
/// `None` when nothing has been saved yet.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Read the last saved ledger, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the payload cannot be read or parsed.
    async fn load(&self) -> Result<Option<Vec<MistakeRecord>>, StorageError>;

    /// Replace the saved ledger with this snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn save(&self, records: &[MistakeRecord]) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY STORE ───────────────────────────────────────────────────────────
//

/// In-memory store for testing and prototyping.
///
/// Snapshots pass through the same serialization as durable adapters, and
/// saves can be made to fail on demand to exercise best-effort callers.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    payload: Arc<Mutex<Option<String>>>,
    fail_saves: Arc<AtomicBool>,
    save_count: Arc<AtomicUsize>,
}

impl InMemoryLedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail with a connection error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn load(&self) -> Result<Option<Vec<MistakeRecord>>, StorageError> {
        let guard = self
            .payload
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.as_deref() {
            Some(payload) => decode_ledger(payload).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, records: &[MistakeRecord]) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("simulated write failure".into()));
        }
        let payload = encode_ledger(records)?;
        let mut guard = self
            .payload
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(payload);
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::{MASTERY_THRESHOLD, WordCard};

    fn card(word: &str) -> WordCard {
        WordCardDraft {
            word: word.into(),
            phonetic: "/tɛst/".into(),
            meaning: "对".into(),
            options: vec!["对".into(), "b".into(), "c".into(), "d".into()],
            mnemonic: "m".into(),
            sentence: "s".into(),
            sentence_translation: "t".into(),
        }
        .validate()
        .unwrap()
    }

    fn records() -> Vec<MistakeRecord> {
        let now = drill_core::time::fixed_now();
        let mut second = MistakeRecord::new(card("b"), now);
        second.record_outcome(true);
        vec![MistakeRecord::new(card("a"), now), second]
    }

    #[test]
    fn payload_round_trip_preserves_order_and_fields() {
        let original = records();
        let payload = encode_ledger(&original).unwrap();
        let decoded = decode_ledger(&payload).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn corrupt_options_fail_decoding() {
        let mut row = LedgerRecord::from_record(&records()[0]);
        row.options.truncate(2);
        let payload = serde_json::to_string(&vec![row]).unwrap();

        let err = decode_ledger(&payload).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn oversized_streak_is_clamped_on_decode() {
        let mut row = LedgerRecord::from_record(&records()[0]);
        row.streak = 250;
        let payload = serde_json::to_string(&vec![row]).unwrap();

        let decoded = decode_ledger(&payload).unwrap();
        assert_eq!(decoded[0].streak(), MASTERY_THRESHOLD);
    }

    #[tokio::test]
    async fn in_memory_store_round_trips() {
        let store = InMemoryLedgerStore::new();
        assert!(store.load().await.unwrap().is_none());

        let original = records();
        store.save(&original).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(original));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn in_memory_store_can_simulate_failures() {
        let store = InMemoryLedgerStore::new();
        store.set_fail_saves(true);

        let err = store.save(&records()).await.unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
        assert!(store.load().await.unwrap().is_none());
    }
}
