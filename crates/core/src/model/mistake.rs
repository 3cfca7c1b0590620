use chrono::{DateTime, Utc};

use crate::model::WordCard;

/// Consecutive correct reviews after which a record counts as mastered.
pub const MASTERY_THRESHOLD: u8 = 3;

/// A missed word tracked in the mistake ledger.
///
/// Wraps the original card with the time it was missed and a streak of
/// consecutive correct review answers. The streak saturates at
/// [`MASTERY_THRESHOLD`]; a mastered record is excluded from review
/// selection but stays in the ledger until explicitly removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MistakeRecord {
    card: WordCard,
    added_at: DateTime<Utc>,
    streak: u8,
}

impl MistakeRecord {
    /// A fresh record for a just-missed card, streak at zero.
    #[must_use]
    pub fn new(card: WordCard, added_at: DateTime<Utc>) -> Self {
        Self {
            card,
            added_at,
            streak: 0,
        }
    }

    /// Rebuild a record from persisted fields. The streak is clamped into
    /// the valid range, so a corrupted payload cannot break the invariant.
    #[must_use]
    pub fn from_parts(card: WordCard, added_at: DateTime<Utc>, streak: u8) -> Self {
        Self {
            card,
            added_at,
            streak: streak.min(MASTERY_THRESHOLD),
        }
    }

    #[must_use]
    pub fn card(&self) -> &WordCard {
        &self.card
    }

    #[must_use]
    pub fn word(&self) -> &str {
        self.card.word()
    }

    #[must_use]
    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    #[must_use]
    pub fn streak(&self) -> u8 {
        self.streak
    }

    #[must_use]
    pub fn is_mastered(&self) -> bool {
        self.streak >= MASTERY_THRESHOLD
    }

    /// Record the outcome of one review answer: a correct answer extends
    /// the streak by exactly one (saturating at the threshold), a wrong
    /// answer resets it to zero.
    pub fn record_outcome(&mut self, correct: bool) {
        if correct {
            self.streak = (self.streak + 1).min(MASTERY_THRESHOLD);
        } else {
            self.streak = 0;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
