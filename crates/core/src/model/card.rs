use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of answer options a card must carry, the correct meaning included.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors rejecting a provider-supplied card draft.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("card field `{0}` is blank")]
    BlankField(&'static str),

    #[error("expected {OPTION_COUNT} answer options, got {0}")]
    WrongOptionCount(usize),

    #[error("duplicate answer option: {0}")]
    DuplicateOption(String),

    #[error("options do not contain the correct meaning")]
    MeaningNotInOptions,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated card shape as emitted by the content provider.
///
/// This is the JSON contract with the generative backend; nothing in it is
/// trusted until `validate` has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCardDraft {
    pub word: String,
    pub phonetic: String,
    pub meaning: String,
    pub options: Vec<String>,
    pub mnemonic: String,
    pub sentence: String,
    pub sentence_translation: String,
}

impl WordCardDraft {
    /// Validate the draft into a `WordCard`.
    ///
    /// # Errors
    ///
    /// Returns `CardError` when the word or meaning is blank, the option
    /// count is not exactly [`OPTION_COUNT`], an option repeats, or the
    /// correct meaning is missing from the options.
    pub fn validate(self) -> Result<WordCard, CardError> {
        if self.word.trim().is_empty() {
            return Err(CardError::BlankField("word"));
        }
        if self.meaning.trim().is_empty() {
            return Err(CardError::BlankField("meaning"));
        }

        if self.options.len() != OPTION_COUNT {
            return Err(CardError::WrongOptionCount(self.options.len()));
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.as_str()) {
                return Err(CardError::DuplicateOption(option.clone()));
            }
        }

        if !self.options.contains(&self.meaning) {
            return Err(CardError::MeaningNotInOptions);
        }

        Ok(WordCard {
            word: self.word,
            phonetic: self.phonetic,
            meaning: self.meaning,
            options: self.options,
            mnemonic: self.mnemonic,
            sentence: self.sentence,
            sentence_translation: self.sentence_translation,
        })
    }
}

//
// ─── WORD CARD ─────────────────────────────────────────────────────────────────
//

/// Immutable content unit for one drilled word.
///
/// A `WordCard` can only be built through [`WordCardDraft::validate`], so a
/// card in circulation always carries exactly [`OPTION_COUNT`] distinct
/// options, the correct meaning among them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCard {
    word: String,
    phonetic: String,
    meaning: String,
    options: Vec<String>,
    mnemonic: String,
    sentence: String,
    sentence_translation: String,
}

impl WordCard {
    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn phonetic(&self) -> &str {
        &self.phonetic
    }

    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    /// Answer options in provider order. Never display this order directly;
    /// use [`shuffled_options`](Self::shuffled_options).
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    #[must_use]
    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    #[must_use]
    pub fn sentence_translation(&self) -> &str {
        &self.sentence_translation
    }

    /// Whether the submitted option is the correct meaning.
    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.meaning == option
    }

    /// The options in randomized presentation order.
    ///
    /// The provider's own ordering is not trusted (it tends to put the
    /// correct meaning first), so every presentation draws a fresh order.
    #[must_use]
    pub fn shuffled_options(&self, rng: &mut impl Rng) -> Vec<String> {
        let mut options = self.options.clone();
        options.shuffle(rng);
        options
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
