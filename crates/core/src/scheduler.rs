use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::MistakeRecord;

/// Bounds for the randomized injection threshold, inclusive.
pub const THRESHOLD_MIN: u32 = 10;
pub const THRESHOLD_MAX: u32 = 20;

/// What to do after a regular-flow word completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Keep walking the regular batch.
    Continue,
    /// Show this ledger record before advancing the batch.
    InjectReview(MistakeRecord),
}

/// Decides when to interleave a missed word into the regular quiz stream.
///
/// Counts completed regular-flow words against a randomized threshold in
/// [`THRESHOLD_MIN`]..=[`THRESHOLD_MAX`]. When the counter reaches the
/// threshold and any ledger record is still unmastered, one eligible
/// record is picked uniformly at random, the counter resets, and a fresh
/// threshold is drawn. Review words themselves never feed the counter.
///
/// The RNG is owned and seedable so tests can pin the whole schedule.
#[derive(Debug)]
pub struct ReviewScheduler {
    words_since_review: u32,
    next_threshold: u32,
    rng: StdRng,
}

impl ReviewScheduler {
    /// Scheduler seeded from the thread RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_rng(&mut rand::rng()))
    }

    /// Deterministic scheduler for tests.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(mut rng: StdRng) -> Self {
        let next_threshold = rng.random_range(THRESHOLD_MIN..=THRESHOLD_MAX);
        Self {
            words_since_review: 0,
            next_threshold,
            rng,
        }
    }

    #[must_use]
    pub fn words_since_review(&self) -> u32 {
        self.words_since_review
    }

    #[must_use]
    pub fn next_threshold(&self) -> u32 {
        self.next_threshold
    }

    /// Account for one completed regular-flow word and decide whether the
    /// next question should be a review. Never called after a review word.
    pub fn on_word_completed(&mut self, eligible: &[MistakeRecord]) -> Decision {
        self.words_since_review += 1;

        if self.words_since_review < self.next_threshold || eligible.is_empty() {
            return Decision::Continue;
        }

        let pick = self.rng.random_range(0..eligible.len());
        self.words_since_review = 0;
        self.next_threshold = self.rng.random_range(THRESHOLD_MIN..=THRESHOLD_MAX);
        Decision::InjectReview(eligible[pick].clone())
    }
}

impl Default for ReviewScheduler {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
