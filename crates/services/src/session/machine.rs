use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use drill_core::model::{MistakeRecord, WordCard};
use drill_core::scheduler::{Decision, ReviewScheduler};
use drill_core::Clock;

use crate::content::ContentProvider;
use crate::error::ProviderError;
use crate::mistake_book::MistakeBook;
use crate::prefetch::BatchPrefetcher;
use crate::session::attempt::AnswerAttempt;
use crate::session::progress::DrillProgress;

//
// ─── STATES & EVENTS ───────────────────────────────────────────────────────────
//

/// Lifecycle states of the drill session.
///
/// The second-chance wait is a sub-state of `Presenting`, carried by the
/// attempt's tried-wrong set rather than a separate variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    LoadingBatch,
    Presenting,
    ShowingResult,
    ViewingLedger,
}

/// What a submitted option amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The meaning was hit; the reward reveal is now pending.
    Correct,
    /// First miss; the option is disabled and one more guess is open.
    SecondChance,
    /// Second miss; the card is scored as missed.
    Incorrect,
}

/// The card on display in `ShowingResult`.
#[derive(Debug, Clone)]
pub struct ShownCard {
    card: WordCard,
    selection: String,
    correct: bool,
    was_review: bool,
}

impl ShownCard {
    #[must_use]
    pub fn card(&self) -> &WordCard {
        &self.card
    }

    #[must_use]
    pub fn selection(&self) -> &str {
        &self.selection
    }

    #[must_use]
    pub fn correct(&self) -> bool {
        self.correct
    }

    #[must_use]
    pub fn was_review(&self) -> bool {
        self.was_review
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Event-driven state machine for one drill session.
///
/// Owns the current batch, the active review record, the mistake book,
/// and the review scheduler. All methods are driven by discrete user or
/// timer events; the only suspension points are provider fetches and
/// ledger write-through. Batch-load failures drop the machine back to
/// `Idle` and are returned to the caller; nothing here retries.
pub struct DrillSession {
    state: SessionState,
    batch: Vec<WordCard>,
    index: usize,
    active_review: Option<MistakeRecord>,
    attempt: Option<AnswerAttempt>,
    shown: Option<ShownCard>,
    scheduler: ReviewScheduler,
    book: MistakeBook,
    provider: Arc<dyn ContentProvider>,
    prefetch: BatchPrefetcher,
    clock: Clock,
    rng: StdRng,
    progress: DrillProgress,
}

impl DrillSession {
    /// Nominal delay between a correct answer and its result reveal. The
    /// driver owns the timer and calls [`complete_reveal`](Self::complete_reveal)
    /// when it elapses, so tests never wait on the wall clock.
    pub const REVEAL_DELAY: Duration = Duration::from_millis(800);

    #[must_use]
    pub fn new(provider: Arc<dyn ContentProvider>, book: MistakeBook, clock: Clock) -> Self {
        Self {
            state: SessionState::Idle,
            batch: Vec::new(),
            index: 0,
            active_review: None,
            attempt: None,
            shown: None,
            scheduler: ReviewScheduler::new(),
            book,
            provider,
            prefetch: BatchPrefetcher::new(),
            clock,
            rng: StdRng::from_rng(&mut rand::rng()),
            progress: DrillProgress::default(),
        }
    }

    /// Pin the scheduler and the option shuffle for deterministic tests.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.scheduler = ReviewScheduler::with_seed(seed);
        self.rng = StdRng::seed_from_u64(seed.wrapping_add(1));
        self
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn progress(&self) -> DrillProgress {
        self.progress
    }

    #[must_use]
    pub fn book(&self) -> &MistakeBook {
        &self.book
    }

    #[must_use]
    pub fn attempt(&self) -> Option<&AnswerAttempt> {
        self.attempt.as_ref()
    }

    #[must_use]
    pub fn shown(&self) -> Option<&ShownCard> {
        self.shown.as_ref()
    }

    /// Whether the current question is an injected review.
    #[must_use]
    pub fn is_reviewing(&self) -> bool {
        self.active_review.is_some()
    }

    #[must_use]
    pub fn words_since_review(&self) -> u32 {
        self.scheduler.words_since_review()
    }

    #[must_use]
    pub fn next_review_threshold(&self) -> u32 {
        self.scheduler.next_threshold()
    }

    /// The card currently being asked, while `Presenting`.
    #[must_use]
    pub fn current_card(&self) -> Option<&WordCard> {
        if self.state != SessionState::Presenting {
            return None;
        }
        match &self.active_review {
            Some(record) => Some(record.card()),
            None => self.batch.get(self.index),
        }
    }

    /// Kick off a background batch fetch to hide provider latency.
    /// A no-op while a fetch is already outstanding.
    pub fn prefetch(&mut self) {
        self.prefetch.begin(&self.provider);
    }

    /// Start the session: `Idle → LoadingBatch`, then present the first
    /// card of the fetched batch. Consumes an outstanding prefetch rather
    /// than issuing a duplicate fetch.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the fetch fails; the machine is back
    /// in `Idle` and a later `start` retries from scratch.
    pub async fn start(&mut self) -> Result<(), ProviderError> {
        if self.state != SessionState::Idle {
            return Ok(());
        }
        self.load_batch().await
    }

    /// Evaluate a submitted option against the current card.
    ///
    /// Returns `None` when the submission is not acceptable right now:
    /// not presenting, reveal already pending, the option is disabled
    /// from an earlier wrong try, or it is not one of the card's options.
    pub async fn submit(&mut self, option: &str) -> Option<AnswerOutcome> {
        if self.state != SessionState::Presenting {
            return None;
        }
        let card = self.current_card()?.clone();
        let attempt = self.attempt.as_ref()?;
        if attempt.reveal_pending() || attempt.is_disabled(option) {
            return None;
        }
        if !card.options().iter().any(|o| o == option) {
            return None;
        }

        if card.is_correct(option) {
            if self.active_review.is_some() {
                self.book.record_review_outcome(card.word(), true).await;
            }
            if let Some(attempt) = self.attempt.as_mut() {
                attempt.begin_reveal(option);
            }
            return Some(AnswerOutcome::Correct);
        }

        let second_chance_open = self
            .attempt
            .as_ref()
            .is_some_and(|a| a.wrong_attempts().is_empty());
        if second_chance_open {
            if let Some(attempt) = self.attempt.as_mut() {
                attempt.record_wrong(option);
            }
            return Some(AnswerOutcome::SecondChance);
        }

        // Second wrong answer: the card is missed.
        if self.active_review.is_some() {
            self.book.record_review_outcome(card.word(), false).await;
        } else {
            let now = self.clock.now();
            self.book.add(card.clone(), now).await;
        }
        self.enter_result(card, option.to_owned(), false);
        Some(AnswerOutcome::Incorrect)
    }

    /// Deliver the reward-timer event: move a correct answer from its
    /// pending reveal into `ShowingResult`. A no-op unless a reveal is
    /// actually pending.
    pub fn complete_reveal(&mut self) {
        if self.state != SessionState::Presenting {
            return;
        }
        let Some(attempt) = self.attempt.as_ref() else {
            return;
        };
        if !attempt.reveal_pending() {
            return;
        }
        let Some(selection) = attempt.selected().map(str::to_owned) else {
            return;
        };
        let Some(card) = self.current_card().cloned() else {
            return;
        };
        self.enter_result(card, selection, true);
    }

    /// Leave `ShowingResult`: resume after a review, inject a review, step
    /// to the next card, or fetch a fresh batch when this one is done.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when a needed batch fetch fails; the
    /// machine is back in `Idle`.
    pub async fn advance(&mut self) -> Result<(), ProviderError> {
        if self.state != SessionState::ShowingResult {
            return Ok(());
        }

        if self.shown.as_ref().is_some_and(ShownCard::was_review) {
            // The batch was paused for the review; resume it as-is.
            self.active_review = None;
            self.present_current();
            return Ok(());
        }

        match self
            .scheduler
            .on_word_completed(&self.book.eligible_for_review())
        {
            Decision::InjectReview(record) => {
                self.progress.reviews_injected += 1;
                self.active_review = Some(record);
                self.present_current();
                Ok(())
            }
            Decision::Continue => {
                if self.index + 1 < self.batch.len() {
                    self.index += 1;
                    self.present_current();
                    Ok(())
                } else {
                    self.load_batch().await
                }
            }
        }
    }

    /// Open the notebook view. Refused only while a reward reveal is
    /// pending.
    pub fn open_ledger(&mut self) -> bool {
        if self
            .attempt
            .as_ref()
            .is_some_and(AnswerAttempt::reveal_pending)
        {
            return false;
        }
        self.state = SessionState::ViewingLedger;
        true
    }

    /// Close the notebook view, returning to `Idle`. The paused batch is
    /// abandoned; a new session starts over with `start`.
    pub fn close_ledger(&mut self) {
        if self.state != SessionState::ViewingLedger {
            return;
        }
        self.state = SessionState::Idle;
        self.batch.clear();
        self.index = 0;
        self.active_review = None;
        self.attempt = None;
        self.shown = None;
    }

    /// Manually add the card on display to the notebook, from
    /// `ShowingResult` and only for a regular (non-review) card.
    pub async fn add_shown_to_ledger(&mut self) -> bool {
        if self.state != SessionState::ShowingResult {
            return false;
        }
        let Some(shown) = self.shown.as_ref() else {
            return false;
        };
        if shown.was_review() {
            return false;
        }
        let card = shown.card().clone();
        let now = self.clock.now();
        self.book.add(card, now).await
    }

    /// Manually delete a notebook record, from `ViewingLedger`.
    pub async fn remove_from_ledger(&mut self, word: &str) -> bool {
        if self.state != SessionState::ViewingLedger {
            return false;
        }
        self.book.remove(word).await
    }

    async fn load_batch(&mut self) -> Result<(), ProviderError> {
        self.state = SessionState::LoadingBatch;

        let fetched = match self.prefetch.take().await {
            Some(result) => result,
            None => self.provider.fetch_batch().await,
        };

        match fetched {
            Ok(batch) if batch.is_empty() => {
                self.state = SessionState::Idle;
                Err(ProviderError::EmptyBatch)
            }
            Ok(batch) => {
                self.batch = batch;
                self.index = 0;
                self.active_review = None;
                self.present_current();
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Idle;
                Err(err)
            }
        }
    }

    fn present_current(&mut self) {
        let card = match &self.active_review {
            Some(record) => Some(record.card().clone()),
            None => self.batch.get(self.index).cloned(),
        };
        if let Some(card) = card {
            self.attempt = Some(AnswerAttempt::for_card(&card, &mut self.rng));
            self.shown = None;
            self.state = SessionState::Presenting;
        }
    }

    fn enter_result(&mut self, card: WordCard, selection: String, correct: bool) {
        let was_review = self.active_review.is_some();
        let first_try = correct
            && self
                .attempt
                .as_ref()
                .is_some_and(|a| a.wrong_attempts().is_empty());

        self.progress.answered += 1;
        if first_try && !was_review {
            self.progress.first_try_correct += 1;
        }

        self.shown = Some(ShownCard {
            card,
            selection,
            correct,
            was_review,
        });
        self.attempt = None;
        self.state = SessionState::ShowingResult;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
