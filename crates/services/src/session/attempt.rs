use rand::Rng;

use drill_core::model::WordCard;

/// Transient answer state for one card instance.
///
/// Holds the randomized display order, the options already tried and
/// found wrong (at most the first wrong one while the second chance is
/// open), the final selection, and whether the reward reveal is pending.
/// A fresh attempt is created whenever a new card becomes current.
#[derive(Debug, Clone)]
pub struct AnswerAttempt {
    display_options: Vec<String>,
    wrong: Vec<String>,
    selected: Option<String>,
    reveal_pending: bool,
}

impl AnswerAttempt {
    pub(crate) fn for_card(card: &WordCard, rng: &mut impl Rng) -> Self {
        Self {
            display_options: card.shuffled_options(rng),
            wrong: Vec::new(),
            selected: None,
            reveal_pending: false,
        }
    }

    /// Options in the order they are presented this time around.
    #[must_use]
    pub fn display_options(&self) -> &[String] {
        &self.display_options
    }

    /// Options already tried and found wrong on this card instance.
    #[must_use]
    pub fn wrong_attempts(&self) -> &[String] {
        &self.wrong
    }

    /// Whether this option has been tried wrong and is disabled.
    #[must_use]
    pub fn is_disabled(&self, option: &str) -> bool {
        self.wrong.iter().any(|o| o == option)
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Whether a correct answer is waiting on its reward reveal.
    #[must_use]
    pub fn reveal_pending(&self) -> bool {
        self.reveal_pending
    }

    pub(crate) fn record_wrong(&mut self, option: &str) {
        self.wrong.push(option.to_owned());
    }

    pub(crate) fn begin_reveal(&mut self, option: &str) {
        self.selected = Some(option.to_owned());
        self.reveal_pending = true;
    }
}
