mod card;
mod mistake;

pub use card::{CardError, OPTION_COUNT, WordCard, WordCardDraft};
pub use mistake::{MASTERY_THRESHOLD, MistakeRecord};
