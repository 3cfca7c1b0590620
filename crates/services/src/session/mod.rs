mod attempt;
mod machine;
mod progress;

pub use attempt::AnswerAttempt;
pub use machine::{AnswerOutcome, DrillSession, SessionState, ShownCard};
pub use progress::DrillProgress;
