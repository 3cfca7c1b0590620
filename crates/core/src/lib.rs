#![forbid(unsafe_code)]

pub mod ledger;
pub mod model;
pub mod scheduler;
pub mod time;

pub use ledger::MistakeLedger;
pub use scheduler::{Decision, ReviewScheduler};
pub use time::Clock;
