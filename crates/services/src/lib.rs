#![forbid(unsafe_code)]

pub mod audio;
pub mod content;
pub mod error;
pub mod mistake_book;
pub mod prefetch;
pub mod session;

pub use drill_core::Clock;

pub use audio::{AudioService, AudioSink, GenerativeSpeechProvider, SpeechSynthesizer};
pub use content::{BATCH_SIZE, ContentConfig, ContentProvider, GenerativeContentProvider};
pub use error::ProviderError;
pub use mistake_book::MistakeBook;
pub use prefetch::BatchPrefetcher;
pub use session::{AnswerOutcome, DrillProgress, DrillSession, SessionState};
