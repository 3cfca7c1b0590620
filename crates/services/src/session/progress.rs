/// Running counters for one drill session, for the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrillProgress {
    pub answered: usize,
    pub first_try_correct: usize,
    pub reviews_injected: usize,
}
