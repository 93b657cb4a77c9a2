/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub flagged: usize,
    pub remaining: usize,
    pub position: usize,
    pub in_review_pass: bool,
    pub is_finished: bool,
}
