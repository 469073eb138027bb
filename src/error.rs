use thiserror::Error;

/// Errors produced by the poll store, the tally engine and the voting gate.
///
/// `NotFound` covers both a missing poll and a choice that does not belong to
/// the requested poll. Everything else coming out of the storage layer is a
/// storage failure and must never be reported as `NotFound`.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl PollError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PollError::NotFound)
    }
}
