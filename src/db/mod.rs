pub mod memory;
pub mod sql;

use async_trait::async_trait;

use crate::error::PollError;
use crate::models::{Choice, Poll};

pub use memory::MemoryStore;
pub use sql::Database;

/// Data access for polls, choices and answers.
///
/// Implemented by the SQLite-backed [`Database`] and by the in-process
/// [`MemoryStore`] used in tests. The tally engine and the voting gate only
/// ever talk to this trait.
#[async_trait]
pub trait PollStore: Send + Sync {
    /// Fails with `NotFound` if no poll has this id.
    async fn get_poll_by_id(&self, poll_id: i64) -> Result<Poll, PollError>;

    /// Most recently created open poll, ties broken by the higher id.
    async fn get_latest_open_poll(&self) -> Result<Poll, PollError>;

    /// Choices of a poll ordered by id. An unknown poll yields an empty list.
    async fn get_choices_for_poll(&self, poll_id: i64) -> Result<Vec<Choice>, PollError>;

    /// Every choice of the poll paired with the number of answers referencing
    /// it, zero-vote choices included.
    async fn count_answers_by_choice(&self, poll_id: i64) -> Result<Vec<(Choice, i64)>, PollError>;

    /// Records one answer for `choice_id` only if that choice belongs to
    /// `poll_id`, as a single atomic step. Returns the number of rows inserted.
    async fn insert_answer_if_valid(&self, poll_id: i64, choice_id: i64) -> Result<u64, PollError>;
}
