use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::PollStore;
use crate::error::PollError;
use crate::models::{Answer, Choice, Poll};

#[derive(Default)]
struct Tables {
    polls: Vec<Poll>,
    choices: Vec<Choice>,
    answers: Vec<Answer>,
    next_id: i64,
    unavailable: bool,
}

/// In-process stand-in for [`super::Database`] with the same semantics,
/// including foreign keys and the atomic guarded answer insert.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // Every mutation is a single push, so a poisoned lock still holds consistent data.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // All reads and writes go through here so an "unavailable" store fails uniformly.
    fn open(&self) -> Result<MutexGuard<'_, Tables>, PollError> {
        let tables = self.tables();
        if tables.unavailable {
            return Err(PollError::Storage(sqlx::Error::PoolTimedOut));
        }
        Ok(tables)
    }

    pub fn add_poll(&self, name: &str, is_open: bool) -> Poll {
        let mut tables = self.tables();
        tables.next_id += 1;
        let poll = Poll::new(tables.next_id, name, is_open);
        tables.polls.push(poll.clone());
        poll
    }

    pub fn add_choice(&self, poll_id: i64, answer: &str) -> Result<Choice, PollError> {
        let mut tables = self.tables();
        if !tables.polls.iter().any(|p| p.id == poll_id) {
            return Err(PollError::NotFound);
        }
        tables.next_id += 1;
        let choice = Choice::new(tables.next_id, poll_id, answer);
        tables.choices.push(choice.clone());
        Ok(choice)
    }

    /// Makes every subsequent store call fail with a storage error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.tables().unavailable = unavailable;
    }

    pub fn answer_count(&self) -> usize {
        self.tables().answers.len()
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn get_poll_by_id(&self, poll_id: i64) -> Result<Poll, PollError> {
        self.open()?
            .polls
            .iter()
            .find(|p| p.id == poll_id)
            .cloned()
            .ok_or(PollError::NotFound)
    }

    async fn get_latest_open_poll(&self) -> Result<Poll, PollError> {
        self.open()?
            .polls
            .iter()
            .filter(|p| p.is_open)
            .max_by_key(|p| (p.created_at, p.id))
            .cloned()
            .ok_or(PollError::NotFound)
    }

    async fn get_choices_for_poll(&self, poll_id: i64) -> Result<Vec<Choice>, PollError> {
        let tables = self.open()?;
        let mut choices: Vec<Choice> = tables
            .choices
            .iter()
            .filter(|c| c.poll_id == poll_id)
            .cloned()
            .collect();
        choices.sort_by_key(|c| c.id);
        Ok(choices)
    }

    async fn count_answers_by_choice(&self, poll_id: i64) -> Result<Vec<(Choice, i64)>, PollError> {
        let tables = self.open()?;
        let counts = tables
            .choices
            .iter()
            .filter(|c| c.poll_id == poll_id)
            .map(|c| {
                let votes = tables.answers.iter().filter(|a| a.choice_id == c.id).count() as i64;
                (c.clone(), votes)
            })
            .collect();
        Ok(counts)
    }

    async fn insert_answer_if_valid(&self, poll_id: i64, choice_id: i64) -> Result<u64, PollError> {
        // Check and insert under the same lock guard.
        let mut tables = self.open()?;
        if !tables.choices.iter().any(|c| c.id == choice_id && c.poll_id == poll_id) {
            return Ok(0);
        }
        tables.next_id += 1;
        let answer = Answer {
            id: tables.next_id,
            choice_id,
            created_at: Utc::now(),
        };
        tables.answers.push(answer);
        Ok(1)
    }
}
