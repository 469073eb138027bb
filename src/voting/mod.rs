pub mod gate;
pub mod tally;

use std::sync::Arc;

use crate::db::PollStore;
use crate::error::PollError;
use crate::models::{Choice, Poll, PollResult};

/// The three operations the web layer needs, over whichever store was
/// injected at construction.
#[derive(Clone)]
pub struct PollService {
    store: Arc<dyn PollStore>,
}

impl PollService {
    pub fn new(store: Arc<dyn PollStore>) -> Self {
        Self { store }
    }

    pub async fn latest_open_poll_with_choices(&self) -> Result<(Poll, Vec<Choice>), PollError> {
        let poll = self.store.get_latest_open_poll().await?;
        let choices = self.store.get_choices_for_poll(poll.id).await?;
        Ok((poll, choices))
    }

    // The poll is resolved first so an unknown id is `NotFound` here rather
    // than an empty choice list.
    pub async fn poll_with_choices(&self, poll_id: i64) -> Result<(Poll, Vec<Choice>), PollError> {
        let poll = self.store.get_poll_by_id(poll_id).await?;
        let choices = self.store.get_choices_for_poll(poll.id).await?;
        Ok((poll, choices))
    }

    pub async fn results(&self, poll_id: i64) -> Result<PollResult, PollError> {
        tally::get_results(self.store.as_ref(), poll_id).await
    }

    pub async fn answer(&self, poll_id: i64, choice_id: i64) -> Result<(), PollError> {
        gate::answer(self.store.as_ref(), poll_id, choice_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, MemoryStore};

    async fn assert_two_to_one(service: &PollService, poll_id: i64) {
        let result = service.results(poll_id).await.unwrap();

        assert_eq!(result.count, 3);
        assert_eq!(result.summaries.len(), 2);
        assert_eq!(result.summaries[0].choice.answer, "A");
        assert_eq!(result.summaries[0].count, 2);
        assert!((result.summaries[0].percentage - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.summaries[1].choice.answer, "B");
        assert_eq!(result.summaries[1].count, 1);
        assert!((result.summaries[1].percentage - 1.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn two_votes_for_a_one_for_b_in_memory() {
        let store = Arc::new(MemoryStore::new());
        let poll = store.add_poll("Which letter?", true);
        let a = store.add_choice(poll.id, "A").unwrap();
        let b = store.add_choice(poll.id, "B").unwrap();
        let service = PollService::new(store);

        service.answer(poll.id, a.id).await.unwrap();
        service.answer(poll.id, a.id).await.unwrap();
        service.answer(poll.id, b.id).await.unwrap();

        assert_two_to_one(&service, poll.id).await;
    }

    #[tokio::test]
    async fn two_votes_for_a_one_for_b_in_sqlite() {
        let db = Database::in_memory().await.unwrap();
        let poll = db.insert_poll("Which letter?", true).await.unwrap();
        let a = db.insert_choice(poll.id, "A").await.unwrap();
        let b = db.insert_choice(poll.id, "B").await.unwrap();
        let service = PollService::new(Arc::new(db));

        service.answer(poll.id, b.id).await.unwrap();
        service.answer(poll.id, a.id).await.unwrap();
        service.answer(poll.id, a.id).await.unwrap();

        assert_two_to_one(&service, poll.id).await;
    }

    #[tokio::test]
    async fn unknown_choice_is_rejected_without_writing() {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let poll = db.insert_poll("p", true).await.unwrap();
        let a = db.insert_choice(poll.id, "A").await.unwrap();
        let service = PollService::new(db.clone());

        assert!(service.answer(poll.id, 999).await.unwrap_err().is_not_found());
        assert!(service.answer(999, a.id).await.unwrap_err().is_not_found());
        assert_eq!(service.results(poll.id).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn results_for_unknown_poll_is_not_found() {
        let service = PollService::new(Arc::new(Database::in_memory().await.unwrap()));
        assert!(service.results(999).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn repeated_vote_is_counted_every_time() {
        let store = Arc::new(MemoryStore::new());
        let poll = store.add_poll("p", true);
        let a = store.add_choice(poll.id, "A").unwrap();
        let service = PollService::new(store);

        service.answer(poll.id, a.id).await.unwrap();
        service.answer(poll.id, a.id).await.unwrap();

        let result = service.results(poll.id).await.unwrap();
        assert_eq!(result.summaries[0].count, 2);
        assert_eq!(result.summaries[0].percentage, 1.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_votes_are_both_counted() {
        let db = Database::in_memory().await.unwrap();
        let poll = db.insert_poll("race", true).await.unwrap();
        let a = db.insert_choice(poll.id, "A").await.unwrap();
        let b = db.insert_choice(poll.id, "B").await.unwrap();
        let service = PollService::new(Arc::new(db));
        let (poll_id, a_id, b_id) = (poll.id, a.id, b.id);

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.answer(poll_id, a_id).await })
        };
        let second = {
            let service = service.clone();
            tokio::spawn(async move { service.answer(poll_id, b_id).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let result = service.results(poll.id).await.unwrap();
        assert_eq!(result.count, 2);
        assert!(result.summaries.iter().all(|s| s.count == 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_votes_across_pooled_connections_are_never_lost() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("polls.db").display());
        let db = Database::connect(&url, 15).await.unwrap();
        let poll = db.insert_poll("busy", true).await.unwrap();
        let a = db.insert_choice(poll.id, "A").await.unwrap();
        let b = db.insert_choice(poll.id, "B").await.unwrap();
        let service = PollService::new(Arc::new(db));

        let mut handles = Vec::new();
        for i in 0..200 {
            let service = service.clone();
            let (poll_id, choice_id) = (poll.id, if i % 2 == 0 { a.id } else { b.id });
            handles.push(tokio::spawn(async move { service.answer(poll_id, choice_id).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let result = service.results(poll.id).await.unwrap();
        assert_eq!(result.count, 200);
        assert!(result.summaries.iter().all(|s| s.count == 100));
        let pct_sum: f64 = result.summaries.iter().map(|s| s.percentage).sum();
        assert!((pct_sum - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn choices_of_unknown_poll_are_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = PollService::new(store);

        assert!(service.poll_with_choices(5).await.unwrap_err().is_not_found());
        assert!(service.latest_open_poll_with_choices().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn latest_open_poll_comes_with_its_choices() {
        let store = Arc::new(MemoryStore::new());
        store.add_poll("old", true);
        let current = store.add_poll("current", true);
        store.add_choice(current.id, "x").unwrap();
        store.add_choice(current.id, "y").unwrap();
        let service = PollService::new(store);

        let (poll, choices) = service.latest_open_poll_with_choices().await.unwrap();
        assert_eq!(poll.id, current.id);
        let answers: Vec<&str> = choices.iter().map(|c| c.answer.as_str()).collect();
        assert_eq!(answers, vec!["x", "y"]);
    }
}
