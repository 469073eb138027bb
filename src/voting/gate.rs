use log::debug;

use crate::db::PollStore;
use crate::error::PollError;

/// Records a vote for `choice_id` in `poll_id`.
///
/// Fails with `NotFound` when the choice does not exist or belongs to a
/// different poll; nothing is written in that case. Repeated calls with the
/// same arguments each record a new answer.
pub async fn answer(store: &dyn PollStore, poll_id: i64, choice_id: i64) -> Result<(), PollError> {
    match store.insert_answer_if_valid(poll_id, choice_id).await? {
        0 => Err(PollError::NotFound),
        _ => {
            debug!("Recorded answer for poll {} choice {}", poll_id, choice_id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn valid_pair_records_one_answer() {
        let store = MemoryStore::new();
        let poll = store.add_poll("p", true);
        let choice = store.add_choice(poll.id, "yes").unwrap();

        answer(&store, poll.id, choice.id).await.unwrap();
        assert_eq!(store.answer_count(), 1);
    }

    #[tokio::test]
    async fn choice_from_other_poll_is_not_found() {
        let store = MemoryStore::new();
        let poll = store.add_poll("p", true);
        let other = store.add_poll("q", true);
        let foreign = store.add_choice(other.id, "elsewhere").unwrap();

        let err = answer(&store, poll.id, foreign.id).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.answer_count(), 0);
    }

    #[tokio::test]
    async fn storage_failure_is_not_reported_as_not_found() {
        let store = MemoryStore::new();
        let poll = store.add_poll("p", true);
        let choice = store.add_choice(poll.id, "yes").unwrap();
        store.set_unavailable(true);

        let err = answer(&store, poll.id, choice.id).await.unwrap_err();
        assert!(matches!(err, PollError::Storage(_)));
    }
}
