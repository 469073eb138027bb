use crate::db::PollStore;
use crate::error::PollError;
use crate::models::{Choice, Poll, PollResult, Summary};

/// Aggregates the answers of a poll into per-choice summaries.
///
/// Fails with `NotFound` when the poll does not exist. Once the poll is
/// resolved, a poll without choices still yields an empty result.
pub async fn get_results(store: &dyn PollStore, poll_id: i64) -> Result<PollResult, PollError> {
    let poll = store.get_poll_by_id(poll_id).await?;
    let counts = store.count_answers_by_choice(poll_id).await?;
    Ok(summarize(poll, counts))
}

/// Orders choices by vote count (descending, then by choice id) and
/// normalizes each count against the poll total.
pub fn summarize(poll: Poll, counts: Vec<(Choice, i64)>) -> PollResult {
    let mut summaries: Vec<Summary> = counts
        .into_iter()
        .map(|(choice, count)| Summary {
            choice,
            count,
            percentage: 0.0,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then(a.choice.id.cmp(&b.choice.id)));

    let total: i64 = summaries.iter().map(|s| s.count).sum();
    if total > 0 {
        for summary in summaries.iter_mut() {
            summary.percentage = summary.count as f64 / total as f64;
        }
    }

    PollResult {
        poll,
        summaries,
        count: total,
    }
}
