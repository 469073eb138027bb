use axum::extract::{Query, State};
use axum::response::Html;

use super::{AppError, IdParams};
use crate::render;
use crate::voting::PollService;

/// Shows the vote form for `?poll_id=` or, without one, the latest open poll.
pub async fn index(
    State(service): State<PollService>,
    Query(params): Query<IdParams>,
) -> Result<Html<String>, AppError> {
    let (poll, choices) = match params.poll_id.as_deref() {
        Some(raw) => service.poll_with_choices(super::parse_id(Some(raw))?).await,
        None => service.latest_open_poll_with_choices().await,
    }
    .map_err(|e| AppError::poll("index", e))?;

    Ok(Html(render::poll_page(&poll, &choices)))
}

pub async fn results(
    State(service): State<PollService>,
    Query(params): Query<IdParams>,
) -> Result<Html<String>, AppError> {
    let poll_id = super::parse_id(params.poll_id.as_deref())?;

    let result = service
        .results(poll_id)
        .await
        .map_err(|e| AppError::poll("results", e))?;

    Ok(Html(render::results_page(&result)))
}
