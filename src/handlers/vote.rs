use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use super::{AppError, IdParams};
use crate::voting::PollService;

// `poll_id` may come from the query string or the form body; the body wins.
pub async fn answer(
    State(service): State<PollService>,
    Query(query): Query<IdParams>,
    form: Result<Form<IdParams>, FormRejection>,
) -> Result<Response, AppError> {
    let form = form.map(|Form(params)| params).unwrap_or_default();

    let poll_id = super::parse_id(form.poll_id.as_deref().or(query.poll_id.as_deref()))?;
    let choice_id = super::parse_id(form.choice_id.as_deref().or(query.choice_id.as_deref()))?;

    service
        .answer(poll_id, choice_id)
        .await
        .map_err(|e| AppError::poll("answer", e))?;

    let location = format!("/results?poll_id={}", poll_id);
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
