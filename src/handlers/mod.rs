mod view;
mod vote;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use log::error;
use serde::Deserialize;
use thiserror::Error;

use crate::error::PollError;
use crate::voting::PollService;

pub fn router(service: PollService) -> Router {
    Router::new()
        .route("/", get(view::index))
        .route("/answer", post(vote::answer))
        .route("/results", get(view::results))
        .fallback(not_found)
        .with_state(service)
}

/// Raw identifiers as they arrive on the wire. Parsed by hand so that a
/// malformed value is a 400 rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct IdParams {
    pub poll_id: Option<String>,
    pub choice_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request")]
    BadRequest,

    #[error(transparent)]
    Poll(PollError),
}

impl AppError {
    // Storage failures are logged here with the action that hit them; the
    // client only ever sees the status line.
    fn poll(action: &str, err: PollError) -> Self {
        if !err.is_not_found() {
            error!("in=handlers::{} err={}", action, err);
        }
        AppError::Poll(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest => StatusCode::BAD_REQUEST,
            AppError::Poll(PollError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Poll(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}

fn parse_id(raw: Option<&str>) -> Result<i64, AppError> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .ok_or(AppError::BadRequest)
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}
