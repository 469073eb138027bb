use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub id: i64,
    pub name: String,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: i64,
    pub poll_id: i64,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

// A single recorded vote. Rows are only ever inserted, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub choice_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A choice together with how many answers it received and its share of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub choice: Choice,
    pub count: i64,
    pub percentage: f64,
}

/// Aggregated view of a poll: summaries ordered by popularity plus the grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollResult {
    pub poll: Poll,
    pub summaries: Vec<Summary>,
    pub count: i64,
}

impl Poll {
    pub fn new(id: i64, name: impl Into<String>, is_open: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_open,
            created_at: Utc::now(),
        }
    }
}

impl Choice {
    pub fn new(id: i64, poll_id: i64, answer: impl Into<String>) -> Self {
        Self {
            id,
            poll_id,
            answer: answer.into(),
            created_at: Utc::now(),
        }
    }
}
