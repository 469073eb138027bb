use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use super::PollStore;
use crate::error::PollError;
use crate::models::{Choice, Poll};

// One idle connection is kept warm; the ceiling protects the backing store.
pub const MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 15;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_url: &str, max_connections: u32) -> Result<Self, PollError> {
        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(MIN_CONNECTIONS))
            .min_connections(MIN_CONNECTIONS)
            .connect_with(options)
            .await?;

        Self::init_schema(&pool).await?;
        info!("Connected to {} (max {} connections)", db_url, max_connections);

        Ok(Self { pool })
    }

    /// Private in-memory database. Pinned to a single connection that never
    /// expires, since every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, PollError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), PollError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS polls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                is_open BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS choices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                poll_id INTEGER NOT NULL,
                answer TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (poll_id) REFERENCES polls(id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                choice_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (choice_id) REFERENCES choices(id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_choices_poll_id ON choices(poll_id)")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_answers_choice_id ON answers(choice_id)")
            .execute(pool)
            .await?;

        Ok(())
    }

    // Polls and choices are created out of band. These two are used for
    // seeding and by tests.
    pub async fn insert_poll(&self, name: &str, is_open: bool) -> Result<Poll, PollError> {
        let created_at = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO polls (name, is_open, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(is_open)
        .bind(created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Poll {
            id,
            name: name.to_string(),
            is_open,
            created_at,
        })
    }

    pub async fn insert_choice(&self, poll_id: i64, answer: &str) -> Result<Choice, PollError> {
        let created_at = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO choices (poll_id, answer, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(poll_id)
        .bind(answer)
        .bind(created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Choice {
            id,
            poll_id,
            answer: answer.to_string(),
            created_at,
        })
    }

    pub async fn count_polls(&self) -> Result<i64, PollError> {
        let count = sqlx::query("SELECT COUNT(*) AS total FROM polls")
            .fetch_one(&self.pool)
            .await?
            .get::<i64, _>("total");
        Ok(count)
    }
}

#[async_trait]
impl PollStore for Database {
    async fn get_poll_by_id(&self, poll_id: i64) -> Result<Poll, PollError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, is_open, created_at
            FROM polls
            WHERE id = ?
            "#,
        )
        .bind(poll_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(PollError::NotFound)?;

        poll_from_row(&row)
    }

    async fn get_latest_open_poll(&self) -> Result<Poll, PollError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, is_open, created_at
            FROM polls
            WHERE is_open = TRUE
            ORDER BY julianday(created_at) DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or(PollError::NotFound)?;

        poll_from_row(&row)
    }

    async fn get_choices_for_poll(&self, poll_id: i64) -> Result<Vec<Choice>, PollError> {
        sqlx::query(
            r#"
            SELECT id, poll_id, answer, created_at
            FROM choices
            WHERE poll_id = ?
            ORDER BY id
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(choice_from_row)
        .collect()
    }

    async fn count_answers_by_choice(&self, poll_id: i64) -> Result<Vec<(Choice, i64)>, PollError> {
        sqlx::query(
            r#"
            SELECT c.id, c.poll_id, c.answer, c.created_at, COUNT(a.id) AS votes
            FROM choices c
            LEFT OUTER JOIN answers a ON a.choice_id = c.id
            WHERE c.poll_id = ?
            GROUP BY c.id, c.poll_id, c.answer, c.created_at
            ORDER BY votes DESC, c.id ASC
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| Ok::<_, PollError>((choice_from_row(row)?, row.try_get::<i64, _>("votes")?)))
        .collect()
    }

    async fn insert_answer_if_valid(&self, poll_id: i64, choice_id: i64) -> Result<u64, PollError> {
        // Validation and insert happen in one statement so a concurrent
        // writer cannot slip in between the check and the write.
        let result = sqlx::query(
            r#"
            INSERT INTO answers (choice_id, created_at)
            SELECT id, ? FROM choices WHERE poll_id = ? AND id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(poll_id)
        .bind(choice_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn poll_from_row(row: &SqliteRow) -> Result<Poll, PollError> {
    // Rows may be written by other tools, so `created_at` is decoded by sqlx
    // (RFC3339 or SQLite's own `YYYY-MM-DD HH:MM:SS`) rather than by hand.
    Ok(Poll {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        is_open: row.try_get("is_open")?,
        created_at: row.try_get("created_at")?,
    })
}

fn choice_from_row(row: &SqliteRow) -> Result<Choice, PollError> {
    Ok(Choice {
        id: row.try_get("id")?,
        poll_id: row.try_get("poll_id")?,
        answer: row.try_get("answer")?,
        created_at: row.try_get("created_at")?,
    })
}
