//! SQLite-backed thread store
//!
//! Durable alternative to the in-process map. Uses sqlx with WAL mode; each
//! message is one row keyed by `(thread_id, seq)` so the log stays ordered
//! and append-only.
use async_trait::async_trait;
use sdk::{ChatStatus, TutorError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{ConnectOptions, Row};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use super::{ConversationThread, ThreadStore, ThreadSummary};
use crate::llm::{Message, MessageRole};
use crate::quiz::RunState;

pub struct SqliteThreadStore {
    pool: SqlitePool,
}

fn store_err(context: &str, e: impl std::fmt::Display) -> TutorError {
    TutorError::Store(format!("{}: {}", context, e))
}

impl SqliteThreadStore {
    /// Open (or create) the database at `db_path` and run migrations
    pub async fn new(db_path: &Path) -> Result<Self, TutorError> {
        info!("Opening thread store at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| store_err("Failed to create database directory", e))?;
        }

        let connection_string = format!("sqlite:{}", db_path.display());
        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| store_err("Invalid database path", e))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| store_err("Failed to connect to database", e))?;

        debug!("Database connection established");

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), TutorError> {
        sqlx::raw_sql(include_str!("../../migrations/001_threads.sql"))
            .execute(&self.pool)
            .await
            .map_err(|e| store_err("Failed to execute migration 001_threads.sql", e))?;

        debug!("Thread store migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checkpoint the WAL and close all connections
    pub async fn close(self) -> Result<(), TutorError> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
            .map_err(|e| store_err("Failed to flush WAL", e))?;

        self.pool.close().await;
        info!("Thread store closed");
        Ok(())
    }
}

fn encode_state(state: &RunState) -> Result<String, TutorError> {
    serde_json::to_string(state).map_err(|e| store_err("Failed to encode run state", e))
}

#[async_trait]
impl ThreadStore for SqliteThreadStore {
    async fn create(&self, thread: ConversationThread) -> Result<(), TutorError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_err("Failed to begin transaction", e))?;

        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM threads WHERE id = ?")
            .bind(&thread.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| store_err("Failed to check thread", e))?;

        if existing.is_some() {
            return Err(TutorError::ThreadExists(thread.id));
        }

        sqlx::query(
            "INSERT INTO threads (id, status, state, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&thread.id)
        .bind(thread.status().as_str())
        .bind(encode_state(&thread.state)?)
        .bind(thread.created_at)
        .bind(thread.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_err("Failed to create thread", e))?;

        for (seq, message) in thread.messages.iter().enumerate() {
            sqlx::query(
                "INSERT INTO messages (thread_id, seq, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&thread.id)
            .bind(seq as i64)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(thread.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_err("Failed to insert message", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| store_err("Failed to commit thread", e))?;

        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<ConversationThread>, TutorError> {
        let row = sqlx::query("SELECT id, state, created_at, updated_at FROM threads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_err("Failed to fetch thread", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let state: RunState = serde_json::from_str(&row.get::<String, _>("state"))
            .map_err(|e| store_err("Corrupt run state", e))?;

        let rows = sqlx::query("SELECT role, content FROM messages WHERE thread_id = ? ORDER BY seq")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_err("Failed to fetch messages", e))?;

        let messages = rows
            .into_iter()
            .map(|r| {
                let role: String = r.get("role");
                let role = MessageRole::parse(&role)
                    .ok_or_else(|| TutorError::Store(format!("Unknown message role '{}'", role)))?;
                Ok(Message {
                    role,
                    content: r.get("content"),
                })
            })
            .collect::<Result<Vec<_>, TutorError>>()?;

        Ok(Some(ConversationThread {
            id: row.get("id"),
            messages,
            state,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn append(
        &self,
        id: &str,
        messages: &[Message],
        state: RunState,
    ) -> Result<(), TutorError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_err("Failed to begin transaction", e))?;

        let updated = sqlx::query("UPDATE threads SET status = ?, state = ?, updated_at = ? WHERE id = ?")
            .bind(state.status().as_str())
            .bind(encode_state(&state)?)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_err("Failed to update thread", e))?;

        if updated.rows_affected() == 0 {
            return Err(TutorError::ThreadNotFound(id.to_string()));
        }

        let next_seq: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(seq) + 1, 0) FROM messages WHERE thread_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| store_err("Failed to read message sequence", e))?;

        for (offset, message) in messages.iter().enumerate() {
            sqlx::query(
                "INSERT INTO messages (thread_id, seq, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(next_seq + offset as i64)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_err("Failed to insert message", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| store_err("Failed to commit messages", e))?;

        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<ThreadSummary>, TutorError> {
        let rows = sqlx::query(
            "SELECT t.id, t.status, t.updated_at, \
             (SELECT COUNT(*) FROM messages m WHERE m.thread_id = t.id) AS message_count \
             FROM threads t ORDER BY t.updated_at DESC, t.id LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_err("Failed to list threads", e))?;

        Ok(rows
            .into_iter()
            .map(|r| ThreadSummary {
                id: r.get("id"),
                status: match r.get::<String, _>("status").as_str() {
                    "complete" => ChatStatus::Complete,
                    _ => ChatStatus::AwaitingInput,
                },
                message_count: r.get::<i64, _>("message_count") as usize,
                updated_at: r.get("updated_at"),
            })
            .collect())
    }
}
