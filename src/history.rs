//! Conversation history
//!
//! Sessions are keyed by `"{user_id}:{conversation_id}"` and own an ordered,
//! append-only sequence of turns. Two stores are provided: an in-process map
//! (lost on restart) and a SQLite-backed store for durable history. Sessions
//! are created lazily on first append and never deleted by this crate.

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::HistoryConfig;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History backend error: {0}")]
    Backend(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Corrupt history row: {0}")]
    Corrupt(String),
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn parse(s: &str) -> Result<Self, HistoryError> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(HistoryError::Corrupt(format!("unknown role: {}", other))),
        }
    }
}

/// One turn of a conversation; immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Build the session key scoping a conversation to its authenticated user
pub fn session_key(user_id: &str, conversation_id: &str) -> String {
    format!("{}:{}", user_id, conversation_id)
}

/// Storage contract for session histories
///
/// `read` of an unknown session returns an empty sequence; appends under the
/// same key are ordered by arrival (no session-level locking, concurrent
/// turns on one session may interleave - documented limitation).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, session_key: &str, turn: ConversationTurn) -> Result<(), HistoryError>;

    async fn read(&self, session_key: &str) -> Result<Vec<ConversationTurn>, HistoryError>;
}

/// In-memory history store; data is lost on restart
#[derive(Default)]
pub struct MemoryHistoryStore {
    sessions: Mutex<HashMap<String, Vec<ConversationTurn>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, session_key: &str, turn: ConversationTurn) -> Result<(), HistoryError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| HistoryError::Backend("history map poisoned".to_string()))?;
        sessions.entry(session_key.to_string()).or_default().push(turn);
        Ok(())
    }

    async fn read(&self, session_key: &str) -> Result<Vec<ConversationTurn>, HistoryError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| HistoryError::Backend("history map poisoned".to_string()))?;
        Ok(sessions.get(session_key).cloned().unwrap_or_default())
    }
}

/// SQLite-backed durable history store
pub struct SqliteHistoryStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteHistoryStore {
    pub fn new(db_path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HistoryError::Backend(format!("create history directory: {}", e)))?;
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| HistoryError::Pool(e.to_string()))?;

        {
            let conn = pool.get().map_err(|e| HistoryError::Pool(e.to_string()))?;
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA busy_timeout = 5000;

                CREATE TABLE IF NOT EXISTS chat_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_key TEXT NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_chat_history_session
                    ON chat_history(session_key, id);
                ",
            )
            .map_err(|e| HistoryError::Backend(e.to_string()))?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(&self, session_key: &str, turn: ConversationTurn) -> Result<(), HistoryError> {
        let conn = self.pool.get().map_err(|e| HistoryError::Pool(e.to_string()))?;
        conn.execute(
            "INSERT INTO chat_history (session_key, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session_key,
                turn.role.as_str(),
                turn.content,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| HistoryError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn read(&self, session_key: &str) -> Result<Vec<ConversationTurn>, HistoryError> {
        let conn = self.pool.get().map_err(|e| HistoryError::Pool(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT role, content FROM chat_history
                 WHERE session_key = ?1 ORDER BY id ASC",
            )
            .map_err(|e| HistoryError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map(params![session_key], |row| {
                let role: String = row.get(0)?;
                let content: String = row.get(1)?;
                Ok((role, content))
            })
            .map_err(|e| HistoryError::Backend(e.to_string()))?;

        let mut turns = Vec::new();
        for row in rows {
            let (role, content) = row.map_err(|e| HistoryError::Backend(e.to_string()))?;
            turns.push(ConversationTurn {
                role: Role::parse(&role)?,
                content,
            });
        }
        Ok(turns)
    }
}

/// Build a history store from configuration
///
/// A configured database path selects SQLite; failure to open it falls back
/// to the in-memory store with a warning, mirroring the "no durable store
/// configured" mode.
pub fn build_history_store(config: &HistoryConfig) -> Arc<dyn HistoryStore> {
    match &config.database_path {
        Some(path) => match SqliteHistoryStore::new(path) {
            Ok(store) => {
                tracing::info!("Using SQLite history store at {:?}", path);
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(
                    "SQLite history store unavailable ({}), falling back to in-memory history",
                    e
                );
                Arc::new(MemoryHistoryStore::new())
            }
        },
        None => {
            tracing::info!("No history database configured, using in-memory history");
            Arc::new(MemoryHistoryStore::new())
        }
    }
}
