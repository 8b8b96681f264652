//! Command log repository
//!
//! Every dispatched command and its reply is appended here. Logging is
//! best-effort: callers go through [`record_command`], which never fails.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::DbPool;
use crate::assistant::CommandResponse;
use crate::{Error, Result};

/// Largest page `recent` will return
pub const MAX_RECENT: usize = 100;

/// A logged command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub command: String,
    pub response: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

/// Sink for dispatched commands
pub trait CommandLog: Send + Sync {
    /// Append a command and the reply it received
    ///
    /// # Errors
    ///
    /// Returns error if the entry cannot be stored
    fn append(&self, command: &str, response: &CommandResponse, user_id: Option<&str>)
    -> Result<()>;
}

/// Append to a log, logging and discarding any failure
pub fn record_command(
    log: &dyn CommandLog,
    command: &str,
    response: &CommandResponse,
    user_id: Option<&str>,
) {
    if let Err(e) = log.append(command, response, user_id) {
        tracing::warn!(error = %e, command, "failed to log command");
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCommandLog;

impl CommandLog for NullCommandLog {
    fn append(&self, _: &str, _: &CommandResponse, _: Option<&str>) -> Result<()> {
        Ok(())
    }
}

/// `SQLite`-backed command log
#[derive(Clone)]
pub struct CommandLogRepo {
    pool: DbPool,
}

impl CommandLogRepo {
    /// Create a new command log repository
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Most recent commands, newest first
    ///
    /// `limit` is capped at [`MAX_RECENT`].
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn recent(&self, limit: usize) -> Result<Vec<CommandRecord>> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let limit = i64::try_from(limit.min(MAX_RECENT)).unwrap_or(20);
        let mut stmt = conn.prepare(
            r"
            SELECT id, user_id, command, response, action, created_at
            FROM voice_commands
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            ",
        )?;

        let rows = stmt.query_map(rusqlite::params![limit], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    /// Number of logged commands
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn count(&self) -> Result<u64> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM voice_commands", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommandRecord> {
        let created_at: String = row.get(5)?;
        let created_at = NaiveDateTime::parse_from_str(&created_at, "%Y-%m-%d %H:%M:%S")
            .map_or_else(|_| Utc::now(), |dt| dt.and_utc());

        Ok(CommandRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            command: row.get(2)?,
            response: row.get(3)?,
            action: row.get(4)?,
            created_at,
        })
    }
}

impl CommandLog for CommandLogRepo {
    fn append(
        &self,
        command: &str,
        response: &CommandResponse,
        user_id: Option<&str>,
    ) -> Result<()> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        conn.execute(
            r"
            INSERT INTO voice_commands (id, user_id, command, response, action)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            rusqlite::params![
                id,
                user_id,
                command,
                response.response,
                response.action.as_str()
            ],
        )?;

        tracing::debug!(id = %id, command, "command logged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    fn repo() -> CommandLogRepo {
        CommandLogRepo::new(init_memory().unwrap())
    }

    #[test]
    fn test_append_and_recent() {
        let log = repo();
        log.append("hello", &CommandResponse::speak("Hello!"), Some("u1"))
            .unwrap();
        log.append(
            "open google",
            &CommandResponse::link("Opening Google", "https://www.google.com"),
            None,
        )
        .unwrap();

        let records = log.recent(20).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].command, "open google");
        assert_eq!(records[0].action, "SUGGEST_URL");
        assert!(records[0].user_id.is_none());
        assert_eq!(records[1].user_id.as_deref(), Some("u1"));
        assert_eq!(log.count().unwrap(), 2);
    }

    #[test]
    fn test_recent_respects_limit() {
        let log = repo();
        for i in 0..5 {
            log.append(&format!("command {i}"), &CommandResponse::speak("ok"), None)
                .unwrap();
        }

        let records = log.recent(2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].command, "command 4");
    }

    struct Broken;

    impl CommandLog for Broken {
        fn append(&self, _: &str, _: &CommandResponse, _: Option<&str>) -> Result<()> {
            Err(Error::Database("disk full".to_string()))
        }
    }

    #[test]
    fn test_record_command_swallows_errors() {
        record_command(&Broken, "hello", &CommandResponse::speak("Hi"), None);
        record_command(&NullCommandLog, "hello", &CommandResponse::speak("Hi"), None);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let log = repo();
        log.append("hi", &CommandResponse::speak("Hello"), Some("u9"))
            .unwrap();

        let json = serde_json::to_value(&log.recent(1).unwrap()[0]).unwrap();
        assert_eq!(json["userId"], "u9");
        assert!(json["createdAt"].is_string());
    }
}
