//! Last-decision-id persistence, keyed by model name.
//!
//! Lets `add_reward_for_model` attribute a reward to the most recent tracked
//! decision without the caller holding the original `Decision`. Entries are
//! independent keyed upserts with no read-modify-write; concurrent writers
//! (same or different model name) resolve last-write-wins.

use std::path::PathBuf;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use rankwerk_core::{RankwerkError, Result};

fn default_db_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| ".".into());
    let base: PathBuf = std::env::var("RANKWERK_DATA")
        .map(Into::into)
        .unwrap_or(home.join(".rankwerk"));
    base.join("state").join("rankwerk.db")
}

#[derive(Debug, Clone)]
pub struct DecisionStore {
    db_path: PathBuf,
}

impl Default for DecisionStore {
    fn default() -> Self {
        Self::open(default_db_path())
    }
}

impl DecisionStore {
    pub fn open(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    // Synchronous connection setup, called inside spawn_blocking.
    fn conn(&self) -> rusqlite::Result<Connection> {
        if let Some(dir) = self.db_path.parent() {
            std::fs::create_dir_all(dir).ok();
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS last_decision (
              model_name TEXT PRIMARY KEY,
              decision_id TEXT NOT NULL,
              updated_at INTEGER NOT NULL
            );
        ",
        )?;
        Ok(conn)
    }

    /// Upserts the id for `model_name`. Async wrapper around blocking
    /// SQLite calls.
    pub async fn persist_decision_id(&self, model_name: &str, decision_id: &str) -> Result<()> {
        let store = self.clone();
        let model_name = model_name.to_owned();
        let decision_id = decision_id.to_owned();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn().map_err(db_err)?;
            let now = chrono::Utc::now().timestamp();
            conn.execute(
                "INSERT INTO last_decision(model_name, decision_id, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(model_name) DO UPDATE SET decision_id=excluded.decision_id, updated_at=excluded.updated_at",
                params![model_name, decision_id, now],
            )
            .map_err(db_err)?;
            Ok(())
        })
        .await
        .map_err(|err| RankwerkError::Db(format!("spawn_blocking join failed: {err}")))?
    }

    /// Fire-and-forget variant used on the tracking path, which must not
    /// block the caller. Failures are logged only.
    pub fn persist_decision_id_detached(&self, model_name: String, decision_id: String) {
        let store = self.clone();
        tokio::spawn(async move {
            if let Err(err) = store.persist_decision_id(&model_name, &decision_id).await {
                warn!(model = %model_name, error = %err, "failed to persist decision id");
            }
        });
    }

    /// Most recent decision id for `model_name`, if any was ever tracked.
    pub async fn last_decision_id(&self, model_name: &str) -> Result<Option<String>> {
        let store = self.clone();
        let model_name = model_name.to_owned();
        tokio::task::spawn_blocking(move || {
            let conn = store.conn().map_err(db_err)?;
            conn.query_row(
                "SELECT decision_id FROM last_decision WHERE model_name=?1",
                params![model_name],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)
        })
        .await
        .map_err(|err| RankwerkError::Db(format!("spawn_blocking join failed: {err}")))?
    }
}

fn db_err(err: rusqlite::Error) -> RankwerkError {
    RankwerkError::Db(err.to_string())
}
