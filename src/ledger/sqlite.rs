//! SQLite-backed ledger.
//!
//! `world_state` holds the current value and revision per key; `key_history`
//! is insert-only. Each mutation runs in one transaction that checks the
//! caller's expectation, appends the history row and updates world state.
//! Transactions start with `BEGIN IMMEDIATE`, so writers queue on the write
//! lock and the later one sees the earlier one's revision. A writer that
//! still loses (busy timeout, or the `UNIQUE(key, revision)` guard) gets
//! `Conflict`.

use super::{
    AssetLedger, Commit, Expectation, HistoryEntry, LedgerError, LedgerResult, ScanPage,
    StateEntry, VersionedValue, expectation_holds,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(FromRow)]
struct StateRow {
    key: String,
    value: Vec<u8>,
    revision: i64,
}

#[derive(FromRow)]
struct HistoryRow {
    tx_id: String,
    committed_at: DateTime<Utc>,
    value: Option<Vec<u8>>,
    is_delete: bool,
}

#[derive(Clone)]
pub struct SqliteLedger {
    pub db: Arc<SqlitePool>,
}

impl SqliteLedger {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Apply the embedded schema. Every statement is idempotent.
    pub async fn migrate(&self) -> LedgerResult<()> {
        let statements = SCHEMA
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        info!("Running {} migration statements...", statements.len());
        for stmt in statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    async fn commit(
        &self,
        key: &str,
        value: Option<Vec<u8>>,
        expect: Expectation,
    ) -> LedgerResult<Commit> {
        match self.try_commit(key, value, expect).await {
            Err(LedgerError::Sqlx(err)) if is_busy(&err) => {
                debug!(key, "write lock contended: {err}");
                Err(LedgerError::Conflict {
                    key: key.to_string(),
                })
            }
            other => other,
        }
    }

    async fn try_commit(
        &self,
        key: &str,
        value: Option<Vec<u8>>,
        expect: Expectation,
    ) -> LedgerResult<Commit> {
        let conflict = || LedgerError::Conflict {
            key: key.to_string(),
        };
        let mut tx = self.db.begin_with("BEGIN IMMEDIATE").await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT revision FROM world_state WHERE key = ?")
                .bind(key)
                .fetch_optional(&mut *tx)
                .await?;
        if !expectation_holds(expect, current.map(|r| r as u64)) {
            return Err(conflict());
        }

        let last: Option<i64> =
            sqlx::query_scalar("SELECT MAX(revision) FROM key_history WHERE key = ?")
                .bind(key)
                .fetch_one(&mut *tx)
                .await?;
        let revision = last.unwrap_or(0) + 1;

        let commit = Commit {
            tx_id: Uuid::new_v4().to_string(),
            revision: revision as u64,
            timestamp: Utc::now(),
        };

        let appended = sqlx::query(
            "INSERT INTO key_history (key, revision, tx_id, committed_at, value, is_delete)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(key)
        .bind(revision)
        .bind(&commit.tx_id)
        .bind(commit.timestamp)
        .bind(value.as_deref())
        .bind(value.is_none())
        .execute(&mut *tx)
        .await;
        match appended {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => return Err(conflict()),
            Err(err) => return Err(LedgerError::Sqlx(err)),
        }

        match &value {
            Some(bytes) => {
                sqlx::query(
                    "INSERT INTO world_state (key, value, revision) VALUES (?, ?, ?)
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        revision = excluded.revision",
                )
                .bind(key)
                .bind(bytes.as_slice())
                .bind(revision)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM world_state WHERE key = ?")
                    .bind(key)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        debug!(key, revision, tx_id = %commit.tx_id, "sqlite ledger commit");
        Ok(commit)
    }
}

impl AssetLedger for SqliteLedger {
    async fn get(&self, key: &str) -> LedgerResult<Option<VersionedValue>> {
        let row = sqlx::query_as::<_, StateRow>(
            "SELECT key, value, revision FROM world_state WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&*self.db)
        .await?;
        Ok(row.map(|r| VersionedValue {
            value: r.value,
            revision: r.revision as u64,
        }))
    }

    async fn put(&self, key: &str, value: Vec<u8>, expect: Expectation) -> LedgerResult<Commit> {
        self.commit(key, Some(value), expect).await
    }

    async fn delete(&self, key: &str, expect: Expectation) -> LedgerResult<Commit> {
        self.commit(key, None, expect).await
    }

    async fn scan_page(
        &self,
        prefix: &str,
        after: Option<&str>,
        limit: usize,
    ) -> LedgerResult<ScanPage> {
        let limit = limit.max(1);
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT key, value, revision FROM world_state WHERE 1 = 1");
        if !prefix.is_empty() {
            builder.push(" AND substr(key, 1, length(");
            builder.push_bind(prefix);
            builder.push(")) = ");
            builder.push_bind(prefix);
        }
        if let Some(after) = after {
            builder.push(" AND key > ");
            builder.push_bind(after);
        }
        builder.push(" ORDER BY key ASC LIMIT ");
        builder.push_bind((limit + 1) as i64);

        let mut rows: Vec<StateRow> = builder.build_query_as().fetch_all(&*self.db).await?;

        let mut next_cursor = None;
        if rows.len() > limit {
            rows.truncate(limit);
            next_cursor = rows.last().map(|r| r.key.clone());
        }
        Ok(ScanPage {
            entries: rows
                .into_iter()
                .map(|r| StateEntry {
                    key: r.key,
                    value: r.value,
                })
                .collect(),
            next_cursor,
        })
    }

    async fn history(&self, key: &str) -> LedgerResult<Vec<HistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT tx_id, committed_at, value, is_delete
             FROM key_history WHERE key = ? ORDER BY seq ASC",
        )
        .bind(key)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| HistoryEntry {
                tx_id: r.tx_id,
                timestamp: r.committed_at,
                value: r.value,
                is_delete: r.is_delete,
            })
            .collect())
    }

    async fn ping(&self) -> LedgerResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        Ok(())
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

/// SQLITE_BUSY (5) or SQLITE_LOCKED (6): the writer lost the write lock.
fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            matches!(code.as_deref(), Some("5") | Some("6"))
                || db_err.message().to_ascii_lowercase().contains("locked")
        }
        _ => false,
    }
}
