//! Single-process ledger: a sorted map for world state plus one append-only
//! vector of entries per key. Same conflict semantics as the SQLite backend.

use super::{
    AssetLedger, Commit, Expectation, HistoryEntry, LedgerError, LedgerResult, ScanPage,
    StateEntry, VersionedValue, expectation_holds,
};
use chrono::Utc;
use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct State {
    world: BTreeMap<String, VersionedValue>,
    history: HashMap<String, Vec<HistoryEntry>>,
}

impl State {
    /// Revisions keep counting across deletes, so a re-created key never
    /// reuses one.
    fn next_revision(&self, key: &str) -> u64 {
        self.history.get(key).map_or(0, |h| h.len() as u64) + 1
    }

    fn check(&self, key: &str, expect: Expectation) -> LedgerResult<()> {
        let current = self.world.get(key).map(|v| v.revision);
        if expectation_holds(expect, current) {
            Ok(())
        } else {
            Err(LedgerError::Conflict {
                key: key.to_string(),
            })
        }
    }

    fn append(&mut self, key: &str, value: Option<Vec<u8>>) -> Commit {
        let commit = Commit {
            tx_id: Uuid::new_v4().to_string(),
            revision: self.next_revision(key),
            timestamp: Utc::now(),
        };
        self.history
            .entry(key.to_string())
            .or_default()
            .push(HistoryEntry {
                tx_id: commit.tx_id.clone(),
                timestamp: commit.timestamp,
                is_delete: value.is_none(),
                value,
            });
        commit
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<State>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssetLedger for MemoryLedger {
    async fn get(&self, key: &str) -> LedgerResult<Option<VersionedValue>> {
        Ok(self.state.read().await.world.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>, expect: Expectation) -> LedgerResult<Commit> {
        let mut state = self.state.write().await;
        state.check(key, expect)?;
        let commit = state.append(key, Some(value.clone()));
        state.world.insert(
            key.to_string(),
            VersionedValue {
                value,
                revision: commit.revision,
            },
        );
        debug!(key, revision = commit.revision, "memory ledger put");
        Ok(commit)
    }

    async fn delete(&self, key: &str, expect: Expectation) -> LedgerResult<Commit> {
        let mut state = self.state.write().await;
        state.check(key, expect)?;
        let commit = state.append(key, None);
        state.world.remove(key);
        debug!(key, revision = commit.revision, "memory ledger delete");
        Ok(commit)
    }

    async fn scan_page(
        &self,
        prefix: &str,
        after: Option<&str>,
        limit: usize,
    ) -> LedgerResult<ScanPage> {
        let state = self.state.read().await;
        let limit = limit.max(1);
        let mut entries: Vec<StateEntry> = state
            .world
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(k, _)| after.is_none_or(|a| k.as_str() > a))
            .take(limit + 1)
            .map(|(k, v)| StateEntry {
                key: k.clone(),
                value: v.value.clone(),
            })
            .collect();

        let next_cursor = if entries.len() > limit {
            entries.truncate(limit);
            entries.last().map(|e| e.key.clone())
        } else {
            None
        };
        Ok(ScanPage {
            entries,
            next_cursor,
        })
    }

    async fn history(&self, key: &str) -> LedgerResult<Vec<HistoryEntry>> {
        Ok(self
            .state
            .read()
            .await
            .history
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn ping(&self) -> LedgerResult<()> {
        Ok(())
    }
}
