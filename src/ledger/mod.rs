//! The replicated key-value ledger as seen by the asset state machines.
//!
//! A backend keeps a *world state* (current value per key) and an
//! append-only *history* per key. Every mutation names an [`Expectation`]
//! about the key's current revision; a backend rejects the write with
//! [`LedgerError::Conflict`] when the expectation no longer holds. That is
//! the single-process stand-in for the MVCC read-set check an ordering
//! service would perform. Nothing here retries.

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt, TryStreamExt, stream};
use std::future::Future;
use thiserror::Error;

pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;

/// Page size used by [`scan_all`].
pub const SCAN_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("concurrent modification of `{key}`")]
    Conflict { key: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// What a writer believes about the key it is about to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// Blind write.
    Any,
    /// The key must not currently hold a value.
    Absent,
    /// The key must currently hold a value at exactly this revision.
    Revision(u64),
}

/// A world-state value together with the revision that wrote it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub revision: u64,
}

/// Receipt for an accepted mutation.
#[derive(Clone, Debug)]
pub struct Commit {
    pub tx_id: String,
    pub revision: u64,
    pub timestamp: DateTime<Utc>,
}

/// One immutable history entry. Deletes carry no value.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub value: Option<Vec<u8>>,
    pub is_delete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// One page of a range scan. `next_cursor` is the last key returned when
/// more keys may follow.
#[derive(Debug, Default)]
pub struct ScanPage {
    pub entries: Vec<StateEntry>,
    pub next_cursor: Option<String>,
}

/// Contract every ledger backend implements.
pub trait AssetLedger: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = LedgerResult<Option<VersionedValue>>> + Send;

    fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        expect: Expectation,
    ) -> impl Future<Output = LedgerResult<Commit>> + Send;

    fn delete(
        &self,
        key: &str,
        expect: Expectation,
    ) -> impl Future<Output = LedgerResult<Commit>> + Send;

    /// Keys starting with `prefix`, strictly after `after`, in key order.
    fn scan_page(
        &self,
        prefix: &str,
        after: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = LedgerResult<ScanPage>> + Send;

    /// Oldest first.
    fn history(&self, key: &str) -> impl Future<Output = LedgerResult<Vec<HistoryEntry>>> + Send;

    fn ping(&self) -> impl Future<Output = LedgerResult<()>> + Send;
}

/// Lazily walk every world-state entry under `prefix`, one page at a time.
pub fn scan_all<'a, L>(
    ledger: &'a L,
    prefix: &'a str,
) -> impl Stream<Item = LedgerResult<StateEntry>> + Send + 'a
where
    L: AssetLedger,
{
    stream::try_unfold(Some(None::<String>), move |cursor| async move {
        let Some(after) = cursor else {
            return Ok::<_, LedgerError>(None);
        };
        let page = ledger
            .scan_page(prefix, after.as_deref(), SCAN_PAGE_SIZE)
            .await?;
        let next = page.next_cursor.map(Some);
        let entries = stream::iter(page.entries).map(Ok::<_, LedgerError>);
        Ok(Some((entries, next)))
    })
    .try_flatten()
}

/// Shared expectation check used by the backends.
pub(crate) fn expectation_holds(expect: Expectation, current: Option<u64>) -> bool {
    match (expect, current) {
        (Expectation::Any, _) => true,
        (Expectation::Absent, None) => true,
        (Expectation::Revision(want), Some(have)) => want == have,
        _ => false,
    }
}
