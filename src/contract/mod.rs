//! Asset state machines executed against an [`AssetLedger`].
//!
//! Every operation takes the ledger handle explicitly. A mutation reads the
//! current value, checks authorization, and writes back with
//! `Expectation::Revision` of what it read, so a concurrent writer turns into
//! [`ContractError::ConcurrentModification`] instead of a lost update.
//! Read-only operations never write.

pub mod access;
pub mod dispatch;
pub mod file_asset;
pub mod key_asset;

use crate::{
    ledger::{AssetLedger, Commit, Expectation, LedgerError, scan_all},
    models::{AssetHistoryEntry, AssetRecord, QueryResult},
};
use futures::{Stream, TryStreamExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("the asset `{0}` does not exist")]
    NotFound(String),
    #[error("the asset `{0}` already exists")]
    AlreadyExists(String),
    #[error("`{actor}` has no permission to {action} `{id}`")]
    PermissionDenied {
        actor: String,
        action: &'static str,
        id: String,
    },
    #[error("data can't be processed: {0}")]
    Malformed(String),
    #[error("`{0}` was modified concurrently; resubmit the transaction")]
    ConcurrentModification(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for ContractError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Conflict { key } => ContractError::ConcurrentModification(key),
            other => ContractError::Ledger(other),
        }
    }
}

pub type ContractResult<T> = Result<T, ContractError>;

fn decode(id: &str, bytes: &[u8]) -> ContractResult<AssetRecord> {
    AssetRecord::from_bytes(bytes)
        .map_err(|err| ContractError::Malformed(format!("id = {id}: {err}")))
}

/// Current record at `id` and the revision it was read at.
async fn load<L: AssetLedger>(ledger: &L, id: &str) -> ContractResult<(AssetRecord, u64)> {
    let current = ledger
        .get(id)
        .await?
        .ok_or_else(|| ContractError::NotFound(id.to_string()))?;
    Ok((decode(id, &current.value)?, current.revision))
}

async fn store<L: AssetLedger>(
    ledger: &L,
    id: &str,
    record: &AssetRecord,
    expect: Expectation,
) -> ContractResult<Commit> {
    let bytes = record
        .to_bytes()
        .map_err(|err| ContractError::Malformed(format!("id = {id}: {err}")))?;
    match ledger.put(id, bytes, expect).await {
        Err(LedgerError::Conflict { .. }) if expect == Expectation::Absent => {
            Err(ContractError::AlreadyExists(id.to_string()))
        }
        other => Ok(other?),
    }
}

/// Decode the full audit trail of `id`, keeping only entries of one record
/// kind.
async fn history<L, T>(
    ledger: &L,
    id: &str,
    extract: fn(AssetRecord) -> Option<T>,
) -> ContractResult<Vec<AssetHistoryEntry<T>>>
where
    L: AssetLedger,
{
    let entries = ledger.history(id).await?;
    entries
        .into_iter()
        .map(|entry| {
            let value = match entry.value {
                Some(bytes) => Some(extract(decode(id, &bytes)?).ok_or_else(|| {
                    ContractError::Malformed(format!("id = {id}: history holds another record type"))
                })?),
                None => None,
            };
            Ok(AssetHistoryEntry {
                tx_id: entry.tx_id,
                timestamp: entry.timestamp,
                is_delete: entry.is_delete,
                value,
            })
        })
        .collect()
}

/// Lazily list every record tagged `doc_type`. Untagged or differently
/// tagged values belong to other writers and are skipped; a value carrying
/// the right tag that fails to decode is an error.
fn list<'a, L, T>(
    ledger: &'a L,
    doc_type: &'static str,
    extract: fn(AssetRecord) -> Option<T>,
) -> impl Stream<Item = ContractResult<QueryResult<T>>> + Send + 'a
where
    L: AssetLedger,
    T: Send + 'a,
{
    scan_all(ledger, "")
        .map_err(ContractError::from)
        .try_filter_map(move |entry| async move {
            if AssetRecord::peek_doc_type(&entry.value).as_deref() != Some(doc_type) {
                return Ok(None);
            }
            let record = extract(decode(&entry.key, &entry.value)?).ok_or_else(|| {
                ContractError::Malformed(format!("id = {}: tag does not match body", entry.key))
            })?;
            Ok(Some(QueryResult {
                key: entry.key,
                record,
            }))
        })
}
