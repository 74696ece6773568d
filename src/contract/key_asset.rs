//! Lifecycle of per-custodian share records.
//!
//! Reads are restricted to the custodian (`OwnerKeyID`). Transfer and Delete
//! require the caller to be the recorded file owner (`OwnerFileID`).
//! Update performs no actor check at all; whoever can submit it can rewrite
//! the share and its file version.

use super::{
    ContractError, ContractResult,
    access::{KeyAction, authorize_key},
    history, list, load, store,
};
use crate::{
    ledger::{AssetLedger, Expectation},
    models::{AssetHistoryEntry, AssetRecord, KeyAsset, QueryResult},
};
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use tracing::info;

/// Arguments of `CreateKeyAsset`.
#[derive(Clone, Debug)]
pub struct NewKeyAsset {
    pub id: String,
    pub owner_key_id: String,
    pub file_id: String,
    pub owner_file_id: String,
    pub file_version: u64,
    pub key_value: String,
    pub timestamp: DateTime<Utc>,
}

fn as_key(record: AssetRecord) -> Option<KeyAsset> {
    match record {
        AssetRecord::Key(asset) => Some(asset),
        AssetRecord::File(_) => None,
    }
}

async fn load_key<L: AssetLedger>(ledger: &L, id: &str) -> ContractResult<(KeyAsset, u64)> {
    let (record, revision) = load(ledger, id).await?;
    let asset = as_key(record)
        .ok_or_else(|| ContractError::Malformed(format!("id = {id} is not a key asset")))?;
    Ok((asset, revision))
}

async fn commit_key<L: AssetLedger>(
    ledger: &L,
    asset: KeyAsset,
    read_at: u64,
) -> ContractResult<KeyAsset> {
    let record = AssetRecord::Key(asset.clone());
    store(ledger, &asset.id, &record, Expectation::Revision(read_at)).await?;
    Ok(asset)
}

pub async fn create_key_asset<L: AssetLedger>(
    ledger: &L,
    new: NewKeyAsset,
) -> ContractResult<KeyAsset> {
    let asset = KeyAsset {
        id: new.id,
        last_updated_by: new.owner_key_id.clone(),
        owner_key_id: new.owner_key_id,
        file_id: new.file_id,
        owner_file_id: new.owner_file_id,
        file_version: new.file_version,
        key_value: new.key_value,
        create_date_time: new.timestamp,
        last_updated: new.timestamp,
    };
    store(
        ledger,
        &asset.id,
        &AssetRecord::Key(asset.clone()),
        Expectation::Absent,
    )
    .await?;
    info!(key_id = %asset.id, file_id = %asset.file_id, custodian = %asset.owner_key_id, "key asset created");
    Ok(asset)
}

pub async fn read_key_asset<L: AssetLedger>(
    ledger: &L,
    actor: &str,
    id: &str,
) -> ContractResult<KeyAsset> {
    let (asset, _) = load_key(ledger, id).await?;
    authorize_key(&asset, actor, KeyAction::Read)?;
    Ok(asset)
}

/// Rewrite the share and its file version. No actor check: any caller may
/// do this, and is recorded as `LastUpdatedBy`.
pub async fn update_key_asset<L: AssetLedger>(
    ledger: &L,
    actor: &str,
    id: &str,
    file_version: u64,
    key_value: String,
    timestamp: DateTime<Utc>,
) -> ContractResult<KeyAsset> {
    let (mut asset, revision) = load_key(ledger, id).await?;

    asset.file_version = file_version;
    asset.key_value = key_value;
    asset.last_updated = timestamp;
    asset.last_updated_by = actor.to_string();

    let asset = commit_key(ledger, asset, revision).await?;
    info!(key_id = id, actor, file_version, "key asset updated");
    Ok(asset)
}

/// Re-point the record at a new file owner; used after the file itself
/// changed hands.
pub async fn update_file_owner_key_asset<L: AssetLedger>(
    ledger: &L,
    actor: &str,
    id: &str,
    new_owner_file_id: &str,
    timestamp: DateTime<Utc>,
) -> ContractResult<KeyAsset> {
    let (mut asset, revision) = load_key(ledger, id).await?;
    authorize_key(&asset, actor, KeyAction::TransferOwner)?;

    asset.owner_file_id = new_owner_file_id.to_string();
    asset.last_updated = timestamp;
    asset.last_updated_by = actor.to_string();

    let asset = commit_key(ledger, asset, revision).await?;
    info!(key_id = id, from = actor, to = new_owner_file_id, "key asset file owner changed");
    Ok(asset)
}

pub async fn delete_key_asset<L: AssetLedger>(
    ledger: &L,
    actor: &str,
    id: &str,
) -> ContractResult<()> {
    let (asset, revision) = load_key(ledger, id).await?;
    authorize_key(&asset, actor, KeyAction::Delete)?;

    ledger.delete(id, Expectation::Revision(revision)).await?;
    info!(key_id = id, actor, "key asset deleted");
    Ok(())
}

pub fn list_key_assets<L: AssetLedger>(
    ledger: &L,
) -> impl Stream<Item = ContractResult<QueryResult<KeyAsset>>> + Send + '_ {
    list(ledger, AssetRecord::KEY, as_key)
}

pub async fn get_all_key_assets<L: AssetLedger>(
    ledger: &L,
) -> ContractResult<Vec<QueryResult<KeyAsset>>> {
    list_key_assets(ledger).try_collect().await
}

pub async fn get_key_asset_history<L: AssetLedger>(
    ledger: &L,
    id: &str,
) -> ContractResult<Vec<AssetHistoryEntry<KeyAsset>>> {
    history(ledger, id, as_key).await
}
