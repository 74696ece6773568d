//! Lifecycle of file metadata records.
//!
//! A record is either absent or present at some `Version >= 1`. Update,
//! UpdateAccess and Transfer each bump the version by exactly one. Delete
//! removes the record from world state; its history stays.

use super::{
    ContractError, ContractResult,
    access::{FileAction, authorize_file},
    history, list, load, store,
};
use crate::{
    ledger::{AssetLedger, Expectation},
    models::{AccessUserList, AssetHistoryEntry, AssetRecord, FileAsset, QueryResult},
};
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use tracing::info;

/// Arguments of `CreateFileAsset`.
#[derive(Clone, Debug)]
pub struct NewFileAsset {
    pub id: String,
    pub file_name: String,
    pub mime_type: String,
    pub content_address: String,
    pub shared_key: String,
    pub owner_id: String,
    pub access_user_list: AccessUserList,
    pub timestamp: DateTime<Utc>,
}

/// The fields `UpdateFileAsset` overwrites.
#[derive(Clone, Debug)]
pub struct FileContentUpdate {
    pub file_name: String,
    pub mime_type: String,
    pub content_address: String,
    pub shared_key: String,
}

fn as_file(record: AssetRecord) -> Option<FileAsset> {
    match record {
        AssetRecord::File(asset) => Some(asset),
        AssetRecord::Key(_) => None,
    }
}

async fn load_file<L: AssetLedger>(ledger: &L, file_id: &str) -> ContractResult<(FileAsset, u64)> {
    let (record, revision) = load(ledger, file_id).await?;
    let asset = as_file(record).ok_or_else(|| {
        ContractError::Malformed(format!("id = {file_id} is not a file asset"))
    })?;
    Ok((asset, revision))
}

/// Write back a mutated record on top of the revision it was read at.
async fn commit_file<L: AssetLedger>(
    ledger: &L,
    asset: FileAsset,
    read_at: u64,
) -> ContractResult<FileAsset> {
    let record = AssetRecord::File(asset.clone());
    store(ledger, &asset.id, &record, Expectation::Revision(read_at)).await?;
    Ok(asset)
}

/// Create a record at version 1. An existing record under the same id is
/// never overwritten.
pub async fn create_file_asset<L: AssetLedger>(
    ledger: &L,
    new: NewFileAsset,
) -> ContractResult<FileAsset> {
    let asset = FileAsset {
        id: new.id,
        file_name: new.file_name,
        mime_type: new.mime_type,
        content_address: new.content_address,
        shared_key: new.shared_key,
        updated_by: new.owner_id.clone(),
        owner_id: new.owner_id,
        version: 1,
        access_user_list: new.access_user_list,
        create_date_time: new.timestamp,
        last_updated: new.timestamp,
    };
    let record = AssetRecord::File(asset.clone());
    store(ledger, &asset.id, &record, Expectation::Absent).await?;
    info!(file_id = %asset.id, owner = %asset.owner_id, "file asset created");
    Ok(asset)
}

pub async fn read_file_asset<L: AssetLedger>(ledger: &L, file_id: &str) -> ContractResult<FileAsset> {
    load_file(ledger, file_id).await.map(|(asset, _)| asset)
}

pub async fn update_file_asset<L: AssetLedger>(
    ledger: &L,
    actor: &str,
    file_id: &str,
    update: FileContentUpdate,
    timestamp: DateTime<Utc>,
) -> ContractResult<FileAsset> {
    let (mut asset, revision) = load_file(ledger, file_id).await?;
    authorize_file(&asset, actor, FileAction::Update)?;

    asset.file_name = update.file_name;
    asset.mime_type = update.mime_type;
    asset.content_address = update.content_address;
    asset.shared_key = update.shared_key;
    asset.version += 1;
    asset.last_updated = timestamp;
    asset.updated_by = actor.to_string();

    let asset = commit_file(ledger, asset, revision).await?;
    info!(file_id, actor, version = asset.version, "file asset updated");
    Ok(asset)
}

/// Replace the share set and the access list wholesale. The actor must be
/// granted on the list as it stands before the change.
pub async fn update_file_access_asset<L: AssetLedger>(
    ledger: &L,
    actor: &str,
    file_id: &str,
    shared_key: String,
    access_user_list: AccessUserList,
    timestamp: DateTime<Utc>,
) -> ContractResult<FileAsset> {
    let (mut asset, revision) = load_file(ledger, file_id).await?;
    authorize_file(&asset, actor, FileAction::ShareAccess)?;

    asset.shared_key = shared_key;
    asset.access_user_list = access_user_list;
    asset.version += 1;
    asset.last_updated = timestamp;
    asset.updated_by = actor.to_string();

    let asset = commit_file(ledger, asset, revision).await?;
    info!(file_id, actor, version = asset.version, "file access updated");
    Ok(asset)
}

/// Hand ownership to `new_owner_id`. The access list is left as it is, so
/// the new owner gains no read or update rights from this alone.
pub async fn transfer_file_asset<L: AssetLedger>(
    ledger: &L,
    actor: &str,
    file_id: &str,
    new_owner_id: &str,
    timestamp: DateTime<Utc>,
) -> ContractResult<FileAsset> {
    let (mut asset, revision) = load_file(ledger, file_id).await?;
    authorize_file(&asset, actor, FileAction::Transfer)?;

    asset.owner_id = new_owner_id.to_string();
    asset.version += 1;
    asset.last_updated = timestamp;
    asset.updated_by = actor.to_string();

    let asset = commit_file(ledger, asset, revision).await?;
    info!(file_id, from = actor, to = new_owner_id, "file asset transferred");
    Ok(asset)
}

pub async fn delete_file_asset<L: AssetLedger>(
    ledger: &L,
    actor: &str,
    file_id: &str,
) -> ContractResult<()> {
    let (asset, revision) = load_file(ledger, file_id).await?;
    authorize_file(&asset, actor, FileAction::Delete)?;

    ledger
        .delete(file_id, Expectation::Revision(revision))
        .await?;
    info!(file_id, actor, "file asset deleted");
    Ok(())
}

/// Every file record in the ledger, streamed page by page.
pub fn list_file_assets<L: AssetLedger>(
    ledger: &L,
) -> impl Stream<Item = ContractResult<QueryResult<FileAsset>>> + Send + '_ {
    list(ledger, AssetRecord::FILE, as_file)
}

pub async fn get_all_file_assets<L: AssetLedger>(
    ledger: &L,
) -> ContractResult<Vec<QueryResult<FileAsset>>> {
    list_file_assets(ledger).try_collect().await
}

pub async fn get_file_asset_history<L: AssetLedger>(
    ledger: &L,
    file_id: &str,
) -> ContractResult<Vec<AssetHistoryEntry<FileAsset>>> {
    history(ledger, file_id, as_file).await
}
