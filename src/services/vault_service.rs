//! src/services/vault_service.rs
//!
//! Upload and download workflow around the asset ledger.
//!
//! Upload: encrypt → split the key (n, k) → store ciphertext → create the
//! file record with the share set escrowed in `SharedKey`.
//! Download: read record → access check → enough shares? → combine →
//! fetch ciphertext → decrypt.
//!
//! Shares can additionally be handed to individual custodians as key
//! records. File and key records are separate ledger transactions; a failure
//! between them leaves partial state that callers must reconcile.

use crate::{
    contract::{
        ContractError,
        access::{FileAction, authorize_file},
        file_asset::{
            NewFileAsset, create_file_asset, delete_file_asset, get_file_asset_history, list_file_assets,
            read_file_asset, transfer_file_asset, update_file_access_asset,
        },
        key_asset::{
            NewKeyAsset, create_key_asset, delete_key_asset, read_key_asset,
            update_file_owner_key_asset,
        },
    },
    crypto::{
        cipher::{self, CipherError},
        shamir::{self, Share, SharingError, SharingParams, decode_share_set, encode_share_set},
    },
    ledger::AssetLedger,
    models::{AccessUserList, AssetHistoryEntry, FileAsset, KeyAsset},
    services::content_store::{ContentError, ContentStore, read_all},
};
use bytes::Bytes;
use chrono::Utc;
use futures::TryStreamExt;
use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("{supplied} shares supplied, at least {required} required")]
    InsufficientShares { required: u8, supplied: usize },
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Sharing(#[from] SharingError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub file_id: String,
    pub content_address: String,
    pub version: u64,
}

#[derive(Debug)]
pub struct DownloadedFile {
    pub record: FileAsset,
    pub content: Vec<u8>,
}

/// Ledger id of the custody record holding share `share_id` of `file_id`.
pub fn custodian_key_id(file_id: &str, share_id: u8) -> String {
    format!("{file_id}/share/{share_id}")
}

pub struct VaultService<L, C> {
    pub ledger: Arc<L>,
    pub content: Arc<C>,
    pub sharing: SharingParams,
}

impl<L, C> Clone for VaultService<L, C> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            content: self.content.clone(),
            sharing: self.sharing,
        }
    }
}

impl<L: AssetLedger, C: ContentStore> VaultService<L, C> {
    pub fn new(ledger: Arc<L>, content: Arc<C>, sharing: SharingParams) -> Self {
        Self {
            ledger,
            content,
            sharing,
        }
    }

    /// Encrypt, escrow and register a new file owned by `actor`.
    pub async fn upload(
        &self,
        actor: &str,
        file_name: &str,
        mime_type: &str,
        plaintext: Bytes,
    ) -> VaultResult<UploadReceipt> {
        let sealed = cipher::encrypt(&plaintext);
        let shares = shamir::split(
            sealed.key.as_slice(),
            self.sharing.total_shares(),
            self.sharing.threshold(),
        )?;
        let content_address = self.content.put(Bytes::from(sealed.ciphertext)).await?;

        let file_id = Uuid::new_v4().to_string();
        let asset = create_file_asset(
            &*self.ledger,
            NewFileAsset {
                id: file_id.clone(),
                file_name: file_name.to_string(),
                mime_type: mime_type.to_string(),
                content_address: content_address.clone(),
                shared_key: encode_share_set(&shares),
                owner_id: actor.to_string(),
                access_user_list: AccessUserList::only(actor),
                timestamp: Utc::now(),
            },
        )
        .await?;

        info!(%file_id, actor, size = plaintext.len(), "file uploaded");
        Ok(UploadReceipt {
            file_id,
            content_address,
            version: asset.version,
        })
    }

    /// Records the actor currently holds a grant on.
    pub async fn list_accessible(&self, actor: &str) -> VaultResult<Vec<FileAsset>> {
        let files: Vec<FileAsset> = list_file_assets(&*self.ledger)
            .try_filter_map(|row| async move {
                Ok(row
                    .record
                    .access_user_list
                    .is_granted(actor)
                    .then_some(row.record))
            })
            .try_collect()
            .await?;
        debug!(actor, count = files.len(), "listed accessible files");
        Ok(files)
    }

    /// Reconstruct the key from caller-supplied share tokens and return the
    /// plaintext. A wrong-but-complete share set may decrypt to garbage
    /// instead of failing.
    pub async fn download(
        &self,
        actor: &str,
        file_id: &str,
        share_tokens: &[String],
    ) -> VaultResult<DownloadedFile> {
        let record = read_file_asset(&*self.ledger, file_id).await?;
        authorize_file(&record, actor, FileAction::Read)?;

        let required = self.sharing.threshold();
        if share_tokens.len() < required as usize {
            warn!(file_id, actor, supplied = share_tokens.len(), "insufficient shares");
            return Err(VaultError::InsufficientShares {
                required,
                supplied: share_tokens.len(),
            });
        }

        let shares = share_tokens
            .iter()
            .map(|t| Share::decode(t))
            .collect::<Result<Vec<_>, _>>()?;
        let key = shamir::combine(&shares)?;

        let ciphertext = read_all(self.content.get(&record.content_address).await?).await?;
        let content = cipher::decrypt(&ciphertext, key.as_slice())?;

        info!(file_id, actor, "file downloaded");
        Ok(DownloadedFile { record, content })
    }

    pub async fn history(
        &self,
        actor: &str,
        file_id: &str,
    ) -> VaultResult<Vec<AssetHistoryEntry<FileAsset>>> {
        let record = read_file_asset(&*self.ledger, file_id).await?;
        authorize_file(&record, actor, FileAction::Read)?;
        Ok(get_file_asset_history(&*self.ledger, file_id).await?)
    }

    /// Grant or revoke access, keeping the escrowed share set as it is.
    pub async fn update_access(
        &self,
        actor: &str,
        file_id: &str,
        access_user_list: AccessUserList,
    ) -> VaultResult<FileAsset> {
        let record = read_file_asset(&*self.ledger, file_id).await?;
        Ok(update_file_access_asset(
            &*self.ledger,
            actor,
            file_id,
            record.shared_key,
            access_user_list,
            Utc::now(),
        )
        .await?)
    }

    /// Share ids custody records may exist under for `record`: those in its
    /// escrowed set plus the ones the current configuration would issue.
    fn custody_share_ids(&self, record: &FileAsset) -> BTreeSet<u8> {
        let mut ids: BTreeSet<u8> = (1..=self.sharing.total_shares()).collect();
        match decode_share_set(&record.shared_key) {
            Ok(shares) => ids.extend(shares.iter().map(|s| s.id)),
            Err(err) => warn!(file_id = %record.id, "escrowed share set unreadable: {err}"),
        }
        ids
    }

    /// Transfer the file, then re-point its custody records at the new
    /// owner so they stay manageable.
    pub async fn transfer(
        &self,
        actor: &str,
        file_id: &str,
        new_owner: &str,
    ) -> VaultResult<FileAsset> {
        let now = Utc::now();
        let record = transfer_file_asset(&*self.ledger, actor, file_id, new_owner, now).await?;
        for share_id in self.custody_share_ids(&record) {
            let key_id = custodian_key_id(file_id, share_id);
            match update_file_owner_key_asset(&*self.ledger, actor, &key_id, new_owner, now).await
            {
                Ok(_) => debug!(%key_id, "custody record re-pointed"),
                Err(ContractError::NotFound(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(record)
    }

    /// Delete the file record, then any custody records this service cut
    /// for it. Custody records already gone are skipped.
    pub async fn delete(&self, actor: &str, file_id: &str) -> VaultResult<()> {
        let record = read_file_asset(&*self.ledger, file_id).await?;
        delete_file_asset(&*self.ledger, actor, file_id).await?;
        for share_id in self.custody_share_ids(&record) {
            let key_id = custodian_key_id(file_id, share_id);
            match delete_key_asset(&*self.ledger, actor, &key_id).await {
                Ok(()) => debug!(%key_id, "custody record removed"),
                Err(ContractError::NotFound(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Hand share `i` of the escrowed set to `custodians[i]`, one key record
    /// each, stamped with the file's current version and owner.
    pub async fn distribute_shares(
        &self,
        actor: &str,
        file_id: &str,
        custodians: &[String],
    ) -> VaultResult<Vec<KeyAsset>> {
        let record = read_file_asset(&*self.ledger, file_id).await?;
        authorize_file(&record, actor, FileAction::ShareAccess)?;

        let shares = decode_share_set(&record.shared_key)?;
        let required = self.sharing.threshold();
        if custodians.len() < required as usize {
            return Err(VaultError::InsufficientShares {
                required,
                supplied: custodians.len(),
            });
        }
        if custodians.len() > shares.len() {
            return Err(VaultError::InvalidParameters(format!(
                "{} custodians for {} shares",
                custodians.len(),
                shares.len()
            )));
        }
        let distinct: HashSet<&String> = custodians.iter().collect();
        if distinct.len() != custodians.len() {
            return Err(VaultError::InvalidParameters(
                "custodians must be distinct".into(),
            ));
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(custodians.len());
        for (share, custodian) in shares.iter().zip(custodians) {
            let asset = create_key_asset(
                &*self.ledger,
                NewKeyAsset {
                    id: custodian_key_id(file_id, share.id),
                    owner_key_id: custodian.clone(),
                    file_id: file_id.to_string(),
                    owner_file_id: record.owner_id.clone(),
                    file_version: record.version,
                    key_value: share.encode(),
                    timestamp: now,
                },
            )
            .await?;
            created.push(asset);
        }
        info!(file_id, actor, custodians = created.len(), "shares distributed");
        Ok(created)
    }

    /// A custodian fetching the share held for them.
    pub async fn custodian_share(&self, actor: &str, key_id: &str) -> VaultResult<KeyAsset> {
        Ok(read_key_asset(&*self.ledger, actor, key_id).await?)
    }
}
