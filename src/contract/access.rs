//! Authorization predicates shared by both state machines.
//!
//! File records split authority two ways: the access list gates content and
//! sharing changes, ownership gates Transfer and Delete. Neither implies the
//! other. Update and ShareAccess need list membership; Read needs a `true`
//! flag. Key records are readable by their custodian only and mutable by
//! whoever currently owns the file they belong to.

use super::{ContractError, ContractResult};
use crate::models::{FileAsset, KeyAsset};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileAction {
    Read,
    Update,
    ShareAccess,
    Transfer,
    Delete,
}

impl FileAction {
    pub fn as_str(self) -> &'static str {
        match self {
            FileAction::Read => "read",
            FileAction::Update => "update",
            FileAction::ShareAccess => "share access to",
            FileAction::Transfer => "transfer",
            FileAction::Delete => "delete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Read,
    TransferOwner,
    Delete,
}

impl KeyAction {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyAction::Read => "read",
            KeyAction::TransferOwner => "transfer",
            KeyAction::Delete => "delete",
        }
    }
}

pub fn may_act_on_file(asset: &FileAsset, actor: &str, action: FileAction) -> bool {
    match action {
        FileAction::Read => asset.access_user_list.is_granted(actor),
        FileAction::Update | FileAction::ShareAccess => asset.access_user_list.contains(actor),
        FileAction::Transfer | FileAction::Delete => asset.owner_id == actor,
    }
}

pub fn may_act_on_key(asset: &KeyAsset, actor: &str, action: KeyAction) -> bool {
    match action {
        KeyAction::Read => asset.owner_key_id == actor,
        KeyAction::TransferOwner | KeyAction::Delete => asset.owner_file_id == actor,
    }
}

pub fn authorize_file(asset: &FileAsset, actor: &str, action: FileAction) -> ContractResult<()> {
    if may_act_on_file(asset, actor, action) {
        Ok(())
    } else {
        Err(ContractError::PermissionDenied {
            actor: actor.to_string(),
            action: action.as_str(),
            id: asset.id.clone(),
        })
    }
}

pub fn authorize_key(asset: &KeyAsset, actor: &str, action: KeyAction) -> ContractResult<()> {
    if may_act_on_key(asset, actor, action) {
        Ok(())
    } else {
        Err(ContractError::PermissionDenied {
            actor: actor.to_string(),
            action: action.as_str(),
            id: asset.id.clone(),
        })
    }
}
