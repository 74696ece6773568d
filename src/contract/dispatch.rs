//! String-argument transaction surface.
//!
//! Maps the published function names and positional arguments onto the
//! typed state-machine operations and renders results as JSON text, the
//! form an external submission channel carries. Void operations return an
//! empty string.

use super::{
    ContractError, ContractResult,
    file_asset::{
        FileContentUpdate, NewFileAsset, create_file_asset, delete_file_asset,
        get_all_file_assets, get_file_asset_history, read_file_asset, transfer_file_asset,
        update_file_access_asset, update_file_asset,
    },
    key_asset::{
        NewKeyAsset, create_key_asset, delete_key_asset, get_all_key_assets,
        get_key_asset_history, read_key_asset, update_file_owner_key_asset, update_key_asset,
    },
};
use crate::{ledger::AssetLedger, models::AccessUserList};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

pub async fn invoke<L: AssetLedger>(
    ledger: &L,
    function: &str,
    args: &[String],
) -> ContractResult<String> {
    debug!(function, argc = args.len(), "invoking transaction");
    match function {
        "CreateFileAsset" => {
            let [id, name, mime, address, shared_key, owner, access, ts] = arity::<8>(function, args)?;
            let new = NewFileAsset {
                id: id.into(),
                file_name: name.into(),
                mime_type: mime.into(),
                content_address: address.into(),
                shared_key: shared_key.into(),
                owner_id: owner.into(),
                access_user_list: parse_access(access)?,
                timestamp: parse_timestamp(ts)?,
            };
            to_json(&create_file_asset(ledger, new).await?)
        }
        "ReadFileAsset" => {
            let [id] = arity::<1>(function, args)?;
            to_json(&read_file_asset(ledger, id).await?)
        }
        "UpdateFileAsset" => {
            let [actor, id, name, mime, address, shared_key, ts] = arity::<7>(function, args)?;
            let update = FileContentUpdate {
                file_name: name.into(),
                mime_type: mime.into(),
                content_address: address.into(),
                shared_key: shared_key.into(),
            };
            let ts = parse_timestamp(ts)?;
            to_json(&update_file_asset(ledger, actor, id, update, ts).await?)
        }
        "UpdateFileAccessAsset" => {
            let [actor, id, shared_key, access, ts] = arity::<5>(function, args)?;
            let access = parse_access(access)?;
            let ts = parse_timestamp(ts)?;
            to_json(&update_file_access_asset(ledger, actor, id, shared_key.into(), access, ts).await?)
        }
        "TransferFileAsset" => {
            let [actor, id, new_owner, ts] = arity::<4>(function, args)?;
            let ts = parse_timestamp(ts)?;
            to_json(&transfer_file_asset(ledger, actor, id, new_owner, ts).await?)
        }
        "DeleteFileAsset" => {
            let [actor, id] = arity::<2>(function, args)?;
            delete_file_asset(ledger, actor, id).await?;
            Ok(String::new())
        }
        "GetAllFileAssets" => {
            let [] = arity::<0>(function, args)?;
            to_json(&get_all_file_assets(ledger).await?)
        }
        "GetFileAssetHistory" => {
            let [id] = arity::<1>(function, args)?;
            to_json(&get_file_asset_history(ledger, id).await?)
        }
        "CreateKeyAsset" => {
            let [id, owner_key, file_id, owner_file, file_version, key_value, ts] =
                arity::<7>(function, args)?;
            let new = NewKeyAsset {
                id: id.into(),
                owner_key_id: owner_key.into(),
                file_id: file_id.into(),
                owner_file_id: owner_file.into(),
                file_version: parse_file_version(file_version)?,
                key_value: key_value.into(),
                timestamp: parse_timestamp(ts)?,
            };
            to_json(&create_key_asset(ledger, new).await?)
        }
        "ReadKeyAsset" => {
            let [actor, id] = arity::<2>(function, args)?;
            to_json(&read_key_asset(ledger, actor, id).await?)
        }
        "UpdateKeyAsset" => {
            let [actor, id, file_version, key_value, ts] = arity::<5>(function, args)?;
            let file_version = parse_file_version(file_version)?;
            let ts = parse_timestamp(ts)?;
            to_json(&update_key_asset(ledger, actor, id, file_version, key_value.into(), ts).await?)
        }
        "UpdateFileOwnerKeyAsset" => {
            let [actor, id, new_owner, ts] = arity::<4>(function, args)?;
            let ts = parse_timestamp(ts)?;
            to_json(&update_file_owner_key_asset(ledger, actor, id, new_owner, ts).await?)
        }
        "DeleteKeyAsset" => {
            let [actor, id] = arity::<2>(function, args)?;
            delete_key_asset(ledger, actor, id).await?;
            Ok(String::new())
        }
        "GetAllKeyAssets" => {
            let [] = arity::<0>(function, args)?;
            to_json(&get_all_key_assets(ledger).await?)
        }
        "GetKeyAssetHistory" => {
            let [id] = arity::<1>(function, args)?;
            to_json(&get_key_asset_history(ledger, id).await?)
        }
        other => Err(ContractError::UnknownFunction(other.to_string())),
    }
}

fn arity<'a, const N: usize>(function: &str, args: &'a [String]) -> ContractResult<[&'a str; N]> {
    let exact: &[String; N] = args.try_into().map_err(|_| {
        ContractError::Malformed(format!(
            "{function} expects {N} arguments, got {}",
            args.len()
        ))
    })?;
    Ok(exact.each_ref().map(String::as_str))
}

fn parse_access(raw: &str) -> ContractResult<AccessUserList> {
    AccessUserList::parse(raw)
        .map_err(|err| ContractError::Malformed(format!("access user list is not a mapping: {err}")))
}

fn parse_timestamp(raw: &str) -> ContractResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| ContractError::Malformed(format!("timestamp `{raw}`: {err}")))
}

fn parse_file_version(raw: &str) -> ContractResult<u64> {
    raw.trim()
        .parse()
        .map_err(|err| ContractError::Malformed(format!("file version `{raw}`: {err}")))
}

fn to_json<T: Serialize>(value: &T) -> ContractResult<String> {
    serde_json::to_string(value).map_err(|err| ContractError::Malformed(err.to_string()))
}
