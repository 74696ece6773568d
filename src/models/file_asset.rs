//! Metadata record for one escrowed file.

use super::AccessUserList;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ledger entry describing an encrypted file.
///
/// The content itself lives in the content store; this record holds the
/// locator, the escrowed share set for the file key, and who may touch it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct FileAsset {
    /// Primary ledger key.
    #[serde(rename = "ID")]
    pub id: String,

    pub file_name: String,

    pub mime_type: String,

    /// Opaque locator into the content store.
    pub content_address: String,

    /// Serialized share set for the file's symmetric key.
    pub shared_key: String,

    /// Authorizes Transfer and Delete.
    #[serde(rename = "OwnerID")]
    pub owner_id: String,

    /// Starts at 1, +1 on every successful mutation.
    pub version: u64,

    /// Authorizes Update and UpdateAccess.
    pub access_user_list: AccessUserList,

    pub create_date_time: DateTime<Utc>,

    pub last_updated: DateTime<Utc>,

    pub updated_by: String,
}
