//! Custody record for one share (or share bundle) of a file key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ledger entry held on behalf of a single custodian.
///
/// There is no version counter of its own; `file_version` records which
/// file record version the share was cut for. Skew between the two is
/// detectable, not prevented.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct KeyAsset {
    #[serde(rename = "ID")]
    pub id: String,

    /// The only identity allowed to read this record.
    #[serde(rename = "OwnerKeyID")]
    pub owner_key_id: String,

    /// The file record this share belongs to.
    #[serde(rename = "FileID")]
    pub file_id: String,

    /// Must match the caller for Transfer and Delete.
    #[serde(rename = "OwnerFileID")]
    pub owner_file_id: String,

    pub file_version: u64,

    pub key_value: String,

    pub create_date_time: DateTime<Utc>,

    pub last_updated: DateTime<Utc>,

    pub last_updated_by: String,
}
