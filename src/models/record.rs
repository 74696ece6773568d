//! Tagged envelope for everything this crate writes to the ledger.

use super::{FileAsset, KeyAsset};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DOC_TYPE_FIELD: &str = "DocType";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "DocType")]
pub enum AssetRecord {
    #[serde(rename = "FileAsset")]
    File(FileAsset),
    #[serde(rename = "KeyAsset")]
    Key(KeyAsset),
}

impl AssetRecord {
    pub const FILE: &'static str = "FileAsset";
    pub const KEY: &'static str = "KeyAsset";

    pub fn doc_type(&self) -> &'static str {
        match self {
            AssetRecord::File(_) => Self::FILE,
            AssetRecord::Key(_) => Self::KEY,
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Read only the discriminant. `None` for values that are not JSON
    /// objects or carry no tag, i.e. entries some other writer owns.
    pub fn peek_doc_type(bytes: &[u8]) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
        value
            .get(DOC_TYPE_FIELD)?
            .as_str()
            .map(str::to_string)
    }
}

/// One row of a listing.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResult<T> {
    pub key: String,
    pub record: T,
}

/// One decoded entry of a key's audit trail. `value` is `None` for the
/// entry that recorded a delete.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct AssetHistoryEntry<T> {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub is_delete: bool,
    pub value: Option<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccessUserList;
    use chrono::TimeZone;

    fn sample() -> FileAsset {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        FileAsset {
            id: "f1".into(),
            file_name: "report.pdf".into(),
            mime_type: "application/pdf".into(),
            content_address: "abc".into(),
            shared_key: "[]".into(),
            owner_id: "alice".into(),
            version: 1,
            access_user_list: AccessUserList::only("alice"),
            create_date_time: ts,
            last_updated: ts,
            updated_by: "alice".into(),
        }
    }

    #[test]
    fn envelope_carries_tag_and_wire_names() {
        let bytes = AssetRecord::File(sample()).to_bytes().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["DocType"], "FileAsset");
        assert_eq!(json["ID"], "f1");
        assert_eq!(json["OwnerID"], "alice");
        assert_eq!(json["AccessUserList"]["alice"], true);
        assert_eq!(json["Version"], 1);
    }

    #[test]
    fn foreign_values_have_no_doc_type() {
        assert_eq!(AssetRecord::peek_doc_type(b"not json"), None);
        assert_eq!(AssetRecord::peek_doc_type(br#"{"ID":"x"}"#), None);
        assert_eq!(
            AssetRecord::peek_doc_type(br#"{"DocType":"Invoice"}"#).as_deref(),
            Some("Invoice")
        );
    }
}
