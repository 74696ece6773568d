//! Ledger record types.
//!
//! Both record kinds live in one keyspace next to whatever else the ledger
//! holds, so every stored value carries an explicit `DocType` tag. They
//! serialize with the PascalCase field names consumers of the transaction
//! surface already expect.

pub mod access;
pub mod file_asset;
pub mod key_asset;
pub mod record;

pub use access::AccessUserList;
pub use file_asset::FileAsset;
pub use key_asset::KeyAsset;
pub use record::{AssetHistoryEntry, AssetRecord, QueryResult};
