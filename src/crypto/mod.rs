//! Pure, stateless cryptographic building blocks used by the vault workflow.
//!
//! - [`cipher`] encrypts file content with a fresh AES-256-CBC key per call.
//! - [`shamir`] splits that key into threshold shares and recombines them.
//!
//! Neither module touches the ledger or the content store.

pub mod cipher;
pub mod shamir;
