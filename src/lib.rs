//! Threshold key-escrow file vault.
//!
//! Files are encrypted with a per-file AES key, the key is split with
//! Shamir's scheme, and the file's metadata plus escrowed shares are kept on
//! an append-only, access-controlled ledger.
//!
//! - [`crypto`]: content cipher and secret splitter
//! - [`ledger`]: the key-value + history abstraction and its backends
//! - [`models`]: file and key records as stored on the ledger
//! - [`contract`]: the record state machines and their transaction surface
//! - [`services`]: content store and the upload/download workflow
//! - [`handlers`], [`routes`]: HTTP surface

pub mod config;
pub mod contract;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod routes;
pub mod services;
