//! Defines routes for the vault's HTTP surface.
//!
//! ## Structure
//! - **Health**
//!   - `GET    /healthz`, `GET /readyz`
//!
//! - **File-level endpoints**
//!   - `POST   /files`: upload (raw body, `x-file-name`, `content-type`)
//!   - `GET    /files`: list records the caller is granted on
//!   - `POST   /files/{file_id}/download`: decrypt with supplied shares
//!   - `GET    /files/{file_id}/history`: audit trail
//!   - `PUT    /files/{file_id}/access`: replace the access list
//!   - `POST   /files/{file_id}/transfer`: change owner
//!   - `DELETE /files/{file_id}`: delete (owner only)
//!   - `POST   /files/{file_id}/custodians`: distribute shares
//!
//! - **Custody**
//!   - `GET    /keys/{*key_id}`: read own share; ids contain `/`

use crate::{
    handlers::{
        file_handlers::{
            custodian_share, delete_file, distribute_shares, download_file, file_history,
            list_files, transfer_file, update_access, upload_file,
        },
        health_handlers::{healthz, readyz},
    },
    ledger::SqliteLedger,
    services::{content_store::DiskContentStore, vault_service::VaultService},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

/// Shared state carried to every handler.
pub type AppState = VaultService<SqliteLedger, DiskContentStore>;

/// Build and return the router for all vault routes.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // File-level routes
        .route(
            "/files",
            post(upload_file)
                .get(list_files)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/files/{file_id}", axum::routing::delete(delete_file))
        .route("/files/{file_id}/download", post(download_file))
        .route("/files/{file_id}/history", get(file_history))
        .route("/files/{file_id}/access", put(update_access))
        .route("/files/{file_id}/transfer", post(transfer_file))
        .route("/files/{file_id}/custodians", post(distribute_shares))
        // Custody routes
        .route("/keys/{*key_id}", get(custodian_share))
}
