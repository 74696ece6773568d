use bytes::Bytes;
use std::sync::Arc;
use tempfile::TempDir;
use vault_ledger::{
    contract::{ContractError, file_asset::read_file_asset, key_asset::get_all_key_assets},
    crypto::shamir::{SharingParams, decode_share_set},
    ledger::MemoryLedger,
    models::AccessUserList,
    services::{
        content_store::DiskContentStore,
        vault_service::{VaultError, VaultService, custodian_key_id},
    },
};

type Vault = VaultService<MemoryLedger, DiskContentStore>;

fn vault() -> (Vault, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let service = VaultService::new(
        Arc::new(MemoryLedger::new()),
        Arc::new(DiskContentStore::new(dir.path())),
        SharingParams::new(5, 3).unwrap(),
    );
    (service, dir)
}

async fn escrowed_tokens(vault: &Vault, file_id: &str) -> Vec<String> {
    let record = read_file_asset(&*vault.ledger, file_id).await.unwrap();
    decode_share_set(&record.shared_key)
        .unwrap()
        .iter()
        .map(|s| s.encode())
        .collect()
}

fn grant(ids: &[&str]) -> AccessUserList {
    ids.iter().map(|id| (id.to_string(), true)).collect()
}

const REPORT: &[u8] = b"quarterly numbers, do not forward";

#[tokio::test]
async fn upload_then_download_with_threshold_shares() {
    let (vault, _dir) = vault();
    let receipt = vault
        .upload("alice", "report.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();
    assert_eq!(receipt.version, 1);

    let record = read_file_asset(&*vault.ledger, &receipt.file_id).await.unwrap();
    assert_eq!(record.content_address, receipt.content_address);
    assert_eq!(record.owner_id, "alice");
    assert_eq!(record.file_name, "report.txt");

    let tokens = escrowed_tokens(&vault, &receipt.file_id).await;
    assert_eq!(tokens.len(), 5);

    // any three of the five
    let picked = vec![tokens[4].clone(), tokens[0].clone(), tokens[2].clone()];
    let file = vault
        .download("alice", &receipt.file_id, &picked)
        .await
        .unwrap();
    assert_eq!(file.content, REPORT);
    assert_eq!(file.record.mime_type, "text/plain");

    let all = vault.download("alice", &receipt.file_id, &tokens).await.unwrap();
    assert_eq!(all.content, REPORT);
}

#[tokio::test]
async fn stored_blob_is_not_plaintext() {
    let (vault, dir) = vault();
    let receipt = vault
        .upload("alice", "r.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();

    let a = &receipt.content_address;
    let path = dir.path().join(&a[0..2]).join(&a[2..4]).join(a);
    let stored = std::fs::read(path).unwrap();
    assert_ne!(stored, REPORT);
    assert_eq!(stored.len(), 16 + (REPORT.len() / 16 + 1) * 16);
}

#[tokio::test]
async fn too_few_shares_is_refused() {
    let (vault, _dir) = vault();
    let receipt = vault
        .upload("alice", "r.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();
    let tokens = escrowed_tokens(&vault, &receipt.file_id).await;

    let result = vault
        .download("alice", &receipt.file_id, &tokens[..2])
        .await;
    assert!(matches!(
        result,
        Err(VaultError::InsufficientShares {
            required: 3,
            supplied: 2
        })
    ));
}

#[tokio::test]
async fn garbage_share_tokens_are_rejected() {
    let (vault, _dir) = vault();
    let receipt = vault
        .upload("alice", "r.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();
    let bad = vec!["!!".to_string(), "??".to_string(), "**".to_string()];

    assert!(matches!(
        vault.download("alice", &receipt.file_id, &bad).await,
        Err(VaultError::Sharing(_))
    ));
}

#[tokio::test]
async fn only_granted_identities_download() {
    let (vault, _dir) = vault();
    let receipt = vault
        .upload("alice", "r.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();
    let tokens = escrowed_tokens(&vault, &receipt.file_id).await;

    assert!(matches!(
        vault.download("bob", &receipt.file_id, &tokens).await,
        Err(VaultError::Contract(ContractError::PermissionDenied { .. }))
    ));
    assert!(matches!(
        vault.history("bob", &receipt.file_id).await,
        Err(VaultError::Contract(ContractError::PermissionDenied { .. }))
    ));

    let updated = vault
        .update_access("alice", &receipt.file_id, grant(&["alice", "bob"]))
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    // the escrowed share set is carried over untouched
    assert_eq!(escrowed_tokens(&vault, &receipt.file_id).await, tokens);

    let file = vault.download("bob", &receipt.file_id, &tokens).await.unwrap();
    assert_eq!(file.content, REPORT);
    assert_eq!(vault.history("bob", &receipt.file_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn listing_is_filtered_by_grant() {
    let (vault, _dir) = vault();
    let mine = vault
        .upload("alice", "a.txt", "text/plain", Bytes::from_static(b"a"))
        .await
        .unwrap();
    vault
        .upload("bob", "b.txt", "text/plain", Bytes::from_static(b"b"))
        .await
        .unwrap();

    let listed = vault.list_accessible("alice").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, mine.file_id);
    assert!(vault.list_accessible("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn custodians_each_hold_one_share() {
    let (vault, _dir) = vault();
    let receipt = vault
        .upload("alice", "r.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();
    let custodians: Vec<String> = ["carol", "dave", "erin"].map(String::from).to_vec();

    let created = vault
        .distribute_shares("alice", &receipt.file_id, &custodians)
        .await
        .unwrap();
    assert_eq!(created.len(), 3);
    assert!(created.iter().all(|k| k.owner_file_id == "alice" && k.file_version == 1));

    // each custodian reads only their own share
    let mut collected = Vec::new();
    for (custodian, record) in custodians.iter().zip(&created) {
        let share = vault.custodian_share(custodian, &record.id).await.unwrap();
        collected.push(share.key_value);
    }
    assert!(matches!(
        vault.custodian_share("dave", &created[0].id).await,
        Err(VaultError::Contract(ContractError::PermissionDenied { .. }))
    ));

    // together the custodians' shares open the file
    let file = vault
        .download("alice", &receipt.file_id, &collected)
        .await
        .unwrap();
    assert_eq!(file.content, REPORT);
}

#[tokio::test]
async fn distribution_rejects_bad_custodian_lists() {
    let (vault, _dir) = vault();
    let receipt = vault
        .upload("alice", "r.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();
    let names = |raw: &[&str]| raw.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    assert!(matches!(
        vault
            .distribute_shares("alice", &receipt.file_id, &names(&["a", "b"]))
            .await,
        Err(VaultError::InsufficientShares { .. })
    ));
    assert!(matches!(
        vault
            .distribute_shares("alice", &receipt.file_id, &names(&["a", "b", "c", "d", "e", "f"]))
            .await,
        Err(VaultError::InvalidParameters(_))
    ));
    assert!(matches!(
        vault
            .distribute_shares("alice", &receipt.file_id, &names(&["a", "a", "b"]))
            .await,
        Err(VaultError::InvalidParameters(_))
    ));
    assert!(matches!(
        vault
            .distribute_shares("mallory", &receipt.file_id, &names(&["a", "b", "c"]))
            .await,
        Err(VaultError::Contract(ContractError::PermissionDenied { .. }))
    ));
    assert!(get_all_key_assets(&*vault.ledger).await.unwrap().is_empty());
}

#[tokio::test]
async fn transfer_moves_custody_records_along() {
    let (vault, _dir) = vault();
    let receipt = vault
        .upload("alice", "r.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();
    let custodians: Vec<String> = ["carol", "dave", "erin", "frank"].map(String::from).to_vec();
    vault
        .distribute_shares("alice", &receipt.file_id, &custodians)
        .await
        .unwrap();

    let moved = vault
        .transfer("alice", &receipt.file_id, "bob")
        .await
        .unwrap();
    assert_eq!(moved.owner_id, "bob");
    assert_eq!(moved.version, 2);

    let keys = get_all_key_assets(&*vault.ledger).await.unwrap();
    assert_eq!(keys.len(), 4);
    assert!(keys.iter().all(|k| k.record.owner_file_id == "bob"));

    // the new owner can now clean everything up
    vault.delete("bob", &receipt.file_id).await.unwrap();
    assert!(get_all_key_assets(&*vault.ledger).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_cascades_and_is_owner_only() {
    let (vault, _dir) = vault();
    let receipt = vault
        .upload("alice", "r.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();
    vault
        .update_access("alice", &receipt.file_id, grant(&["alice", "bob"]))
        .await
        .unwrap();
    let custodians: Vec<String> = ["carol", "dave", "erin"].map(String::from).to_vec();
    vault
        .distribute_shares("alice", &receipt.file_id, &custodians)
        .await
        .unwrap();

    assert!(matches!(
        vault.delete("bob", &receipt.file_id).await,
        Err(VaultError::Contract(ContractError::PermissionDenied { .. }))
    ));
    assert_eq!(get_all_key_assets(&*vault.ledger).await.unwrap().len(), 3);

    vault.delete("alice", &receipt.file_id).await.unwrap();
    assert!(get_all_key_assets(&*vault.ledger).await.unwrap().is_empty());
    assert!(matches!(
        vault.custodian_share("carol", &custodian_key_id(&receipt.file_id, 1)).await,
        Err(VaultError::Contract(ContractError::NotFound(_)))
    ));
    assert!(matches!(
        vault.download("alice", &receipt.file_id, &[]).await,
        Err(VaultError::Contract(ContractError::NotFound(_)))
    ));
}

#[tokio::test]
async fn cascades_follow_issued_shares_after_config_shrinks() {
    let (wide, _dir) = vault();
    let receipt = wide
        .upload("alice", "r.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();
    let custodians: Vec<String> = ["c1", "c2", "c3", "c4", "c5"].map(String::from).to_vec();
    wide.distribute_shares("alice", &receipt.file_id, &custodians)
        .await
        .unwrap();

    // same ledger and content, restarted with fewer shares per key
    let narrow: Vault = VaultService::new(
        wide.ledger.clone(),
        wide.content.clone(),
        SharingParams::new(3, 2).unwrap(),
    );

    narrow
        .transfer("alice", &receipt.file_id, "bob")
        .await
        .unwrap();
    let keys = get_all_key_assets(&*narrow.ledger).await.unwrap();
    assert_eq!(keys.len(), 5);
    assert!(keys.iter().all(|k| k.record.owner_file_id == "bob"));

    narrow.delete("bob", &receipt.file_id).await.unwrap();
    assert!(get_all_key_assets(&*narrow.ledger).await.unwrap().is_empty());
}

#[tokio::test]
async fn revoked_member_cannot_read_content() {
    let (vault, _dir) = vault();
    let receipt = vault
        .upload("alice", "r.txt", "text/plain", Bytes::from_static(REPORT))
        .await
        .unwrap();
    let tokens = escrowed_tokens(&vault, &receipt.file_id).await;
    let list: AccessUserList = [("alice".to_string(), true), ("bob".to_string(), false)]
        .into_iter()
        .collect();
    vault
        .update_access("alice", &receipt.file_id, list)
        .await
        .unwrap();

    assert!(matches!(
        vault.download("bob", &receipt.file_id, &tokens).await,
        Err(VaultError::Contract(ContractError::PermissionDenied { .. }))
    ));
    assert!(vault.list_accessible("bob").await.unwrap().is_empty());
}
