//! Vault behavior over the real file-backed store: persistence across
//! process restarts (modeled as fresh vault instances over one path).

use std::path::PathBuf;

use tessera_core::{CredentialVault, FileStore, Secret, User};

fn vault_at(path: PathBuf) -> CredentialVault {
    let general = FileStore::load_from_path(path).unwrap();
    CredentialVault::with_stores(None, Box::new(general))
}

fn sample_user() -> User {
    serde_json::from_value(serde_json::json!({
        "id": 7,
        "name": "Ana",
        "email": "ana@example.com",
        "loyalty_synced": false
    }))
    .unwrap()
}

#[tokio::test]
async fn session_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let vault = vault_at(path.clone());
    vault.set_token(Secret::new("T1")).await.unwrap();
    vault.set_user(&sample_user()).await.unwrap();

    // A fresh vault over the same file sees the same session
    let restarted = vault_at(path);
    assert_eq!(restarted.token().await.unwrap().expose(), "T1");
    assert_eq!(restarted.user().await.unwrap().email, "ana@example.com");
}

#[tokio::test]
async fn cleared_session_stays_cleared_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let vault = vault_at(path.clone());
    vault.set_token(Secret::new("T1")).await.unwrap();
    vault.set_user(&sample_user()).await.unwrap();
    vault.clear_session().await;

    let restarted = vault_at(path);
    assert!(restarted.token().await.is_none());
    assert!(restarted.user().await.is_none());
}

#[tokio::test]
async fn token_update_is_visible_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let vault = vault_at(path.clone());
    vault.set_token(Secret::new("T1")).await.unwrap();
    vault.set_token(Secret::new("T2")).await.unwrap();

    let restarted = vault_at(path);
    assert_eq!(restarted.token().await.unwrap().expose(), "T2");
}
