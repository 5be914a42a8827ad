//! Credential vault: single owner of the bearer token and session artifacts.
//!
//! The vault layers a memory cache over two persistence media:
//! a preferred (secure) store for the bearer token, with transparent
//! fallback to a general key-value store, which also holds the
//! JSON-serialized session artifacts (`user`, `config`).
//!
//! Only the session manager and the refresh coordinator mutate the token;
//! the HTTP client borrows it per request via [`CredentialVault::token`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::model::{AppConfig, User};
#[cfg(feature = "keyring-store")]
use crate::store::KeyringStore;
use crate::store::{FileStore, Secret, SecretStore, StoreError};

/// Logical key for the bearer token.
const TOKEN_KEY: &str = "token";
/// Logical key for the cached user profile.
const USER_KEY: &str = "user";
/// Logical key for the cached app configuration.
const CONFIG_KEY: &str = "config";

/// Keyring service name for the preferred medium.
#[cfg(feature = "keyring-store")]
const KEYRING_SERVICE: &str = "tessera";

/// Memory cache for the token.
///
/// `Unloaded` forces exactly one read of the persistence media per
/// process lifetime; afterwards reads are served from memory, which is
/// what gives requests read-after-write consistency across a refresh.
enum TokenCache {
    Unloaded,
    Loaded(Option<Secret>),
}

/// Process-wide owner of the credential and session artifacts.
pub struct CredentialVault {
    preferred: Option<Box<dyn SecretStore>>,
    general: Box<dyn SecretStore>,
    cache: Mutex<TokenCache>,
}

impl CredentialVault {
    /// Open the vault with the default backends: OS keyring as the
    /// preferred medium (when available) and a JSON file store as the
    /// general medium.
    pub fn open() -> Result<Self, StoreError> {
        let general = Box::new(FileStore::load()?);
        Ok(Self::with_stores(Self::probe_keyring(), general))
    }

    /// Build a vault over explicit backends.
    ///
    /// Pass `None` for `preferred` to route everything to the general
    /// store. Used directly in tests and by platforms without a keyring.
    pub fn with_stores(
        preferred: Option<Box<dyn SecretStore>>,
        general: Box<dyn SecretStore>,
    ) -> Self {
        Self {
            preferred,
            general,
            cache: Mutex::new(TokenCache::Unloaded),
        }
    }

    #[cfg(feature = "keyring-store")]
    fn probe_keyring() -> Option<Box<dyn SecretStore>> {
        match KeyringStore::try_new(KEYRING_SERVICE) {
            Ok(store) => {
                debug!("using OS keyring as the preferred token medium");
                Some(Box::new(store))
            }
            Err(error) => {
                warn!(%error, "keyring unavailable, token will use the general store");
                None
            }
        }
    }

    #[cfg(not(feature = "keyring-store"))]
    fn probe_keyring() -> Option<Box<dyn SecretStore>> {
        None
    }

    /// Get the current bearer token, if any.
    ///
    /// The first call per process reads the persistence media (preferred
    /// first, then general on error or absence); subsequent calls hit the
    /// memory cache. Storage failures degrade to `None`, never an error.
    pub async fn token(&self) -> Option<Secret> {
        let mut cache = self.cache.lock().await;
        if let TokenCache::Loaded(token) = &*cache {
            return token.clone();
        }

        let token = self.read_persisted_token().await;
        *cache = TokenCache::Loaded(token.clone());
        token
    }

    async fn read_persisted_token(&self) -> Option<Secret> {
        if let Some(preferred) = &self.preferred {
            match preferred.get(TOKEN_KEY).await {
                Ok(Some(token)) => return Some(token),
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, "preferred store read failed, trying general store");
                }
            }
        }

        match self.general.get(TOKEN_KEY).await {
            Ok(token) => token,
            Err(error) => {
                warn!(%error, "general store read failed, treating token as absent");
                None
            }
        }
    }

    /// Store a new bearer token.
    ///
    /// Writes the preferred medium, falling back to the general medium on
    /// failure. The memory cache is updated only once a persistent write
    /// succeeded, so cache and storage never disagree after `Ok`.
    pub async fn set_token(&self, token: Secret) -> Result<(), StoreError> {
        let mut cache = self.cache.lock().await;

        if let Some(preferred) = &self.preferred {
            match preferred.set(TOKEN_KEY, &token).await {
                Ok(()) => {
                    *cache = TokenCache::Loaded(Some(token));
                    return Ok(());
                }
                Err(error) => {
                    warn!(%error, "preferred store write failed, falling back to general store");
                }
            }
        }

        self.general.set(TOKEN_KEY, &token).await?;
        *cache = TokenCache::Loaded(Some(token));
        Ok(())
    }

    /// Remove the bearer token from the memory cache and both media.
    ///
    /// Idempotent: clearing an empty vault is a no-op. Backend failures
    /// are logged and swallowed so teardown can always complete.
    pub async fn clear_token(&self) {
        let mut cache = self.cache.lock().await;
        *cache = TokenCache::Loaded(None);

        if let Some(preferred) = &self.preferred {
            if let Err(error) = preferred.delete(TOKEN_KEY).await {
                warn!(%error, "preferred store delete failed");
            }
        }
        if let Err(error) = self.general.delete(TOKEN_KEY).await {
            warn!(%error, "general store delete failed");
        }
    }

    /// Get the cached user profile, if any.
    pub async fn user(&self) -> Option<User> {
        self.artifact(USER_KEY).await
    }

    /// Persist the user profile.
    pub async fn set_user(&self, user: &User) -> Result<(), StoreError> {
        self.set_artifact(USER_KEY, user).await
    }

    /// Get the cached app configuration, if any.
    pub async fn config(&self) -> Option<AppConfig> {
        self.artifact(CONFIG_KEY).await
    }

    /// Persist the app configuration.
    pub async fn set_config(&self, config: &AppConfig) -> Result<(), StoreError> {
        self.set_artifact(CONFIG_KEY, config).await
    }

    /// Remove the app configuration.
    pub async fn clear_config(&self) {
        if let Err(error) = self.general.delete(CONFIG_KEY).await {
            warn!(%error, "failed to delete stored config");
        }
    }

    /// Clear the token and every session artifact together.
    ///
    /// Session state is valid only when token and artifacts agree, so
    /// this is the single teardown entry point for both.
    pub async fn clear_session(&self) {
        self.clear_token().await;

        for key in [USER_KEY, CONFIG_KEY] {
            if let Err(error) = self.general.delete(key).await {
                warn!(key, %error, "failed to delete session artifact");
            }
        }
    }

    async fn artifact<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.general.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                warn!(key, %error, "failed to read session artifact");
                return None;
            }
        };

        match serde_json::from_str(raw.expose()) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key, %error, "stored session artifact is corrupt, ignoring");
                None
            }
        }
    }

    async fn set_artifact<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.general.set(key, &Secret::new(raw)).await
    }
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("has_preferred", &self.preferred.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    /// A backend that fails every operation, standing in for an
    /// unavailable secure medium.
    struct FailingStore;

    #[async_trait]
    impl SecretStore for FailingStore {
        async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
            Err(StoreError::BackendError {
                message: format!("unavailable (get {})", key),
            })
        }

        async fn set(&self, key: &str, _secret: &Secret) -> Result<(), StoreError> {
            Err(StoreError::BackendError {
                message: format!("unavailable (set {})", key),
            })
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            Err(StoreError::BackendError {
                message: format!("unavailable (delete {})", key),
            })
        }
    }

    fn memory_vault() -> CredentialVault {
        CredentialVault::with_stores(
            Some(Box::new(MemoryStore::new())),
            Box::new(MemoryStore::new()),
        )
    }

    fn degraded_vault() -> CredentialVault {
        CredentialVault::with_stores(Some(Box::new(FailingStore)), Box::new(MemoryStore::new()))
    }

    fn sample_user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "Ana",
            "email": "ana@example.com",
            "loyalty_synced": true
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn token_read_after_write() {
        let vault = memory_vault();
        assert!(vault.token().await.is_none());

        vault.set_token(Secret::new("T1")).await.unwrap();
        assert_eq!(vault.token().await.unwrap().expose(), "T1");

        vault.set_token(Secret::new("T2")).await.unwrap();
        assert_eq!(vault.token().await.unwrap().expose(), "T2");
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let vault = memory_vault();
        vault.set_token(Secret::new("T1")).await.unwrap();

        vault.clear_token().await;
        assert!(vault.token().await.is_none());

        // Clearing an already-empty vault is a no-op, never an error
        vault.clear_token().await;
        assert!(vault.token().await.is_none());
    }

    #[tokio::test]
    async fn fallback_when_preferred_medium_fails() {
        let vault = degraded_vault();

        vault.set_token(Secret::new("T1")).await.unwrap();
        assert_eq!(vault.token().await.unwrap().expose(), "T1");

        vault.clear_token().await;
        assert!(vault.token().await.is_none());
    }

    #[tokio::test]
    async fn fallback_read_skips_failing_preferred() {
        let general = MemoryStore::new();
        general
            .set(TOKEN_KEY, &Secret::new("stored"))
            .await
            .unwrap();
        let vault =
            CredentialVault::with_stores(Some(Box::new(FailingStore)), Box::new(general));

        assert_eq!(vault.token().await.unwrap().expose(), "stored");
    }

    #[tokio::test]
    async fn token_prefers_secure_medium() {
        let preferred = MemoryStore::new();
        preferred
            .set(TOKEN_KEY, &Secret::new("secure"))
            .await
            .unwrap();
        let general = MemoryStore::new();
        general
            .set(TOKEN_KEY, &Secret::new("stale"))
            .await
            .unwrap();

        let vault =
            CredentialVault::with_stores(Some(Box::new(preferred)), Box::new(general));
        assert_eq!(vault.token().await.unwrap().expose(), "secure");
    }

    #[tokio::test]
    async fn both_media_failing_reads_as_absent() {
        let vault =
            CredentialVault::with_stores(Some(Box::new(FailingStore)), Box::new(FailingStore));
        assert!(vault.token().await.is_none());
    }

    #[tokio::test]
    async fn artifacts_roundtrip() {
        let vault = memory_vault();
        let user = sample_user();
        let config = AppConfig {
            assets_base_url: Some("https://cdn.example.com".into()),
        };

        vault.set_user(&user).await.unwrap();
        vault.set_config(&config).await.unwrap();

        assert_eq!(vault.user().await.unwrap().email, "ana@example.com");
        assert_eq!(
            vault.config().await.unwrap().assets_base_url.as_deref(),
            Some("https://cdn.example.com")
        );
    }

    #[tokio::test]
    async fn corrupt_artifact_reads_as_absent() {
        let general = MemoryStore::new();
        general
            .set(USER_KEY, &Secret::new("not json"))
            .await
            .unwrap();
        let vault = CredentialVault::with_stores(None, Box::new(general));

        assert!(vault.user().await.is_none());
    }

    #[tokio::test]
    async fn clear_session_removes_token_and_artifacts() {
        let vault = memory_vault();
        vault.set_token(Secret::new("T1")).await.unwrap();
        vault.set_user(&sample_user()).await.unwrap();
        vault.set_config(&AppConfig::default()).await.unwrap();

        vault.clear_session().await;

        assert!(vault.token().await.is_none());
        assert!(vault.user().await.is_none());
        assert!(vault.config().await.is_none());
    }
}
