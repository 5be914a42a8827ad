//! # Tessera Core
//!
//! Core library for Tessera session and credential management.
//!
//! This crate provides:
//! - Domain types for the user profile and app configuration
//! - A trait for secret storage with memory, file, and keyring backends
//! - The [`CredentialVault`], the single owner of the bearer token and
//!   session artifacts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tessera_core::{CredentialVault, Secret};
//!
//! async fn remember_token(vault: &CredentialVault) -> Result<(), tessera_core::StoreError> {
//!     vault.set_token(Secret::new("bearer-token")).await?;
//!     assert!(vault.token().await.is_some());
//!     Ok(())
//! }
//! ```

pub mod model;
pub mod store;
pub mod vault;

// Re-export commonly used types at crate root
pub use model::{
    AppConfig,
    ThemeMode,
    User,
    UserPatch,
};

pub use store::{
    FileStore,
    MemoryStore,
    Secret,
    SecretStore,
    StoreError,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use vault::CredentialVault;
