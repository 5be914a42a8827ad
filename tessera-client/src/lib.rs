//! # Tessera Client
//!
//! API client and session lifecycle for the Tessera loyalty app.
//!
//! This crate provides:
//! - [`ApiClient`] - Authenticated HTTP client with transparent
//!   refresh-and-retry on expired credentials
//! - [`SessionManager`] - Login, registration, logout, and startup
//!   session restore, with an observable [`SessionState`]
//! - Typed endpoints for coupons, loyalty, products, stores, and home
//!   content
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera_client::{ApiClient, ClientConfig, SessionManager};
//! use tessera_core::CredentialVault;
//!
//! async fn start() -> Result<(), tessera_client::ApiError> {
//!     let vault = Arc::new(CredentialVault::open()?);
//!     let client = ApiClient::new(ClientConfig::from_env()?, vault)?;
//!     let session = SessionManager::new(client.clone());
//!     session.bootstrap().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod endpoints;
pub mod error;
pub mod hook;
mod http;
mod refresh;
pub mod session;

// Re-export commonly used types at crate root
pub use config::ClientConfig;
pub use endpoints::{
    ContentBlock,
    Coupon,
    CouponKind,
    LoyaltyReward,
    LoyaltyStatus,
    Product,
    Recurrence,
    StoreKind,
    StoreLocation,
    StoreQuery,
    UserCoupon,
    UserCouponStatus,
    resolve_asset_url,
};
pub use error::ApiError;
pub use hook::UnauthorizedSlot;
pub use http::ApiClient;
pub use session::{
    LgpdConsent,
    RecoveryAck,
    RegisterPayload,
    ResetMethod,
    SessionManager,
    SessionState,
};
