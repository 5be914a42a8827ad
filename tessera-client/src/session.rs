//! Session lifecycle: bootstrap, login, logout, and expiry.
//!
//! The manager owns the in-memory view of who is signed in and keeps it
//! consistent with the vault. It registers itself on the client's
//! unauthorized hook, so a session torn down by the HTTP layer flips the
//! observable state to [`SessionState::Anonymous`] without any polling.

use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use tessera_core::{AppConfig, CredentialVault, Secret, User, UserPatch};

use crate::error::ApiError;
use crate::http::ApiClient;

/// Observable authentication state.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Bootstrap has not run yet.
    Unknown,
    /// No valid session.
    Anonymous,
    /// Signed in as the carried user.
    Authenticated(User),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Server response to `POST /login` and `POST /register`.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    user: User,
    #[serde(default)]
    config: Option<AppConfig>,
}

impl AuthResponse {
    fn into_parts(self) -> (Option<String>, User, Option<AppConfig>) {
        (self.token.or(self.access_token), self.user, self.config)
    }
}

/// LGPD consent recorded at registration.
#[derive(Debug, Clone, Serialize)]
pub struct LgpdConsent {
    pub accepted: bool,
    pub version: String,
    pub hash: String,
    pub channel: String,
}

/// Body for `POST /register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nif: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lgpd: Option<LgpdConsent>,
}

/// Delivery channel for password recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMethod {
    Whatsapp,
    Email,
}

/// Server acknowledgement of a recovery step.
#[derive(Debug, Deserialize)]
pub struct RecoveryAck {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Owner of the session lifecycle.
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: ApiClient,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Build a manager over the client and hook it up to session expiry.
    ///
    /// The unauthorized handler holds a `Weak` reference, so dropping the
    /// manager does not leak through the hook.
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        let inner = Arc::new(SessionInner { client, state });

        let weak: Weak<SessionInner> = Arc::downgrade(&inner);
        inner.client.unauthorized().on_unauthorized(move || {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(inner) = weak.upgrade() {
                    debug!("session expired, switching to anonymous");
                    inner.state.send_replace(SessionState::Anonymous);
                }
            })
        });

        Self { inner }
    }

    /// Watch the session state. The receiver sees every transition,
    /// including expiry triggered by the HTTP layer.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    fn vault(&self) -> &Arc<CredentialVault> {
        self.inner.client.vault()
    }

    /// Restore a previous session from the vault at startup.
    ///
    /// Requires both a stored token and a stored profile; a token without
    /// a profile is a half-written session and is discarded.
    pub async fn bootstrap(&self) -> SessionState {
        let token = self.vault().token().await;
        let user = self.vault().user().await;

        let state = match (token, user) {
            (Some(_), Some(user)) => {
                info!(user_id = user.id, "restored session from storage");
                SessionState::Authenticated(user)
            }
            (Some(_), None) => {
                warn!("stored token has no profile, discarding session");
                self.vault().clear_session().await;
                SessionState::Anonymous
            }
            _ => SessionState::Anonymous,
        };

        self.inner.state.send_replace(state.clone());
        state
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let response: AuthResponse = self
            .inner
            .client
            .post_public(
                "login",
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await?;
        self.establish(response).await
    }

    /// Create an account and sign in with the returned session.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<User, ApiError> {
        let response: AuthResponse = self.inner.client.post_public("register", payload).await?;
        self.establish(response).await
    }

    async fn establish(&self, response: AuthResponse) -> Result<User, ApiError> {
        let (token, user, config) = response.into_parts();
        let Some(token) = token else {
            return Err(ApiError::InvalidResponse(
                "auth response carried no token".into(),
            ));
        };

        // Persist the credential first; if that fails the session never
        // existed and the state stays untouched.
        self.vault().set_token(Secret::new(token)).await?;

        if let Err(error) = self.vault().set_user(&user).await {
            warn!(%error, "failed to persist user profile");
        }
        if let Some(config) = &config {
            if let Err(error) = self.vault().set_config(config).await {
                warn!(%error, "failed to persist app config");
            }
        }

        info!(user_id = user.id, "session established");
        self.inner
            .state
            .send_replace(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Sign out.
    ///
    /// The server call is best effort: local state is cleared whether or
    /// not the server acknowledged the logout.
    pub async fn logout(&self) {
        if let Err(error) = self.inner.client.post_unit("logout", None).await {
            debug!(%error, "logout request failed, clearing local session anyway");
        }
        self.vault().clear_session().await;
        self.inner.state.send_replace(SessionState::Anonymous);
    }

    /// Update the profile on the server and mirror the result locally.
    pub async fn update_user(&self, patch: &UserPatch) -> Result<User, ApiError> {
        let user = self.inner.client.put_user(patch).await?;

        if let Err(error) = self.vault().set_user(&user).await {
            warn!(%error, "failed to persist updated profile");
        }
        if self.inner.state.borrow().is_authenticated() {
            self.inner
                .state
                .send_replace(SessionState::Authenticated(user.clone()));
        }
        Ok(user)
    }

    /// `POST /auth/forgot-password` - request a recovery code.
    pub async fn forgot_password(
        &self,
        method: ResetMethod,
        identifier: &str,
    ) -> Result<RecoveryAck, ApiError> {
        self.inner
            .client
            .post_public(
                "auth/forgot-password",
                &serde_json::json!({ "method": method, "identifier": identifier }),
            )
            .await
    }

    /// `POST /auth/verify-otp` - confirm a phone code and set a new
    /// password.
    pub async fn verify_otp(
        &self,
        phone: &str,
        token: &str,
        new_password: &str,
    ) -> Result<RecoveryAck, ApiError> {
        self.inner
            .client
            .post_public(
                "auth/verify-otp",
                &serde_json::json!({
                    "phone": phone,
                    "token": token,
                    "new_password": new_password,
                }),
            )
            .await
    }

    /// `POST /auth/reset-password` - redeem an emailed reset token.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<RecoveryAck, ApiError> {
        self.inner
            .client
            .post_public(
                "auth/reset-password",
                &serde_json::json!({ "token": token, "new_password": new_password }),
            )
            .await
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("authenticated", &self.inner.state.borrow().is_authenticated())
            .finish()
    }
}
