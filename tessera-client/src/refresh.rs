//! Single-flight token refresh.
//!
//! Any number of request tasks can hit a 401 at the same time; the
//! coordinator collapses them onto one `POST /auth/refresh` and hands the
//! shared outcome to every waiter. The new credential is persisted to the
//! vault before the shared future resolves, so a waiter that re-reads the
//! vault immediately afterwards sees the fresh token.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use tessera_core::{AppConfig, CredentialVault, Secret, User};

use crate::http::Payload;

type InFlight = Shared<BoxFuture<'static, bool>>;

/// Server response to a refresh call.
///
/// The backend has shipped the credential under both `token` and
/// `access_token` across versions; either is accepted. A refreshed user
/// profile or config may ride along.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    pub(crate) user: Option<User>,
    #[serde(default)]
    pub(crate) config: Option<AppConfig>,
}

impl RefreshResponse {
    pub(crate) fn into_token(self) -> Option<String> {
        self.token.or(self.access_token)
    }
}

/// Collapses concurrent refresh attempts into one request.
pub struct RefreshCoordinator {
    vault: Arc<CredentialVault>,
    http: reqwest::Client,
    refresh_url: Url,
    in_flight: Mutex<Option<InFlight>>,
}

impl RefreshCoordinator {
    pub fn new(vault: Arc<CredentialVault>, http: reqwest::Client, refresh_url: Url) -> Self {
        Self {
            vault,
            http,
            refresh_url,
            in_flight: Mutex::new(None),
        }
    }

    /// Refresh the stored credential, joining an in-flight attempt if one
    /// exists.
    ///
    /// Returns `true` when a new credential has been persisted to the
    /// vault. Any failure (network, rejection, unreadable body, missing
    /// token in the response) reports `false`; the caller decides whether
    /// that ends the session.
    pub async fn refresh(self: &Arc<Self>) -> bool {
        let shared = {
            // Check-and-install under one lock: the first caller creates
            // the shared future, everyone else joins it.
            let mut slot = self.in_flight.lock();
            match &*slot {
                Some(in_flight) => in_flight.clone(),
                None => {
                    let this = Arc::clone(self);
                    let in_flight = async move {
                        let refreshed = this.execute().await;
                        // Release the slot before resolving so late
                        // arrivals start a new attempt instead of
                        // observing this (possibly stale) outcome.
                        this.in_flight.lock().take();
                        refreshed
                    }
                    .boxed()
                    .shared();
                    *slot = Some(in_flight.clone());
                    in_flight
                }
            }
        };

        shared.await
    }

    async fn execute(&self) -> bool {
        let Some(current) = self.vault.token().await else {
            debug!("refresh skipped, no stored credential");
            return false;
        };

        let response = match self
            .http
            .post(self.refresh_url.clone())
            .bearer_auth(current.expose())
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, "token refresh request failed");
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "token refresh rejected by server");
            return false;
        }

        let body = match response.json::<Payload<RefreshResponse>>().await {
            Ok(payload) => payload.into_inner(),
            Err(error) => {
                warn!(%error, "token refresh response unreadable");
                return false;
            }
        };

        let user = body.user.clone();
        let config = body.config.clone();
        let Some(token) = body.into_token() else {
            // A 2xx without a credential cannot rotate the session
            warn!("token refresh response carried no token");
            return false;
        };

        if let Err(error) = self.vault.set_token(Secret::new(token)).await {
            warn!(%error, "failed to persist refreshed token");
            return false;
        }

        // Ride-along artifacts are best effort
        if let Some(user) = user {
            if let Err(error) = self.vault.set_user(&user).await {
                warn!(%error, "failed to persist refreshed user profile");
            }
        }
        if let Some(config) = config {
            if let Err(error) = self.vault.set_config(&config).await {
                warn!(%error, "failed to persist refreshed config");
            }
        }

        debug!("bearer token refreshed");
        true
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.refresh_url.as_str())
            .field("in_flight", &self.in_flight.lock().is_some())
            .finish()
    }
}
