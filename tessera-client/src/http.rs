//! HTTP client core.
//!
//! Every authenticated request flows through [`ApiClient::dispatch`]:
//! the bearer token is read from the vault per attempt, a 401 triggers at
//! most one refresh-and-retry, and a 401 after the retried attempt tears
//! the session down (vault cleared, then the unauthorized hook notified)
//! before surfacing [`ApiError::Unauthorized`].

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use tessera_core::CredentialVault;

use crate::config::ClientConfig;
use crate::error::{ApiError, error_message};
use crate::hook::UnauthorizedSlot;
use crate::refresh::RefreshCoordinator;

/// Response envelope tolerance.
///
/// The backend wraps most payloads as `{"data": ...}` but a few routes
/// return the payload bare; both deserialize to the same `T`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Payload::Wrapped { data } => data,
            Payload::Bare(inner) => inner,
        }
    }
}

/// Shared API client.
///
/// Cheap to clone; all clones share the connection pool, the vault, the
/// refresh coordinator, and the unauthorized hook.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    vault: Arc<CredentialVault>,
    refresh: Arc<RefreshCoordinator>,
    unauthorized: Arc<UnauthorizedSlot>,
}

impl ApiClient {
    /// Build a client over the given vault.
    pub fn new(config: ClientConfig, vault: Arc<CredentialVault>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let refresh_url = config.endpoint("auth/refresh")?;
        let refresh = Arc::new(RefreshCoordinator::new(
            Arc::clone(&vault),
            http.clone(),
            refresh_url,
        ));

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                vault,
                refresh,
                unauthorized: Arc::new(UnauthorizedSlot::new()),
            }),
        })
    }

    /// The credential vault this client reads its bearer token from.
    pub fn vault(&self) -> &Arc<CredentialVault> {
        &self.inner.vault
    }

    /// The slot notified when a session is torn down.
    pub fn unauthorized(&self) -> &Arc<UnauthorizedSlot> {
        &self.inner.unauthorized
    }

    /// Run an authenticated request with the retry-once-on-401 policy.
    ///
    /// The bearer token is re-read from the vault for every attempt, so
    /// the retried attempt carries whatever the refresh persisted. The
    /// `retried` marker, not a counter, bounds the loop: one refresh, one
    /// retry, then teardown.
    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        query: Option<&[(&str, String)]>,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let mut retried = false;
        loop {
            let mut request = self.inner.http.request(method.clone(), url.clone());
            if let Some(query) = query {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            if let Some(token) = self.inner.vault.token().await {
                request = request.bearer_auth(token.expose());
            }

            // Transport failures pass through untouched; they say nothing
            // about credential validity.
            let response = request.send().await?;
            let status = response.status();

            if status != StatusCode::UNAUTHORIZED {
                if status.is_success() {
                    return Ok(response);
                }
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::from_status(status, &body));
            }

            let body = response.text().await.unwrap_or_default();
            if retried {
                debug!(%url, "request unauthorized after refreshed retry");
                return Err(self.teardown_session(&body).await);
            }
            retried = true;

            if !self.inner.refresh.refresh().await {
                return Err(self.teardown_session(&body).await);
            }
        }
    }

    /// Tear down the session: vault first, then the hook, then the error.
    async fn teardown_session(&self, body: &str) -> ApiError {
        warn!("session no longer valid, clearing credentials");
        self.inner.vault.clear_session().await;
        self.inner.unauthorized.notify().await;
        ApiError::Unauthorized {
            message: error_message(body, "session expired"),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.text().await?;
        let payload: Payload<T> = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("unexpected body: {}", e)))?;
        Ok(payload.into_inner())
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.inner.config.endpoint(path)?;
        let response = self.dispatch(Method::GET, url, None, None).await?;
        Self::decode(response).await
    }

    pub(crate) async fn get_json_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.inner.config.endpoint(path)?;
        let response = self.dispatch(Method::GET, url, Some(query), None).await?;
        Self::decode(response).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let url = self.inner.config.endpoint(path)?;
        let body = serde_json::to_value(body)?;
        let response = self.dispatch(Method::POST, url, None, Some(&body)).await?;
        Self::decode(response).await
    }

    /// POST whose response body we do not care about.
    pub(crate) async fn post_unit(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(), ApiError> {
        let url = self.inner.config.endpoint(path)?;
        self.dispatch(Method::POST, url, None, body).await?;
        Ok(())
    }

    pub(crate) async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let url = self.inner.config.endpoint(path)?;
        let body = serde_json::to_value(body)?;
        let response = self.dispatch(Method::PUT, url, None, Some(&body)).await?;
        Self::decode(response).await
    }

    /// Unauthenticated POST for the pre-session endpoints (login,
    /// register, password recovery).
    ///
    /// No bearer is attached and a 401 here means the submitted
    /// credentials were wrong, so there is no refresh, no retry, and no
    /// session teardown.
    pub(crate) async fn post_public<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let url = self.inner.config.endpoint(path)?;
        let response = self.inner.http.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }
        Self::decode(response).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .finish()
    }
}
