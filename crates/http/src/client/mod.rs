//! Leasedesk HTTP client
//!
//! Every authenticated call goes through [`LeaseClient::execute`], which
//! attaches the stored access token and, on a 401, refreshes the token once
//! and replays the call. Concurrent 401s share a single refresh.

pub mod auth;
pub mod config;
pub mod contracts;
pub mod error;
pub mod people;
pub mod properties;
pub mod request;

use crate::session::{
    AutoRefresh, CredentialStore, LoginRedirect, NoRedirect, RefreshCoordinator, SessionStorage,
    TickOutcome, Ticket,
};
use crate::types::{RefreshRequest, RefreshResponse};
use config::ClientConfig;
use error::{ClientError, RefreshFailure};
use request::{PendingRequest, authorize, error_from_response};
use reqwest::{Client, ClientBuilder, Method, Response, StatusCode};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Leasedesk API client.
///
/// Cheap to clone; clones share credentials, refresh state and the
/// auto-refresh timer.
#[derive(Clone)]
pub struct LeaseClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    base_url: String,
    config: ClientConfig,
    store: CredentialStore,
    coordinator: RefreshCoordinator,
    auto_refresh: AutoRefresh,
    redirect: Arc<dyn LoginRedirect>,
}

impl LeaseClient {
    /// Create a new client with default configuration and in-memory credentials
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> LeaseClientBuilder {
        LeaseClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Credential store backing this client
    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    /// Whether a token refresh is outstanding
    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    /// Whether the background refresh timer is running
    pub fn is_auto_refreshing(&self) -> bool {
        self.inner.auto_refresh.is_running()
    }

    /// Describe a request to `path`, relative to the base URL
    pub fn request(&self, method: Method, path: &str) -> PendingRequest {
        PendingRequest::new(method, path)
    }

    /// Execute an authenticated request and decode its JSON body
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: PendingRequest,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// Execute an authenticated request whose body is not needed
    pub async fn execute_empty(&self, request: PendingRequest) -> Result<(), ClientError> {
        self.send(request).await?;
        Ok(())
    }

    /// Send a request, recovering from a stale access token.
    ///
    /// A 401 triggers (or joins) a token refresh and one replay. A 401 on the
    /// replay, on an exempt endpoint, or without a stored session is returned
    /// as is. A request whose session ended while it was outstanding gets
    /// [`ClientError::NotAuthenticated`].
    pub async fn send(&self, mut request: PendingRequest) -> Result<Response, ClientError> {
        let mut token = self.inner.store.access_token()?;

        loop {
            debug!(
                method = %request.method,
                path = %request.path,
                retry = request.retried,
                "Sending request"
            );
            let builder = authorize(
                request.build(&self.inner.http, &self.inner.base_url),
                token.as_deref(),
            );
            let response = builder.send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            let error = error_from_response(response).await;
            if status != StatusCode::UNAUTHORIZED
                || request.retried
                || self.inner.config.is_refresh_exempt(&request.path)
            {
                return Err(error);
            }
            request.retried = true;

            // Another request already refreshed or ended the session this one was sent with
            let current = self.inner.store.access_token()?;
            if current != token {
                let Some(current) = current else {
                    debug!(path = %request.path, "Session ended while request was outstanding");
                    return Err(ClientError::NotAuthenticated);
                };
                debug!(path = %request.path, "Token changed since request was sent; retrying");
                token = Some(current);
                continue;
            }

            // No session, nothing to refresh
            if token.is_none() {
                return Err(error);
            }

            // A session without a refresh token still ends through the shared
            // failure path, but the caller sees the backend's own answer
            let refreshable = self.inner.store.refresh_token()?.is_some();
            match self.refresh_session().await {
                Ok(fresh) => token = Some(fresh),
                Err(_) if !refreshable => return Err(error),
                Err(e) => return Err(e),
            }
        }
    }

    /// Refresh the access token, or wait for the refresh already in flight.
    ///
    /// Only one refresh call reaches the backend at a time. When it fails the
    /// session is cleared, the auto-refresh timer stops, the login redirect
    /// fires, and every waiting caller gets the same failure.
    pub async fn refresh_session(&self) -> Result<String, ClientError> {
        let leader = match self.inner.coordinator.begin() {
            Ticket::Waiter(waiter) => {
                return waiter.wait().await.map_err(ClientError::RefreshFailed);
            }
            Ticket::Leader(leader) => leader,
        };

        let result = self.call_refresh_endpoint().await;

        if !leader.is_current() {
            // Logged out or logged in again while the refresh was outstanding
            let failure = RefreshFailure::new(None, "session changed during token refresh");
            leader.settle(&Err(failure.clone()));
            debug!("Discarded refresh result from a previous session");
            return Err(ClientError::RefreshFailed(failure));
        }

        let stored = result.and_then(|response| {
            self.inner
                .store
                .update_tokens(&response.token, response.refresh_token.as_deref())?;
            Ok(response.token)
        });

        match stored {
            Ok(token) => {
                let resumed = leader.settle(&Ok(token.clone()));
                info!(resumed, "Access token refreshed");
                Ok(token)
            }
            Err(e) => {
                let failure = RefreshFailure::from_error(&e);
                warn!(error = %failure, "Token refresh failed; ending session");
                self.end_session();
                let rejected = leader.settle(&Err(failure.clone()));
                debug!(rejected, "Rejected queued requests");
                self.inner.redirect.redirect_to_login();
                Err(ClientError::RefreshFailed(failure))
            }
        }
    }

    async fn call_refresh_endpoint(&self) -> Result<RefreshResponse, ClientError> {
        let refresh_token = self
            .inner
            .store
            .refresh_token()?
            .ok_or(ClientError::NotAuthenticated)?;

        let url = format!("{}{}", self.inner.base_url, self.inner.config.refresh_path);
        let call = async {
            let response = self
                .inner
                .http
                .post(url)
                .json(&RefreshRequest { refresh_token })
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }
            Ok::<_, ClientError>(response.json::<RefreshResponse>().await?)
        };

        let timeout = self.inner.config.refresh_timeout();
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| ClientError::Timeout(timeout))?
    }

    /// Drop the stored session and stop the timer
    fn end_session(&self) {
        self.inner.auto_refresh.stop();
        if let Err(e) = self.inner.store.clear() {
            error!(error = %e, "Failed to clear stored session");
        }
    }

    /// Start the background refresh timer. Returns `false` if already running.
    pub fn start_auto_refresh(&self) -> bool {
        let weak: Weak<ClientInner> = Arc::downgrade(&self.inner);
        self.inner
            .auto_refresh
            .start(self.inner.config.auto_refresh_interval(), move || {
                let weak = weak.clone();
                async move {
                    let Some(inner) = weak.upgrade() else {
                        return TickOutcome::Stop;
                    };
                    LeaseClient { inner }.auto_refresh_tick().await
                }
            })
    }

    /// Stop the background refresh timer. Returns `false` if it was not running.
    pub fn stop_auto_refresh(&self) -> bool {
        self.inner.auto_refresh.stop()
    }

    async fn auto_refresh_tick(&self) -> TickOutcome {
        match self.inner.store.get() {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("No session; stopping auto refresh");
                return TickOutcome::Stop;
            }
            Err(e) => {
                warn!(error = %e, "Could not read session for auto refresh");
                return TickOutcome::Continue;
            }
        }

        match self.refresh_session().await {
            Ok(_) => TickOutcome::Continue,
            Err(e) => {
                warn!(error = %e, "Scheduled token refresh failed");
                // A newer login may have replaced the session mid-refresh
                if matches!(self.inner.store.get(), Ok(Some(_))) {
                    TickOutcome::Continue
                } else {
                    TickOutcome::Stop
                }
            }
        }
    }
}

impl std::fmt::Debug for LeaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaseClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// Builder for LeaseClient
#[derive(Default)]
pub struct LeaseClientBuilder {
    config: Option<ClientConfig>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    store: Option<CredentialStore>,
    redirect: Option<Arc<dyn LoginRedirect>>,
}

impl LeaseClientBuilder {
    /// Start from a full configuration; later setters override it
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Keep credentials in the given store
    pub fn store(mut self, store: CredentialStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Keep credentials in the given key-value storage
    pub fn storage(self, storage: Arc<dyn SessionStorage>) -> Self {
        self.store(CredentialStore::new(storage))
    }

    /// Hook fired when the session ends and the user must log in again
    pub fn on_login_redirect(mut self, redirect: impl LoginRedirect + 'static) -> Self {
        self.redirect = Some(Arc::new(redirect));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<LeaseClient, ClientError> {
        let mut config = self.config.unwrap_or_default();
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }

        if config.base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is required".into()));
        }
        if config.refresh_timeout_secs == 0 {
            return Err(ClientError::Configuration(
                "refresh_timeout_secs must be greater than zero".into(),
            ));
        }

        // Ensure base_url ends without a trailing slash
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new().user_agent(config.user_agent.clone());
        if let Some(timeout) = self.timeout.or_else(|| config.request_timeout()) {
            client_builder = client_builder.timeout(timeout);
        }
        let http = client_builder.build()?;

        Ok(LeaseClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                config,
                store: self.store.unwrap_or_else(CredentialStore::in_memory),
                coordinator: RefreshCoordinator::new(),
                auto_refresh: AutoRefresh::new(),
                redirect: self.redirect.unwrap_or_else(|| Arc::new(NoRedirect)),
            }),
        })
    }
}
