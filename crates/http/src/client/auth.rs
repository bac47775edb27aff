//! Authentication API client methods

use super::{ClientError, LeaseClient};
use crate::session::{Session, User};
use crate::types::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest};
use reqwest::Method;
use tracing::info;

impl LeaseClient {
    /// Log in and start a new session.
    ///
    /// On success the session is stored and the auto-refresh timer started.
    /// Bad credentials come back as [`ClientError::AuthenticationFailed`]
    /// without any refresh attempt.
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<User, ClientError> {
        let path = self.config().login_path.clone();
        let request = self.request(Method::POST, &path).json(&LoginRequest {
            email: email.into(),
            password: password.into(),
        })?;
        let response: AuthResponse = self.execute(request).await?;
        self.begin_session(response)
    }

    /// Create an account and start a session for it
    pub async fn register(&self, registration: &RegisterRequest) -> Result<User, ClientError> {
        let path = self.config().register_path.clone();
        let request = self.request(Method::POST, &path).json(registration)?;
        let response: AuthResponse = self.execute(request).await?;
        self.begin_session(response)
    }

    /// Fetch the logged-in user's profile
    pub async fn profile(&self) -> Result<User, ClientError> {
        let path = self.config().profile_path.clone();
        let profile: ProfileResponse = self.execute(self.request(Method::GET, &path)).await?;
        Ok(User {
            id: profile.id,
            email: profile.email,
            name: profile.name,
        })
    }

    /// Resume a session left in storage by an earlier run.
    ///
    /// Starts the auto-refresh timer when a session is found.
    pub fn restore(&self) -> Result<Option<User>, ClientError> {
        let Some(session) = self.store().get()? else {
            return Ok(None);
        };
        self.start_auto_refresh();
        info!(user = %session.user.email, "Restored stored session");
        Ok(Some(session.user))
    }

    /// End the session: stop the timer and forget every credential
    pub fn logout(&self) -> Result<(), ClientError> {
        self.stop_auto_refresh();
        self.inner.coordinator.advance_epoch();
        self.store().clear()?;
        info!("Logged out");
        Ok(())
    }

    /// User of the stored session, if any
    pub fn current_user(&self) -> Result<Option<User>, ClientError> {
        Ok(self.store().get()?.map(|session| session.user))
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.store().get(), Ok(Some(_)))
    }

    fn begin_session(&self, response: AuthResponse) -> Result<User, ClientError> {
        let user = User {
            id: response.uid,
            email: response.email,
            name: response.name,
        };
        self.inner.coordinator.advance_epoch();
        self.store().save(&Session {
            access_token: response.token,
            refresh_token: response.refresh_token,
            user: user.clone(),
        })?;
        self.start_auto_refresh();
        info!(user = %user.email, "Session started");
        Ok(user)
    }
}
