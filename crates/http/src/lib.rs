//! Leasedesk HTTP client
//!
//! A session-aware client for the Leasedesk property-management API. It keeps
//! the login session in a [`CredentialStore`](session::CredentialStore),
//! attaches the access token to every call, refreshes the token at most once
//! per burst of 401 responses, and keeps the token fresh in the background.

pub mod client;
pub mod session;
pub mod types;

pub use client::config::ClientConfig;
pub use client::error::{ClientError, RefreshFailure};
pub use client::request::PendingRequest;
pub use client::{LeaseClient, LeaseClientBuilder};
pub use session::{CredentialStore, FileStorage, LoginRedirect, MemoryStorage, Session, User};
