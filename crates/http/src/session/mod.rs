//! Session state: stored credentials, token refresh and the keep-alive timer

pub mod redirect;
pub mod refresh;
pub mod scheduler;
pub mod store;

pub use redirect::{LoginRedirect, NoRedirect};
pub use refresh::{Leader, RefreshCoordinator, RefreshOutcome, Ticket, Waiter};
pub use scheduler::{AutoRefresh, TickOutcome};
pub use store::{CredentialStore, FileStorage, MemoryStorage, SessionStorage, StorageError};

use serde::{Deserialize, Serialize};

/// Identity of the logged-in user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Credentials held for the lifetime of a login
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: User,
}
