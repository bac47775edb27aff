//! Single-flight token refresh
//!
//! The first caller to [`RefreshCoordinator::begin`] while idle gets a
//! [`Ticket::Leader`] and is the only one allowed to call the refresh endpoint.
//! Callers arriving while that refresh is outstanding get a [`Ticket::Waiter`]
//! and are resumed with the leader's outcome when it settles.
//!
//! The idle/refreshing transition is a check-and-set under one mutex, so it
//! holds on a multi-threaded runtime as well.

use crate::client::error::RefreshFailure;
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;

/// New access token, or the reason the refresh failed
pub type RefreshOutcome = Result<String, RefreshFailure>;

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

#[derive(Debug, Default)]
struct Inner {
    state: State,
    epoch: u64,
}

/// Refresh state shared by every request of one client
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    inner: Mutex<Inner>,
}

/// Result of asking to refresh
#[derive(Debug)]
pub enum Ticket<'a> {
    /// This caller performs the refresh and must settle it
    Leader(Leader<'a>),
    /// A refresh is already running; wait for its outcome
    Waiter(Waiter),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join the in-flight refresh, or become the one that performs it
    pub fn begin(&self) -> Ticket<'_> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if let State::Refreshing { waiters } = &mut inner.state {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            tracing::debug!(queued = waiters.len(), "Queued request behind token refresh");
            return Ticket::Waiter(Waiter { rx });
        }

        inner.state = State::Refreshing {
            waiters: Vec::new(),
        };
        Ticket::Leader(Leader {
            coordinator: self,
            epoch: inner.epoch,
            settled: false,
        })
    }

    /// Whether a refresh is outstanding
    pub fn is_refreshing(&self) -> bool {
        matches!(self.lock().state, State::Refreshing { .. })
    }

    /// Number of requests queued behind the outstanding refresh
    pub fn waiting(&self) -> usize {
        match &self.lock().state {
            State::Refreshing { waiters } => waiters.len(),
            State::Idle => 0,
        }
    }

    /// Current session epoch
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Start a new session epoch (login, registration or logout).
    ///
    /// A refresh that began in an earlier epoch still settles its waiters, but
    /// its leader will see that its result is stale.
    pub fn advance_epoch(&self) -> u64 {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.epoch
    }

    fn settle(&self, outcome: &RefreshOutcome) -> usize {
        let waiters = {
            let mut inner = self.lock();
            match std::mem::take(&mut inner.state) {
                State::Refreshing { waiters } => waiters,
                State::Idle => Vec::new(),
            }
        };
        let count = waiters.len();
        for waiter in waiters {
            // A waiter whose request future was dropped no longer listens
            let _ = waiter.send(outcome.clone());
        }
        count
    }
}

/// Permission to perform the refresh.
///
/// Dropping it unsettled fails every waiter, so a cancelled leader cannot
/// leave the coordinator stuck in the refreshing state.
#[derive(Debug)]
pub struct Leader<'a> {
    coordinator: &'a RefreshCoordinator,
    epoch: u64,
    settled: bool,
}

impl Leader<'_> {
    /// Epoch in which this refresh started
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether no login or logout happened since this refresh started
    pub fn is_current(&self) -> bool {
        self.coordinator.epoch() == self.epoch
    }

    /// Return to idle and resume every waiter; returns how many were resumed
    pub fn settle(mut self, outcome: &RefreshOutcome) -> usize {
        self.settled = true;
        self.coordinator.settle(outcome)
    }
}

impl Drop for Leader<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator
                .settle(&Err(RefreshFailure::new(None, "token refresh was abandoned")));
        }
    }
}

/// A request parked until the outstanding refresh settles
#[derive(Debug)]
pub struct Waiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl Waiter {
    pub async fn wait(self) -> RefreshOutcome {
        self.rx
            .await
            .unwrap_or_else(|_| Err(RefreshFailure::new(None, "token refresh was abandoned")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(ticket: Ticket<'_>) -> Leader<'_> {
        match ticket {
            Ticket::Leader(leader) => leader,
            Ticket::Waiter(_) => panic!("expected to lead the refresh"),
        }
    }

    fn waiter(ticket: Ticket<'_>) -> Waiter {
        match ticket {
            Ticket::Waiter(waiter) => waiter,
            Ticket::Leader(_) => panic!("expected to wait for the refresh"),
        }
    }

    #[tokio::test]
    async fn only_first_caller_leads() {
        let coordinator = RefreshCoordinator::new();
        let lead = leader(coordinator.begin());
        let first = waiter(coordinator.begin());
        let second = waiter(coordinator.begin());
        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.waiting(), 2);

        assert_eq!(lead.settle(&Ok("t2".into())), 2);
        assert!(!coordinator.is_refreshing());
        assert_eq!(first.wait().await, Ok("t2".into()));
        assert_eq!(second.wait().await, Ok("t2".into()));
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter() {
        let coordinator = RefreshCoordinator::new();
        let lead = leader(coordinator.begin());
        let queued = waiter(coordinator.begin());

        let failure = RefreshFailure::new(Some(401), "refresh token expired");
        lead.settle(&Err(failure.clone()));
        assert_eq!(queued.wait().await, Err(failure));
    }

    #[tokio::test]
    async fn dropped_leader_releases_waiters() {
        let coordinator = RefreshCoordinator::new();
        let lead = leader(coordinator.begin());
        let queued = waiter(coordinator.begin());

        drop(lead);
        assert!(!coordinator.is_refreshing());
        assert!(queued.wait().await.is_err());

        // Idle again, so the next caller leads
        let _lead = leader(coordinator.begin());
    }

    #[test]
    fn epoch_change_marks_leader_stale() {
        let coordinator = RefreshCoordinator::new();
        let lead = leader(coordinator.begin());
        assert!(lead.is_current());

        coordinator.advance_epoch();
        assert!(!lead.is_current());
        lead.settle(&Ok("t2".into()));
    }
}
