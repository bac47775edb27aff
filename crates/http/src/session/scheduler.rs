//! Background timer that refreshes the access token before it goes stale

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// What the timer should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// Repeating refresh timer. At most one timer task runs per instance.
#[derive(Debug, Default)]
pub struct AutoRefresh {
    running: Mutex<Option<CancellationToken>>,
}

impl AutoRefresh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking every `period`, first tick one period from now.
    ///
    /// Returns `false` without starting anything when a timer is already
    /// running. Must be called inside a tokio runtime.
    pub fn start<F, Fut>(&self, period: Duration, tick: F) -> bool
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = TickOutcome> + Send + 'static,
    {
        if period.is_zero() {
            tracing::warn!("Auto refresh interval is zero; not starting");
            return false;
        }

        let token = {
            let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
            if running.as_ref().is_some_and(|t| !t.is_cancelled()) {
                return false;
            }
            let token = CancellationToken::new();
            *running = Some(token.clone());
            token
        };

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = interval.tick() => {
                        if tick().await == TickOutcome::Stop {
                            token.cancel();
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Auto refresh timer exited");
        });

        tracing::info!(interval_secs = period.as_secs(), "Auto refresh started");
        true
    }

    /// Cancel the timer. Returns `false` if none was running.
    pub fn stop(&self) -> bool {
        let token = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match token {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                tracing::info!("Auto refresh stopped");
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        if let Some(token) = self
            .running
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PERIOD: Duration = Duration::from_secs(60);

    fn counting_tick(
        count: &Arc<AtomicUsize>,
        outcome: TickOutcome,
    ) -> impl Fn() -> std::future::Ready<TickOutcome> + Send + 'static {
        let count = count.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(outcome)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_ignored() {
        let timer = AutoRefresh::new();
        let count = Arc::new(AtomicUsize::new(0));

        assert!(timer.start(PERIOD, counting_tick(&count, TickOutcome::Continue)));
        assert!(!timer.start(PERIOD, counting_tick(&count, TickOutcome::Continue)));
        assert!(timer.is_running());

        tokio::time::sleep(PERIOD * 3 + PERIOD / 2).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_future_ticks() {
        let timer = AutoRefresh::new();
        let count = Arc::new(AtomicUsize::new(0));

        timer.start(PERIOD, counting_tick(&count, TickOutcome::Continue));
        tokio::time::sleep(PERIOD + PERIOD / 2).await;
        assert!(timer.stop());
        assert!(!timer.stop());

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn tick_can_stop_the_timer() {
        let timer = AutoRefresh::new();
        let count = Arc::new(AtomicUsize::new(0));

        timer.start(PERIOD, counting_tick(&count, TickOutcome::Stop));
        tokio::time::sleep(PERIOD * 4).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!timer.is_running());

        // A stopped timer can be started again
        assert!(timer.start(PERIOD, counting_tick(&count, TickOutcome::Stop)));
    }
}
