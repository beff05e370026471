// Refresh episode state
// One flag plus one waiter queue, guarded together by a single mutex

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{ApiError, RefreshError};
use crate::queue::{Waiter, WaiterQueue};

struct Episode {
    in_flight: bool,
    waiters: WaiterQueue<String, RefreshError>,
}

/// What a request that hit a 401 should do next
pub(crate) enum Admission {
    /// Another episode already produced a newer token; replay with it
    Replay(String),

    /// A refresh is running; wait for its outcome
    Wait(Waiter<String, RefreshError>),

    /// This request started the episode. `guard` goes to whatever performs the
    /// exchange; `outcome` settles together with the parked waiters.
    Lead {
        guard: EpisodeGuard,
        outcome: Waiter<String, RefreshError>,
    },
}

/// Owns the single-flight state of one client
pub(crate) struct RefreshCoordinator {
    state: Mutex<Episode>,
    max_waiters: usize,
}

impl RefreshCoordinator {
    pub fn new(max_waiters: usize) -> Self {
        Self {
            state: Mutex::new(Episode {
                in_flight: false,
                waiters: WaiterQueue::new(),
            }),
            max_waiters,
        }
    }

    /// Decide the role of a request that hit a 401.
    ///
    /// `newer_token` runs inside the critical section, only when no refresh is
    /// running, and returns a stored token that differs from the one the
    /// request was sent with.
    pub fn admit<F>(self: &Arc<Self>, newer_token: F) -> Result<Admission, ApiError>
    where
        F: FnOnce() -> Result<Option<String>, ApiError>,
    {
        let mut episode = self.state.lock();

        if episode.in_flight {
            if episode.waiters.len() >= self.max_waiters {
                return Err(ApiError::QueueFull {
                    limit: self.max_waiters,
                });
            }
            return Ok(Admission::Wait(episode.waiters.enqueue()));
        }

        if let Some(token) = newer_token()? {
            return Ok(Admission::Replay(token));
        }

        episode.in_flight = true;
        let mut leader = WaiterQueue::new();
        let outcome = leader.enqueue();
        Ok(Admission::Lead {
            guard: EpisodeGuard {
                coordinator: Arc::clone(self),
                leader,
                settled: false,
            },
            outcome,
        })
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().in_flight
    }

    /// Requests parked behind the running refresh, not counting the one that started it
    pub fn pending_waiters(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Clear the flag and take the parked waiters in one critical section
    fn finish(&self) -> WaiterQueue<String, RefreshError> {
        let mut episode = self.state.lock();
        episode.in_flight = false;
        std::mem::take(&mut episode.waiters)
    }
}

/// Settles one episode. Dropping it unsettled fails everyone with `Abandoned`.
pub(crate) struct EpisodeGuard {
    coordinator: Arc<RefreshCoordinator>,
    leader: WaiterQueue<String, RefreshError>,
    settled: bool,
}

impl EpisodeGuard {
    /// Release the leader and every waiter with the new access token
    pub fn resolve(mut self, token: &str) -> usize {
        self.settled = true;
        let mut waiters = self.coordinator.finish();
        let released = waiters.len();
        self.leader.resolve_all(token.to_string());
        waiters.resolve_all(token.to_string());
        released
    }

    /// Fail the leader and every waiter with the refresh error
    pub fn reject(mut self, error: RefreshError) -> usize {
        self.settled = true;
        let mut waiters = self.coordinator.finish();
        let released = waiters.len();
        self.leader.reject_all(error.clone());
        waiters.reject_all(error);
        released
    }
}

impl Drop for EpisodeGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut waiters = self.coordinator.finish();
        tracing::warn!(
            waiters = waiters.len(),
            "Refresh abandoned before completion, failing parked requests"
        );
        self.leader.reject_all(RefreshError::Abandoned);
        waiters.reject_all(RefreshError::Abandoned);
    }
}
