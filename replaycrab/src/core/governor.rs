//! Per-operation call-rate governor
//!
//! This module provides the [`RateGovernor`] which enforces a minimum interval
//! between consecutive invocations of the same named operation. Each operation
//! keeps its own [`ThrottleState`], so throttling one operation never delays
//! another.
//!
//! # Atomicity
//!
//! The read-wait-record sequence for an operation runs while holding that
//! operation's async mutex. A second caller of the same operation queues on
//! the mutex and only observes the timestamp written by the first, so two
//! callers can never both pass within one interval.
//!
//! # Example
//!
//! ```
//! use replaycrab::RateGovernor;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let governor = RateGovernor::new();
//!
//! let permit = governor.throttle("get_scores", Duration::from_millis(100)).await;
//! assert_eq!(permit.operation(), "get_scores");
//! # });
//! ```

use crate::error::{ReplayError, Result};
use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;


/// Throttle bookkeeping for a single operation
#[derive(Debug, Clone)]
pub struct ThrottleState {
    operation: String,
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl ThrottleState {
    fn new(operation: &str) -> Self {
        ThrottleState {
            operation: operation.to_owned(),
            min_interval: Duration::ZERO,
            last_call: None,
        }
    }

    /// Name of the throttled operation
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Minimum interval used by the most recent call
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Instant of the most recent granted call
    pub fn last_call(&self) -> Option<Instant> {
        self.last_call
    }

    /// Time left before the next call may proceed
    fn remaining(&self, min_interval: Duration, now: Instant) -> Duration {
        match self.last_call {
            Some(last) => min_interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    fn record(&mut self, min_interval: Duration, now: Instant) {
        self.min_interval = min_interval;
        self.last_call = Some(now);
    }
}

/// Proof that an operation was allowed to proceed
///
/// The call has already been recorded against the operation's schedule when
/// the permit is handed out, so a failing operation still counts.
#[derive(Debug, Clone)]
pub struct Permit {
    operation: String,
    granted_at: Instant,
    waited: Duration,
}

impl Permit {
    /// Name of the operation this permit was granted for
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Instant the permit was granted
    pub fn granted_at(&self) -> Instant {
        self.granted_at
    }

    /// How long the caller was suspended before the grant
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

type SharedState = Arc<tokio::sync::Mutex<ThrottleState>>;

/// Governs how often named operations may run
///
/// The governor is cheap to share behind an [`Arc`]; all clones of that
/// `Arc` observe the same per-operation schedules.
#[derive(Debug, Default)]
pub struct RateGovernor {
    states: Mutex<HashMap<String, SharedState, RandomState>>,
}

impl RateGovernor {
    /// Create a governor with no recorded operations
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, operation: &str) -> SharedState {
        let mut states = self.states.lock();
        if let Some(state) = states.get(operation) {
            return Arc::clone(state);
        }
        let state = Arc::new(tokio::sync::Mutex::new(ThrottleState::new(operation)));
        states.insert(operation.to_owned(), Arc::clone(&state));
        state
    }

    /// Wait until `operation` may run again, then record the call
    ///
    /// If the previous call of `operation` happened less than `min_interval`
    /// ago, the calling task sleeps for the remaining difference. Other
    /// operations are unaffected.
    pub async fn throttle(&self, operation: &str, min_interval: Duration) -> Permit {
        let state = self.state(operation);
        let mut state = state.lock().await;

        let wait = state.remaining(min_interval, Instant::now());
        if !wait.is_zero() {
            tracing::debug!(operation, ?wait, "throttling call");
            tokio::time::sleep(wait).await;
        }

        let now = Instant::now();
        state.record(min_interval, now);

        Permit {
            operation: state.operation.clone(),
            granted_at: now,
            waited: wait,
        }
    }

    /// Record the call only if `operation` may run right now
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Throttled`] with the remaining wait when the
    /// interval has not yet elapsed, or when another caller is currently
    /// waiting on the same operation. A rejected call is not recorded.
    pub fn try_throttle(&self, operation: &str, min_interval: Duration) -> Result<Permit> {
        let state = self.state(operation);
        let Ok(mut state) = state.try_lock() else {
            return Err(ReplayError::Throttled {
                operation: operation.to_owned(),
                retry_after: min_interval,
            });
        };

        let now = Instant::now();
        let retry_after = state.remaining(min_interval, now);
        if !retry_after.is_zero() {
            return Err(ReplayError::Throttled {
                operation: operation.to_owned(),
                retry_after,
            });
        }

        state.record(min_interval, now);
        Ok(Permit {
            operation: state.operation.clone(),
            granted_at: now,
            waited: Duration::ZERO,
        })
    }

    /// Instant of the last granted call of `operation`
    ///
    /// Returns `None` for unknown operations and for operations whose state is
    /// currently held by a waiting caller.
    pub fn last_call(&self, operation: &str) -> Option<Instant> {
        let state = self.states.lock().get(operation).map(Arc::clone)?;
        let state = state.try_lock().ok()?;
        state.last_call()
    }

    /// Names of every operation the governor has seen
    pub fn operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.states.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
