//! Polling primitives for convergence checks.
//!
//! This library provides helpers for waiting until an external system
//! reports the state we asked for. Key concepts:
//!
//! - **Budget**: How many extra rounds to poll and how long to sleep between them.
//! - **Observation**: A fresh read of the external system on each round.
//! - **Convergence**: The observation satisfies the caller's predicate.
//!
//! Two styles are offered. [`poll_until`] is a plain loop that gives up
//! silently and hands the last observation back to the caller. The
//! [`waiter`] module evaluates declarative acceptors against each response
//! and fails hard when its attempt budget runs out.
//!
//! # Invariants
//!
//! - Every round queries fresh; nothing is cached between rounds
//! - A poll always terminates after at most `attempts` sleeps

use std::future::Future;
use std::time::Duration;

use tracing::debug;

pub mod waiter;

pub use waiter::{
    Acceptor, AcceptorState, Matcher, OperationFailure, WaiterConfig, WaiterError, WaiterModel,
};

/// Convergence status of a finished poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The last observation satisfied the predicate.
    Converged,

    /// The budget ran out before the predicate held.
    Exhausted,
}

impl ConvergenceStatus {
    /// Returns true if the poll converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

impl std::fmt::Display for ConvergenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Retry budget for a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    /// Maximum number of extra rounds after the first observation.
    pub attempts: u32,

    /// Sleep between rounds.
    pub delay: Duration,
}

impl PollBudget {
    /// Create a new budget.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Upper bound on the time spent sleeping.
    pub fn max_wait(&self) -> Duration {
        self.delay * self.attempts
    }
}

/// Result of [`poll_until`].
#[derive(Debug, Clone)]
pub struct PollOutcome<T> {
    /// The last observation.
    pub value: T,

    /// Whether the last observation satisfied the predicate.
    pub status: ConvergenceStatus,

    /// Number of extra rounds used (sleeps performed).
    pub rounds: u32,
}

/// Observe, and keep re-observing until `done` holds or the budget is spent.
///
/// Running out of budget is not an error: the last observation is returned
/// with [`ConvergenceStatus::Exhausted`] so the caller decides what to do.
/// Errors from `observe` abort the poll immediately.
pub async fn poll_until<T, E, F, Fut, P>(
    budget: PollBudget,
    mut observe: F,
    mut done: P,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&T) -> bool,
{
    let mut value = observe().await?;
    let mut rounds = 0;
    let mut converged = done(&value);

    while !converged && rounds < budget.attempts {
        debug!(
            round = rounds + 1,
            max_rounds = budget.attempts,
            delay_secs = budget.delay.as_secs_f64(),
            "Not converged yet, sleeping"
        );
        tokio::time::sleep(budget.delay).await;
        rounds += 1;
        value = observe().await?;
        converged = done(&value);
    }

    let status = if converged {
        ConvergenceStatus::Converged
    } else {
        ConvergenceStatus::Exhausted
    };

    Ok(PollOutcome {
        value,
        status,
        rounds,
    })
}
