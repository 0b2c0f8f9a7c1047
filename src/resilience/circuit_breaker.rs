//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, attempts pass through
//! - Open: upstream assumed down, attempts fail fast
//! - Half-Open: bounded number of probes test recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count reaches failure_threshold
//! Open → Half-Open: after recovery timeout, on the next allow()
//! Half-Open → Closed: all permitted probes succeed
//! Half-Open → Open: any probe fails
//! ```
//!
//! # Design Decisions
//! - Consecutive-failure counting: any success while Closed resets the count
//! - A single Half-Open failure reopens the breaker immediately
//! - allow() and report() take the same mutex, so the Open → Half-Open
//!   decision and probe admission cannot race past the trial limit
//! - The lock is only held for the decision, never across the upstream call

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::BreakerConfig;
use crate::observability::metrics;
use crate::resilience::outcome::Outcome;

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }

    /// Gauge encoding: 0=Closed, 1=Open, 2=HalfOpen.
    pub fn as_gauge(self) -> f64 {
        match self {
            BreakerState::Closed => 0.0,
            BreakerState::Open => 1.0,
            BreakerState::HalfOpen => 2.0,
        }
    }
}

#[derive(Debug)]
enum State {
    Closed { failure_count: u32 },
    Open { opened_at: Instant },
    HalfOpen { started: u32, succeeded: u32 },
}

impl State {
    fn kind(&self) -> BreakerState {
        match self {
            State::Closed { .. } => BreakerState::Closed,
            State::Open { .. } => BreakerState::Open,
            State::HalfOpen { .. } => BreakerState::HalfOpen,
        }
    }
}

/// Circuit breaker guarding one upstream dependency.
///
/// One instance lives for the whole process and is shared by every
/// concurrent handler task.
pub struct CircuitBreaker {
    state: Mutex<State>,
    failure_threshold: u32,
    recovery_timeout: Duration,
    half_open_trials: u32,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration, half_open_trials: u32) -> Self {
        let breaker = Self {
            state: Mutex::new(State::Closed { failure_count: 0 }),
            failure_threshold,
            recovery_timeout,
            half_open_trials,
        };
        metrics::set_breaker_state(BreakerState::Closed);
        breaker
    }

    pub fn from_config(config: &BreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_millis(config.recovery_timeout_ms),
            config.half_open_trials,
        )
    }

    /// Decide whether an upstream attempt may proceed.
    ///
    /// Returns false while Open before the recovery timeout has elapsed, and
    /// while Half-Open once the probe budget is exhausted. The Open →
    /// Half-Open transition happens here, atomically with the decision.
    pub fn allow(&self) -> bool {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        match *state {
            State::Closed { .. } => true,
            State::Open { opened_at } => {
                if opened_at.elapsed() >= self.recovery_timeout {
                    // The caller becomes the first probe.
                    *state = State::HalfOpen {
                        started: 1,
                        succeeded: 0,
                    };
                    self.publish(BreakerState::HalfOpen);
                    true
                } else {
                    false
                }
            }
            State::HalfOpen { ref mut started, .. } => {
                if *started < self.half_open_trials {
                    *started += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Feed back the outcome of an attempt that `allow()` permitted.
    ///
    /// Only ok/error/timeout outcomes are evidence; shed and breaker-open
    /// never reach this point.
    pub fn report(&self, outcome: Outcome) {
        debug_assert!(outcome.is_breaker_evidence());

        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        match *state {
            State::Closed { ref mut failure_count } => {
                if outcome.is_failure() {
                    *failure_count += 1;
                    if *failure_count >= self.failure_threshold {
                        *state = State::Open {
                            opened_at: Instant::now(),
                        };
                        self.publish(BreakerState::Open);
                    }
                } else {
                    *failure_count = 0;
                }
            }
            State::HalfOpen { ref mut succeeded, .. } => {
                if outcome.is_failure() {
                    *state = State::Open {
                        opened_at: Instant::now(),
                    };
                    self.publish(BreakerState::Open);
                } else {
                    *succeeded += 1;
                    if *succeeded >= self.half_open_trials {
                        *state = State::Closed { failure_count: 0 };
                        self.publish(BreakerState::Closed);
                    }
                }
            }
            State::Open { .. } => {
                // A probe started in Half-Open can finish after another probe
                // already reopened the circuit. Its result is stale.
                tracing::debug!(outcome = outcome.as_label(), "ignoring late probe report");
            }
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> BreakerState {
        self.state
            .lock()
            .expect("circuit breaker mutex poisoned")
            .kind()
    }

    fn publish(&self, state: BreakerState) {
        tracing::info!(state = state.as_str(), "circuit breaker transition");
        metrics::set_breaker_state(state);
    }
}
