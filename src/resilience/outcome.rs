//! Outcome classification for handled requests.

/// Classified result of one inbound request against the upstream dependency.
///
/// `Shed` and `BreakerOpen` mean the upstream was never contacted; they carry
/// no latency and are not breaker evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Upstream call completed within budget and succeeded.
    Ok,
    /// Upstream call completed within budget but signalled failure.
    Error,
    /// Upstream call did not complete within the per-request deadline.
    Timeout,
    /// Short-circuited by the open circuit breaker; no upstream call made.
    BreakerOpen,
    /// Rejected by admission control before any upstream interaction.
    Shed,
}

impl Outcome {
    /// Stable label used for metrics series.
    pub fn as_label(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Error => "error",
            Outcome::Timeout => "timeout",
            Outcome::BreakerOpen => "breaker_open",
            Outcome::Shed => "shed",
        }
    }

    /// Whether this outcome counts as evidence for the circuit breaker.
    pub fn is_breaker_evidence(self) -> bool {
        matches!(self, Outcome::Ok | Outcome::Error | Outcome::Timeout)
    }

    /// Whether this outcome counts against the dependency.
    pub fn is_failure(self) -> bool {
        matches!(self, Outcome::Error | Outcome::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protective_outcomes_are_not_breaker_evidence() {
        assert!(!Outcome::Shed.is_breaker_evidence());
        assert!(!Outcome::BreakerOpen.is_breaker_evidence());
        assert!(Outcome::Ok.is_breaker_evidence());
        assert!(Outcome::Timeout.is_breaker_evidence());
    }

    #[test]
    fn timeout_is_a_failure_but_ok_is_not() {
        assert!(Outcome::Timeout.is_failure());
        assert!(Outcome::Error.is_failure());
        assert!(!Outcome::Ok.is_failure());
    }
}
