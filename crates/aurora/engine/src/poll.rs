//! Reusable polling strategy.
//!
//! The three status-check steps share one classification: a probed status
//! either lets the chain advance, fails the step, or means the cloud-side
//! operation is still converging and the step should re-dispatch itself.

/// How a poller treats an absent resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Absence is the goal (deletion polling).
    Advance,
    /// Absence is expected during convergence (copy/restore polling).
    Wait,
}

/// A polling step's state machine.
#[derive(Debug, Clone, Copy)]
pub struct PollSpec {
    /// Statuses that complete the poll.
    pub advance_on: &'static [&'static str],
    /// Statuses that fail the step terminally.
    pub fail_on: &'static [&'static str],
    /// Treatment of an absent resource.
    pub missing: MissingPolicy,
}

/// Verdict for one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollVerdict {
    Advance,
    /// Still converging; the observed status (or "pending" when absent).
    Wait(String),
    /// Terminal failure; the observed status.
    Fail(String),
}

/// Classify one probe result against a spec.
pub fn classify(status: Option<&str>, spec: &PollSpec) -> PollVerdict {
    match status {
        None => match spec.missing {
            MissingPolicy::Advance => PollVerdict::Advance,
            MissingPolicy::Wait => PollVerdict::Wait("pending".to_string()),
        },
        Some(status) if spec.advance_on.contains(&status) => PollVerdict::Advance,
        Some(status) if spec.fail_on.contains(&status) => PollVerdict::Fail(status.to_string()),
        Some(status) => PollVerdict::Wait(status.to_string()),
    }
}
