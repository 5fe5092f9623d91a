use serde::{Deserialize, Serialize};

use crate::Command;

/// Closed enumeration of response statuses the world service can return for
/// an executed command. Everything except `Ok` is a domain failure: expected,
/// recoverable, and never a crash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Ok,
    InsufficientFunds,
    Unauthorized,
    /// A precondition held in the agent's stale view but not on the service.
    StalePrecondition,
    TargetNotFound,
    BarredFromFief,
    AlreadyDoneThisSeason,
    BudgetExhausted,
    /// The command is valid but cannot apply yet (e.g. siege not ripe).
    NotYetApplicable,
}

impl StatusCode {
    #[inline]
    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }
}

/// Result of executing one command against the world service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub command: Command,
    pub status: StatusCode,
    /// Exact time-budget consumption, when the service reports it. Absent
    /// for legacy calls; the accountant then falls back to an estimate.
    #[serde(default)]
    pub cost_reported: Option<u32>,
}
