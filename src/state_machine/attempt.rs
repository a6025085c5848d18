use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::outcome::Outcome;
use super::state::FlowState;
use crate::discovery::Item;
use crate::form::Fingerprint;

/// Bounds that guarantee every flow terminates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowLimits {
    /// Review clicks allowed before the flow escalates to submit-or-discard.
    #[serde(default = "default_max_review_attempts")]
    pub max_review_attempts: u32,
    /// Consecutive unchanged step observations that count as stuck.
    #[serde(default = "default_stall_threshold")]
    pub stall_threshold: u32,
    /// Hard ceiling on observed steps per item.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Attempts per escalation stage when hardening numeric fields.
    #[serde(default = "default_numeric_attempts")]
    pub numeric_attempts: u32,
}

fn default_max_review_attempts() -> u32 {
    2
}

fn default_stall_threshold() -> u32 {
    3
}

fn default_max_steps() -> u32 {
    30
}

fn default_numeric_attempts() -> u32 {
    2
}

impl Default for FlowLimits {
    fn default() -> Self {
        Self {
            max_review_attempts: default_max_review_attempts(),
            stall_threshold: default_stall_threshold(),
            max_steps: default_max_steps(),
            numeric_attempts: default_numeric_attempts(),
        }
    }
}

/// One pass of the submission flow for one item.
///
/// Owned by the engine for the duration of the flow and dropped afterwards;
/// only the resulting ledger entry outlives it.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub item: Item,
    pub state: FlowState,
    pub state_history: Vec<FlowState>,
    pub steps: u32,
    pub review_attempts: u32,
    pub stall_count: u32,
    pub last_fingerprint: Option<Fingerprint>,
    pub limits: FlowLimits,
    pub started_at: DateTime<Utc>,
    pub outcome: Option<Outcome>,
}

impl Attempt {
    pub fn new(item: Item, limits: FlowLimits) -> Self {
        Self {
            item,
            state: FlowState::Filling,
            state_history: Vec::new(),
            steps: 0,
            review_attempts: 0,
            stall_count: 0,
            last_fingerprint: None,
            limits,
            started_at: Utc::now(),
            outcome: None,
        }
    }

    /// Records a click that keeps the flow in `Filling`.
    pub fn reenter(&mut self) {
        self.state_history.push(self.state);
        self.state = FlowState::Filling;
    }

    /// Moves the attempt into the terminal state matching `outcome`.
    pub fn finish(&mut self, outcome: Outcome) {
        debug_assert!(!self.state.is_terminal(), "attempt finished twice");
        self.state_history.push(self.state);
        self.state = outcome.state();
        self.outcome = Some(outcome);
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}
