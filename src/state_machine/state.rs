use std::fmt;

use super::attempt::Attempt;
use super::outcome::Outcome;
use crate::form::{ControlKind, StepObservation};

/// States of one submission flow.
///
/// Every flow starts in `Filling` and re-enters it after each advance or
/// review click, until it lands in one of the four terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Filling,
    Submitted,
    Discarded,
    Skipped,
    Error,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FlowState::Filling)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowState::Filling => write!(f, "FILLING"),
            FlowState::Submitted => write!(f, "SUBMITTED"),
            FlowState::Discarded => write!(f, "DISCARDED"),
            FlowState::Skipped => write!(f, "SKIPPED"),
            FlowState::Error => write!(f, "ERROR"),
        }
    }
}

/// What the engine must do after observing a filled step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Click the submit control; the flow ends as `applied`.
    Submit,
    /// Click the review control. With `escalate` set, the review budget is
    /// spent: look for a submit control once more, otherwise discard.
    Review { escalate: bool },
    /// Click the advance control and observe the next step.
    Advance,
    /// Close the dialog, confirm the discard and record the outcome.
    Discard(Outcome),
    /// No recognised control: record the item as unsupported.
    Skip,
}

/// Pure decision function for the transition engine.
///
/// The engine reads the live dialog, builds a [`StepObservation`] and asks
/// [`StepMachine::next`] what to do; all counters live on the [`Attempt`].
pub struct StepMachine;

impl StepMachine {
    /// Decide the next action for `observation`, updating the attempt's
    /// counters.
    ///
    /// Order: step ceiling, submit, review, stall termination, advance,
    /// skip. The stall counter is updated on every call; it only ends the
    /// flow once submit and review had their chance.
    pub fn next(attempt: &mut Attempt, observation: &StepObservation) -> Decision {
        attempt.steps += 1;

        if attempt.last_fingerprint.as_ref() == Some(&observation.fingerprint) {
            attempt.stall_count += 1;
        } else {
            attempt.stall_count = 0;
            attempt.last_fingerprint = Some(observation.fingerprint.clone());
        }

        if attempt.steps > attempt.limits.max_steps {
            return Decision::Discard(Outcome::DiscardedStuck);
        }

        if observation.has(ControlKind::Submit) {
            return Decision::Submit;
        }

        if observation.has(ControlKind::Review) {
            attempt.review_attempts += 1;
            return Decision::Review {
                escalate: attempt.review_attempts > attempt.limits.max_review_attempts,
            };
        }

        if attempt.stall_count >= attempt.limits.stall_threshold {
            return Decision::Discard(Outcome::DiscardedStuck);
        }

        if observation.has(ControlKind::Advance) {
            return Decision::Advance;
        }

        Decision::Skip
    }
}
