use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::state::FlowState;

/// Terminal result of one item, as written to the ledger's `Status` column.
///
/// The textual forms are the ledger vocabulary and must not change: earlier
/// runs' files are read back with [`Outcome::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    Applied,
    SkippedNoApplyButton,
    SkippedUnsupported,
    DiscardedStuckInReview,
    DiscardedStuck,
    ErrorDetailsPane,
    ErrorTimeout,
    Error(String),
}

impl Outcome {
    /// The flow state this outcome terminates in.
    pub fn state(&self) -> FlowState {
        match self {
            Outcome::Applied => FlowState::Submitted,
            Outcome::SkippedNoApplyButton | Outcome::SkippedUnsupported => FlowState::Skipped,
            Outcome::DiscardedStuckInReview | Outcome::DiscardedStuck => FlowState::Discarded,
            Outcome::ErrorDetailsPane | Outcome::ErrorTimeout | Outcome::Error(_) => {
                FlowState::Error
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => write!(f, "applied"),
            Outcome::SkippedNoApplyButton => write!(f, "skipped - no apply button"),
            Outcome::SkippedUnsupported => write!(f, "skipped - multi-step or unsupported"),
            Outcome::DiscardedStuckInReview => write!(f, "discarded - stuck in review"),
            Outcome::DiscardedStuck => write!(f, "discarded - stuck"),
            Outcome::ErrorDetailsPane => write!(f, "error - details pane not loaded"),
            Outcome::ErrorTimeout => write!(f, "error - timeout"),
            Outcome::Error(msg) => write!(f, "error - {msg}"),
        }
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let outcome = match s.trim() {
            "applied" => Outcome::Applied,
            "skipped - no apply button" => Outcome::SkippedNoApplyButton,
            "skipped - multi-step or unsupported" => Outcome::SkippedUnsupported,
            "discarded - stuck in review" => Outcome::DiscardedStuckInReview,
            "discarded - stuck" => Outcome::DiscardedStuck,
            "error - details pane not loaded" => Outcome::ErrorDetailsPane,
            "error - timeout" => Outcome::ErrorTimeout,
            other => match other.strip_prefix("error - ") {
                Some(msg) => Outcome::Error(msg.to_string()),
                None => return Err(format!("unknown outcome: {other}")),
            },
        };
        Ok(outcome)
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
