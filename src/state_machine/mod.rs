mod attempt;
mod outcome;
mod state;

pub use attempt::{Attempt, FlowLimits};
pub use outcome::Outcome;
pub use state::{Decision, FlowState, StepMachine};
