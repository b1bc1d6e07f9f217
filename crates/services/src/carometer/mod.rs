//! Carômetro: per-student criterion assessment over a class roster.

mod progress;
mod session;
mod workflow;

pub use progress::CarometerProgress;
pub use session::{CarometerSession, FinalizeOutcome};
pub use workflow::CarometerWorkflow;
