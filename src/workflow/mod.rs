pub mod application_flow;
pub mod attempt;

pub use application_flow::ApplicationFlow;
pub use attempt::{ApplicationAttempt, ApplicationState, FailureReason, Outcome};
