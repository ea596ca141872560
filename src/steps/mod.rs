//! CI steps with switchable behaviour
//!
//! Each step resolves an [`crate::domain::ExecutionMode`] from the environment
//! so pipelines can be exercised end to end without running real work:
//! - execute: run the configured command, or print the stub banner
//! - dry-run / pass / fail / skip / timeout: simulate the outcome

pub mod executor;
pub mod lifecycle;

pub use executor::{StepExecutor, StepOutcome, StepStatus};
pub use lifecycle::StepContext;
