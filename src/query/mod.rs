//! Input resolution and question execution.
//!
//! The resolver turns a question template into a bound query; the runner
//! executes resolved questions and collects their results.

pub mod resolver;
pub mod runner;

pub use resolver::{
    InputPrompt, InputRequest, InputResolver, PresetInputs, Resolution, ResolvedQuery,
};
pub use runner::{Cancellation, QueryRunner, QuestionResult, RunOutcome, RunReport};
