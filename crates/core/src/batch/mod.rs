//! Batch conversion: many inputs, one output container, strictly in order.

mod runner;

pub use runner::{BatchFailure, BatchOutcome, BatchRunner, BatchStage, CANCELLED_REASON};
