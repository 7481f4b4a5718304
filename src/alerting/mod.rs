//! Alert evaluation and the append-only alert log

pub mod evaluator;
pub mod log;

pub use evaluator::AlertEvaluator;
pub use log::{AlertLog, AlertLogSummary, JsonlAlertLog, MemoryAlertLog};
