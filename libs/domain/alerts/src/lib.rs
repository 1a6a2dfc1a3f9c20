//! Pure, IO-free alert evaluation. Counter state lives in memory only —
//! a process restart re-arms every rule. This crate has no dependency on
//! the store or the notifier; it is invoked by the ingestion handler and
//! returns events for the caller to persist and fan out.

mod engine;
mod error;
mod validation;

pub use engine::{AlertEngine, RaisedEvent};
pub use error::AlertError;
pub use validation::{validate_comparison, validate_metric, validate_rule_fields};
