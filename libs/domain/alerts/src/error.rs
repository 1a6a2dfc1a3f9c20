use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("rule name must not be empty")]
    EmptyName,
    #[error("metric must be one of cpu_pct, mem_used_pct, disk_used_pct")]
    InvalidMetric,
    #[error("comparison must be 'above' or 'below'")]
    InvalidComparison,
    #[error("threshold_pct must be in [0, 100]")]
    ThresholdOutOfRange,
    #[error("trigger_after must be >= 1")]
    InvalidTriggerAfter,
}
