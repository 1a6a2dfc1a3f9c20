use crate::error::AlertError;

pub const ALLOWED_METRICS: [&str; 3] = ["cpu_pct", "mem_used_pct", "disk_used_pct"];

pub fn validate_metric(metric: &str) -> Result<(), AlertError> {
    if ALLOWED_METRICS.contains(&metric) {
        Ok(())
    } else {
        Err(AlertError::InvalidMetric)
    }
}

pub fn validate_comparison(comparison: &str) -> Result<(), AlertError> {
    match comparison {
        "above" | "below" => Ok(()),
        _ => Err(AlertError::InvalidComparison),
    }
}

/// Validates the four CRUD invariants: non-empty name, allowed metric,
/// allowed comparison, threshold in range, `trigger_after >= 1`.
pub fn validate_rule_fields(
    name: &str,
    metric: &str,
    comparison: &str,
    threshold_pct: f64,
    trigger_after: u32,
) -> Result<(), AlertError> {
    if name.trim().is_empty() {
        return Err(AlertError::EmptyName);
    }
    validate_metric(metric)?;
    validate_comparison(comparison)?;
    if !(0.0..=100.0).contains(&threshold_pct) {
        return Err(AlertError::ThresholdOutOfRange);
    }
    if trigger_after < 1 {
        return Err(AlertError::InvalidTriggerAfter);
    }
    Ok(())
}
