use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use lunasentri_domain_models::{AlertRule, Comparator, MetricSample};

/// A rule firing that has not yet been persisted. The caller assigns an id
/// once the event row is written and hands the result to the notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct RaisedEvent {
    pub rule_id: i64,
    pub triggered_at: DateTime<Utc>,
    pub value: f64,
}

/// Per-rule consecutive-breach counters, guarded by a single mutex.
///
/// State is deliberately ephemeral: a process restart re-arms every rule.
/// `evaluate` takes the lock once per rule so that increment, compare, and
/// reset happen atomically relative to concurrent callers.
pub struct AlertEngine {
    counters: Mutex<HashMap<i64, u32>>,
}

impl AlertEngine {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluates every rule against one sample, returning zero or more
    /// raised events. Rules whose metric is absent from the sample are
    /// skipped without touching their counter.
    pub fn evaluate(&self, sample: &MetricSample, rules: &[AlertRule]) -> Vec<RaisedEvent> {
        let now = Utc::now();
        let mut raised = Vec::new();
        let mut counters = self.counters.lock().expect("alert counter lock poisoned");

        for rule in rules {
            let Some(value) = sample.value_for(&rule.metric) else {
                continue;
            };

            let breached = match rule.comparison {
                Comparator::Above => value > rule.threshold_pct,
                Comparator::Below => value < rule.threshold_pct,
            };

            let entry = counters.entry(rule.id).or_insert(0);
            if breached {
                *entry += 1;
                if *entry == rule.trigger_after {
                    raised.push(RaisedEvent {
                        rule_id: rule.id,
                        triggered_at: now,
                        value,
                    });
                    *entry = 0;
                }
            } else {
                *entry = 0;
            }
        }

        raised
    }

    /// Clears a rule's counter. Called whenever a rule is updated or
    /// deleted, per the mutation semantics of the engine.
    pub fn clear_counter(&self, rule_id: i64) {
        self.counters
            .lock()
            .expect("alert counter lock poisoned")
            .remove(&rule_id);
    }

    #[cfg(test)]
    fn counter_value(&self, rule_id: i64) -> u32 {
        *self
            .counters
            .lock()
            .expect("alert counter lock poisoned")
            .get(&rule_id)
            .unwrap_or(&0)
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rule(id: i64, metric: &str, comparison: Comparator, threshold: f64, trigger_after: u32) -> AlertRule {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        AlertRule {
            id,
            name: format!("rule-{id}"),
            metric: metric.to_string(),
            comparison,
            threshold_pct: threshold,
            trigger_after,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample(cpu_pct: f64) -> MetricSample {
        MetricSample {
            machine_id: 1,
            recorded_at: Utc::now(),
            cpu_pct,
            mem_used_pct: 0.0,
            disk_used_pct: 0.0,
            net_rx_bytes: None,
            net_tx_bytes: None,
            uptime_seconds: None,
        }
    }

    /// S1 — consecutive breach then recovery.
    #[test]
    fn consecutive_breach_then_recovery_fires_once() {
        let engine = AlertEngine::new();
        let r = rule(1, "cpu_pct", Comparator::Above, 80.0, 3);

        let mut fired = Vec::new();
        for cpu in [70.0, 85.0, 90.0, 95.0, 50.0] {
            fired.extend(engine.evaluate(&sample(cpu), &[r.clone()]));
        }

        assert_eq!(fired.len(), 1);
        assert!((fired[0].value - 95.0).abs() < f64::EPSILON);
        assert_eq!(engine.counter_value(1), 0);
    }

    /// S2 — repeat firing.
    #[test]
    fn repeated_breaches_fire_every_trigger_after_samples() {
        let engine = AlertEngine::new();
        let r = rule(1, "cpu_pct", Comparator::Above, 80.0, 3);

        let mut fired = Vec::new();
        for _ in 0..6 {
            fired.extend(engine.evaluate(&sample(85.0), &[r.clone()]));
        }

        assert_eq!(fired.len(), 2);
    }

    #[test]
    fn equality_is_not_a_breach() {
        let engine = AlertEngine::new();
        let r = rule(1, "cpu_pct", Comparator::Above, 80.0, 1);
        let fired = engine.evaluate(&sample(80.0), &[r]);
        assert!(fired.is_empty());
    }

    #[test]
    fn trigger_after_one_fires_immediately() {
        let engine = AlertEngine::new();
        let r = rule(1, "cpu_pct", Comparator::Above, 80.0, 1);
        let fired = engine.evaluate(&sample(80.0000001), &[r]);
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn absent_metric_does_not_touch_counter() {
        let engine = AlertEngine::new();
        let r = rule(1, "mem_used_pct", Comparator::Above, 10.0, 1);
        // sample only carries cpu_pct meaningfully but mem_used_pct/disk_used_pct
        // are always present as f64 fields on MetricSample, so exercise the
        // "no matching metric key" branch via an unknown metric name instead.
        let mut bogus = r.clone();
        bogus.metric = "unknown_metric".to_string();
        let fired = engine.evaluate(&sample(0.0), &[bogus]);
        assert!(fired.is_empty());
        assert_eq!(engine.counter_value(1), 0);
    }

    #[test]
    fn clearing_counter_resets_arming_progress() {
        let engine = AlertEngine::new();
        let r = rule(1, "cpu_pct", Comparator::Above, 80.0, 3);
        engine.evaluate(&sample(85.0), &[r.clone()]);
        engine.evaluate(&sample(85.0), &[r.clone()]);
        assert_eq!(engine.counter_value(1), 2);

        engine.clear_counter(1);
        assert_eq!(engine.counter_value(1), 0);
    }
}
