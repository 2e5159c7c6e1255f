use indexmap::{IndexMap, IndexSet};

use crate::TrialOutcome;

/// Name of the wall clock pseudo metric
pub const TIME: &str = "time";
/// Name of the peak memory pseudo metric
pub const MEMORY: &str = "memory";
/// Time and memory recorded for a failed trial
pub const SENTINEL: f64 = -1.0;

/// Lookup key of a single result
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultKey {
    /// Metric name, or one of the pseudo metrics `time` and `memory`
    pub metric: String,
    /// Problem id
    pub problem: String,
    /// Model key
    pub model: String,
}

impl ResultKey {
    /// Create a new key
    pub fn new(metric: &str, problem: &str, model: &str) -> Self {
        Self {
            metric: metric.to_string(),
            problem: problem.to_string(),
            model: model.to_string(),
        }
    }
}

/// A stored result: the loss series of a trial or a scalar for `time`/`memory`
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    /// Per timestep loss
    Series(Vec<f64>),
    /// Single value
    Scalar(f64),
}

impl ResultValue {
    /// Mean of a series, the value itself for a scalar
    pub fn mean(&self) -> f64 {
        match self {
            ResultValue::Series(s) if s.is_empty() => 0.0,
            ResultValue::Series(s) => s.iter().sum::<f64>() / s.len() as f64,
            ResultValue::Scalar(v) => *v,
        }
    }

    /// The series, if this is one
    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            ResultValue::Series(s) => Some(s),
            ResultValue::Scalar(_) => None,
        }
    }

    /// The scalar, if this is one
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ResultValue::Series(_) => None,
            ResultValue::Scalar(v) => Some(*v),
        }
    }
}

/// Aggregated results keyed by (metric, problem, model), in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    entries: IndexMap<ResultKey, ResultValue>,
}

impl ResultsTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a single value
    pub fn insert(&mut self, key: ResultKey, value: ResultValue) {
        self.entries.insert(key, value);
    }

    /// Store a trial outcome as its metric entry plus the `time` and `memory` entries.
    /// A failed trial stores the sentinel.
    pub fn insert_outcome(&mut self, metric: &str, problem: &str, model: &str, outcome: &TrialOutcome) {
        let (loss, time, memory) = match outcome {
            TrialOutcome::Completed(r) => {
                (ResultValue::Series(r.loss.clone()), r.time, r.memory as f64)
            }
            TrialOutcome::Failed(_) => (ResultValue::Scalar(0.0), SENTINEL, SENTINEL),
        };
        self.insert(ResultKey::new(metric, problem, model), loss);
        self.insert(ResultKey::new(TIME, problem, model), ResultValue::Scalar(time));
        self.insert(ResultKey::new(MEMORY, problem, model), ResultValue::Scalar(memory));
    }

    /// Look up a single value
    #[inline(always)]
    pub fn get(&self, metric: &str, problem: &str, model: &str) -> Option<&ResultValue> {
        self.entries.get(&ResultKey::new(metric, problem, model))
    }

    /// Whether the trial of a pair failed, i.e. recorded `time == -1`
    pub fn failed(&self, problem: &str, model: &str) -> bool {
        self.get(TIME, problem, model).and_then(|v| v.as_scalar()) == Some(SENTINEL)
    }

    /// Distinct problem ids in order of first appearance
    pub fn problem_ids(&self) -> Vec<String> {
        let ids: IndexSet<&String> = self.entries.keys().map(|k| &k.problem).collect();
        ids.into_iter().cloned().collect()
    }

    /// Distinct model keys in order of first appearance
    pub fn model_ids(&self) -> Vec<String> {
        let ids: IndexSet<&String> = self.entries.keys().map(|k| &k.model).collect();
        ids.into_iter().cloned().collect()
    }

    /// Copy every entry of `other` into `self`, replacing existing keys
    pub fn merge(&mut self, other: ResultsTable) {
        self.entries.extend(other.entries);
    }

    /// Number of stored values
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was stored
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&ResultKey, &ResultValue)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TrialFailure, TrialResult};

    #[test]
    fn outcomes_and_lookups() {
        let mut table = ResultsTable::new();
        let ok = TrialOutcome::Completed(TrialResult {
            loss: vec![1.0, 2.0, 3.0],
            time: 0.5,
            memory: 1024,
        });
        table.insert_outcome("mse", "ARMA-v0", "RNN", &ok);
        table.insert_outcome("mse", "Pendulum-v0", "RNN", &TrialOutcome::Failed(TrialFailure::Incompatible));

        assert_eq!(table.len(), 6);
        assert_eq!(table.get("mse", "ARMA-v0", "RNN").unwrap().mean(), 2.0);
        assert_eq!(table.get("memory", "ARMA-v0", "RNN"), Some(&ResultValue::Scalar(1024.0)));
        assert!(!table.failed("ARMA-v0", "RNN"));

        assert!(table.failed("Pendulum-v0", "RNN"));
        assert_eq!(table.get("mse", "Pendulum-v0", "RNN"), Some(&ResultValue::Scalar(0.0)));
        assert_eq!(table.get("memory", "Pendulum-v0", "RNN").unwrap().as_scalar(), Some(-1.0));

        assert_eq!(table.problem_ids(), vec!["ARMA-v0", "Pendulum-v0"]);
        assert_eq!(table.model_ids(), vec!["RNN"]);
    }

    #[test]
    fn merge_replaces() {
        let mut a = ResultsTable::new();
        a.insert(ResultKey::new("mse", "ARMA-v0", "RNN"), ResultValue::Scalar(1.0));
        let mut b = ResultsTable::new();
        b.insert(ResultKey::new("mse", "ARMA-v0", "RNN"), ResultValue::Scalar(2.0));
        b.insert(ResultKey::new("mse", "ARMA-v0", "RNN-1"), ResultValue::Scalar(3.0));
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("mse", "ARMA-v0", "RNN").unwrap().mean(), 2.0);
        assert_eq!(a.model_ids(), vec!["RNN", "RNN-1"]);
    }
}
