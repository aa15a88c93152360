use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use polyroute_core::{Error, ExperimentId, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum total allocation tolerance (spec §3 Experiment invariants).
pub const ALLOCATION_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentStatus {
    Draft,
    Running,
    Paused,
    Completed,
    Archived,
}

impl ExperimentStatus {
    /// Completed and Archived never transition further (spec §3).
    pub fn is_terminal(self) -> bool {
        matches!(self, ExperimentStatus::Completed | ExperimentStatus::Archived)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplittingAlgorithm {
    RandomHash,
    Weighted,
    Geographic,
    Temporal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub allocation: f64,
    /// Parameter overrides merged into the request once this variant is
    /// assigned (spec §4.8 "Effect on routing") — e.g. a routing strategy
    /// override or generation parameters.
    pub overrides: HashMap<String, Value>,
}

impl Variant {
    pub fn new(name: impl Into<String>, allocation: f64) -> Self {
        Self { name: name.into(), allocation, overrides: HashMap::new() }
    }
}

/// A boolean predicate over a request context's attribute bag, used both
/// for targeting rules and for the geographic/temporal rule table (spec
/// §4.8 step 2 "consult the rule table first").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingRule {
    pub attribute: String,
    pub equals: Value,
}

impl TargetingRule {
    pub fn matches(&self, attributes: &HashMap<String, Value>) -> bool {
        attributes.get(&self.attribute).map(|v| v == &self.equals).unwrap_or(false)
    }
}

/// A geographic/temporal rule-table entry: when its predicate matches, the
/// named variant is assigned directly, bypassing the hash-based walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTableEntry {
    pub rule: TargetingRule,
    pub variant: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: ExperimentId,
    pub name: String,
    pub status: ExperimentStatus,
    /// Percentage (0-100) of admitted traffic.
    pub traffic_percentage: f64,
    pub splitting: SplittingAlgorithm,
    pub variants: Vec<Variant>,
    pub primary_metric: String,
    pub secondary_metrics: HashSet<String>,
    pub targeting_rules: Vec<TargetingRule>,
    pub rule_table: Vec<RuleTableEntry>,
    pub created_at: DateTime<Utc>,
}

impl Experiment {
    pub fn new(
        id: ExperimentId,
        name: impl Into<String>,
        traffic_percentage: f64,
        splitting: SplittingAlgorithm,
        variants: Vec<Variant>,
        primary_metric: impl Into<String>,
    ) -> Result<Self> {
        let exp = Self {
            id,
            name: name.into(),
            status: ExperimentStatus::Draft,
            traffic_percentage,
            splitting,
            variants,
            primary_metric: primary_metric.into(),
            secondary_metrics: HashSet::new(),
            targeting_rules: Vec::new(),
            rule_table: Vec::new(),
            created_at: Utc::now(),
        };
        exp.validate()?;
        Ok(exp)
    }

    /// `createExperiment` validation (spec §4.8/§3): at least two variants,
    /// allocations summing to 1 within tolerance, a sane traffic percentage.
    pub fn validate(&self) -> Result<()> {
        if self.variants.len() < 2 {
            return Err(Error::Validation { reason: "experiment needs at least 2 variants".into() });
        }
        let total: f64 = self.variants.iter().map(|v| v.allocation).sum();
        if (total - 1.0).abs() > ALLOCATION_TOLERANCE {
            return Err(Error::Validation {
                reason: format!("variant allocations sum to {total}, expected ~1.0"),
            });
        }
        if !(0.0..=100.0).contains(&self.traffic_percentage) {
            return Err(Error::Validation { reason: "traffic_percentage must be within 0..=100".into() });
        }
        Ok(())
    }

    fn transition(&mut self, to: ExperimentStatus, allowed_from: &[ExperimentStatus]) -> Result<()> {
        if self.status.is_terminal() || !allowed_from.contains(&self.status) {
            return Err(Error::Validation {
                reason: format!("cannot transition experiment from {:?} to {:?}", self.status, to),
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(ExperimentStatus::Running, &[ExperimentStatus::Draft, ExperimentStatus::Paused])
    }

    pub fn pause(&mut self) -> Result<()> {
        self.transition(ExperimentStatus::Paused, &[ExperimentStatus::Running])
    }

    pub fn stop(&mut self) -> Result<()> {
        self.transition(ExperimentStatus::Completed, &[ExperimentStatus::Running, ExperimentStatus::Paused])
    }

    pub fn archive(&mut self) -> Result<()> {
        self.transition(
            ExperimentStatus::Archived,
            &[ExperimentStatus::Draft, ExperimentStatus::Completed],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants() -> Vec<Variant> {
        vec![Variant::new("control", 0.5), Variant::new("treatment", 0.5)]
    }

    #[test]
    fn rejects_fewer_than_two_variants() {
        let err = Experiment::new(
            ExperimentId::new("e1"),
            "n",
            50.0,
            SplittingAlgorithm::RandomHash,
            vec![Variant::new("solo", 1.0)],
            "conversion",
        )
        .unwrap_err();
        assert_eq!(err.kind(), "Validation");
    }

    #[test]
    fn rejects_allocations_not_summing_to_one() {
        let err = Experiment::new(
            ExperimentId::new("e1"),
            "n",
            50.0,
            SplittingAlgorithm::RandomHash,
            vec![Variant::new("a", 0.5), Variant::new("b", 0.2)],
            "conversion",
        )
        .unwrap_err();
        assert_eq!(err.kind(), "Validation");
    }

    #[test]
    fn accepts_allocations_within_tolerance() {
        let exp = Experiment::new(
            ExperimentId::new("e1"),
            "n",
            100.0,
            SplittingAlgorithm::RandomHash,
            vec![Variant::new("a", 0.3334), Variant::new("b", 0.6665)],
            "conversion",
        );
        assert!(exp.is_ok());
    }

    #[test]
    fn state_machine_forbids_skipping_running() {
        let mut exp = Experiment::new(
            ExperimentId::new("e1"),
            "n",
            100.0,
            SplittingAlgorithm::RandomHash,
            variants(),
            "conversion",
        )
        .unwrap();
        assert!(exp.stop().is_err());
        exp.start().unwrap();
        exp.pause().unwrap();
        exp.start().unwrap();
        exp.stop().unwrap();
        assert!(exp.start().is_err());
    }
}
