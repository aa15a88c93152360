use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use polyroute_core::{ABTestConfig, Error, ExperimentId, RequestContext, Result, UserId};
use tokio::sync::RwLock;
use tracing::info;

use crate::assignment::{Assignment, EventRecord};
use crate::experiment::{Experiment, ExperimentStatus, SplittingAlgorithm};
use crate::split::{hash_fraction, is_admitted, pick_by_cumulative_walk, weighted_allocations};

/// Experiment lifecycle, deterministic assignment, and event tracking
/// (spec §4.8). Assignments are cached per `(experiment, user)` so repeated
/// calls are stable while the experiment stays `Running`, per the
/// determinism requirement.
pub struct ABTest {
    config: ABTestConfig,
    experiments: Arc<RwLock<HashMap<ExperimentId, Experiment>>>,
    assignments: Arc<RwLock<HashMap<(ExperimentId, UserId), Assignment>>>,
    user_index: Arc<RwLock<HashMap<UserId, HashSet<ExperimentId>>>>,
    events: Arc<RwLock<HashMap<(ExperimentId, String), Vec<EventRecord>>>>,
}

impl ABTest {
    pub fn new(config: ABTestConfig) -> Self {
        Self {
            config,
            experiments: Arc::new(RwLock::new(HashMap::new())),
            assignments: Arc::new(RwLock::new(HashMap::new())),
            user_index: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// `createExperiment` (spec §4.8).
    pub async fn create_experiment(&self, experiment: Experiment) -> Result<()> {
        experiment.validate()?;
        let mut experiments = self.experiments.write().await;
        if experiments.contains_key(&experiment.id) {
            return Err(Error::Validation { reason: format!("experiment `{}` already exists", experiment.id) });
        }
        let active_count = experiments.values().filter(|e| e.status == ExperimentStatus::Running).count();
        if active_count >= self.config.max_active_experiments
            && experiment.status == ExperimentStatus::Running
        {
            return Err(Error::Validation { reason: "max_active_experiments reached".into() });
        }
        info!(experiment_id = %experiment.id, "experiment-created");
        experiments.insert(experiment.id.clone(), experiment);
        Ok(())
    }

    async fn transition(
        &self,
        id: &ExperimentId,
        op: impl FnOnce(&mut Experiment) -> Result<()>,
    ) -> Result<()> {
        let mut experiments = self.experiments.write().await;
        let experiment = experiments
            .get_mut(id)
            .ok_or_else(|| Error::NotFound { what: format!("experiment `{id}`") })?;
        op(experiment)
    }

    pub async fn start(&self, id: &ExperimentId) -> Result<()> {
        self.transition(id, |e| e.start()).await
    }

    pub async fn pause(&self, id: &ExperimentId) -> Result<()> {
        self.transition(id, |e| e.pause()).await
    }

    /// `stop` (spec §4.8): transitions to Completed and logs final stats —
    /// per-variant event counts — the way the spec documents "emitting final
    /// stats" at the end of an experiment's lifecycle (spec §3 Lifecycles).
    pub async fn stop(&self, id: &ExperimentId) -> Result<()> {
        self.transition(id, |e| e.stop()).await?;
        let events = self.events.read().await;
        for ((experiment_id, variant), records) in events.iter() {
            if experiment_id == id {
                info!(experiment_id = %id, variant = %variant, event_count = records.len(), "experiment-final-stats");
            }
        }
        Ok(())
    }

    /// `assignUser` (spec §4.8). Returns `None` when the user is not
    /// admitted into the experiment (outside the traffic percentage or
    /// failing targeting).
    pub async fn assign_user(
        &self,
        experiment_id: &ExperimentId,
        user_id: &UserId,
        context: &RequestContext,
    ) -> Result<Option<Assignment>> {
        let key = (experiment_id.clone(), user_id.clone());
        if let Some(existing) = self.assignments.read().await.get(&key) {
            return Ok(Some(existing.clone()));
        }

        let experiments = self.experiments.read().await;
        let experiment = experiments
            .get(experiment_id)
            .ok_or_else(|| Error::NotFound { what: format!("experiment `{experiment_id}`") })?;
        if experiment.status != ExperimentStatus::Running {
            return Ok(None);
        }

        let targeting_passes = experiment.targeting_rules.iter().all(|r| r.matches(&context.attributes));
        let h = hash_fraction(user_id, experiment_id);
        if !is_admitted(h, experiment.traffic_percentage, targeting_passes) {
            return Ok(None);
        }

        let variant_name = match experiment.splitting {
            SplittingAlgorithm::RandomHash => {
                pick_by_cumulative_walk(h, &experiment.variants).map(|v| v.name.clone())
            }
            SplittingAlgorithm::Weighted => {
                let segment = context
                    .attributes
                    .get("userSegment")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let multipliers = segment_multipliers(&experiment.variants, segment);
                let adjusted = weighted_allocations(&experiment.variants, &multipliers);
                pick_by_cumulative_walk(h, &adjusted).map(|v| v.name.clone())
            }
            SplittingAlgorithm::Geographic | SplittingAlgorithm::Temporal => experiment
                .rule_table
                .iter()
                .find(|entry| entry.rule.matches(&context.attributes))
                .map(|entry| entry.variant.clone())
                .or_else(|| pick_by_cumulative_walk(h, &experiment.variants).map(|v| v.name.clone())),
        };

        let Some(variant_name) = variant_name else { return Ok(None) };
        drop(experiments);

        let assignment = Assignment {
            experiment_id: experiment_id.clone(),
            user_id: user_id.clone(),
            variant: variant_name,
            assigned_at: Utc::now(),
        };
        self.assignments.write().await.insert(key, assignment.clone());
        self.user_index.write().await.entry(user_id.clone()).or_default().insert(experiment_id.clone());
        info!(experiment_id = %experiment_id, user_id = %user_id, variant = %assignment.variant, "assignment-tracked");
        Ok(Some(assignment))
    }

    /// `trackEvent` (spec §4.8): for every live assignment the user holds,
    /// appends to that variant's event buffer iff `event_name` is the
    /// experiment's primary metric or among its secondary metrics.
    pub async fn track_event(&self, user_id: &UserId, event_name: &str, data: serde_json::Value) -> Result<()> {
        let experiment_ids: Vec<ExperimentId> =
            self.user_index.read().await.get(user_id).cloned().unwrap_or_default().into_iter().collect();

        let experiments = self.experiments.read().await;
        let assignments = self.assignments.read().await;
        let mut events = self.events.write().await;

        for experiment_id in experiment_ids {
            let Some(experiment) = experiments.get(&experiment_id) else { continue };
            if experiment.primary_metric != event_name && !experiment.secondary_metrics.contains(event_name) {
                continue;
            }
            let Some(assignment) = assignments.get(&(experiment_id.clone(), user_id.clone())) else {
                continue;
            };
            events.entry((experiment_id, assignment.variant.clone())).or_default().push(EventRecord {
                user_id: user_id.clone(),
                event_name: event_name.to_string(),
                data: data.clone(),
                at: Utc::now(),
            });
        }
        Ok(())
    }

    pub async fn get_experiment(&self, id: &ExperimentId) -> Result<Experiment> {
        self.experiments
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound { what: format!("experiment `{id}`") })
    }

    pub async fn event_count(&self, experiment_id: &ExperimentId, variant: &str) -> usize {
        self.events.read().await.get(&(experiment_id.clone(), variant.to_string())).map(Vec::len).unwrap_or(0)
    }
}

fn segment_multipliers(variants: &[crate::experiment::Variant], segment: &str) -> HashMap<String, f64> {
    // A variant's overrides may carry a `segment_multipliers` object keyed by
    // segment name; absent entries default to 1.0 (no adjustment).
    let mut out = HashMap::new();
    for v in variants {
        if let Some(table) = v.overrides.get("segment_multipliers").and_then(|val| val.as_object()) {
            if let Some(m) = table.get(segment).and_then(|val| val.as_f64()) {
                out.insert(v.name.clone(), m);
            }
        }
    }
    out
}
