use std::collections::HashMap;
use std::sync::Arc;

use polyroute_abtest::ABTest;
use polyroute_core::{Error, InferenceResponse, QuotaKind, RequestContext, Requirements, Result, TenantId, UserId};
use polyroute_core::ExperimentId;
use polyroute_pipeline::Pipeline;
use polyroute_router::{Router, RouterStrategy};
use polyroute_tenancy::Tenancy;
use tracing::{info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::fallback::FallbackEntry;
use crate::overrides::apply_variant_overrides;

/// A single orchestrated inference request (spec §4.9).
#[derive(Debug, Clone)]
pub struct OrchestratorRequest {
    pub prompt: String,
    pub requirements: Requirements,
    pub context: RequestContext,
    pub strategy: RouterStrategy,
    pub use_cache: bool,
    /// Stands in for the external credential-validation hook (spec §4.9
    /// step 1): this orchestrator does not itself authenticate callers.
    pub authenticated: bool,
    pub experiment_id: Option<ExperimentId>,
    pub fallback_chain: Vec<FallbackEntry>,
}

impl OrchestratorRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            requirements: Requirements::default(),
            context: RequestContext::default(),
            strategy: RouterStrategy::default(),
            use_cache: true,
            authenticated: true,
            experiment_id: None,
            fallback_chain: Vec::new(),
        }
    }
}

/// Composes MultiTenancy, ABTesting, Router, and Pipeline into the
/// per-request flow described in spec §4.9, including the user-provided
/// fallback chain and per-`(tenant, error-class)` circuit breaking.
pub struct Orchestrator {
    router: Arc<Router>,
    pipeline: Arc<Pipeline>,
    tenancy: Arc<Tenancy>,
    abtest: Arc<ABTest>,
    circuit_breaker: CircuitBreaker,
}

impl Orchestrator {
    pub fn new(router: Arc<Router>, pipeline: Arc<Pipeline>, tenancy: Arc<Tenancy>, abtest: Arc<ABTest>) -> Self {
        Self { router, pipeline, tenancy, abtest, circuit_breaker: CircuitBreaker::new() }
    }

    pub async fn process(&self, request: OrchestratorRequest) -> Result<InferenceResponse> {
        if !request.authenticated {
            return Err(Error::Unauthorized);
        }

        let tenant_id = request.context.tenant_id.as_ref().map(|id| TenantId::new(id.clone()));
        let mut requirements = request.requirements.clone();

        if let Some(tenant_id) = &tenant_id {
            if let Some(model_id) = &requirements.preferred_model {
                self.tenancy.check_model_access(tenant_id, model_id).await?;
            }
            let mut deltas = HashMap::new();
            deltas.insert(QuotaKind::RequestsPerMinute, 1);
            self.tenancy.check_quota(tenant_id, &deltas).await?;
        }

        if let Some(experiment_id) = &request.experiment_id {
            if let Some(user_id) = &request.context.user_id {
                let user_id = UserId::new(user_id.clone());
                if let Some(assignment) =
                    self.abtest.assign_user(experiment_id, &user_id, &request.context).await?
                {
                    let experiment = self.abtest.get_experiment(experiment_id).await?;
                    if let Some(variant) = experiment.variants.iter().find(|v| v.name == assignment.variant) {
                        requirements = apply_variant_overrides(&requirements, &variant.overrides);
                    }
                }
            }
        }

        let mut candidates = vec![requirements.clone()];
        candidates.extend(request.fallback_chain.iter().map(|entry| entry.resolve(&requirements)));

        let mut last_err: Option<Error> = None;

        for (attempt, candidate_requirements) in candidates.iter().enumerate() {
            // The breaker is tracked per (tenant, error-class) (spec §7), and
            // which class a given attempt would fail with is not known in
            // advance, so the gate checks every class previously tripped for
            // this tenant rather than one hardcoded class.
            if let Some(tenant_id) = &tenant_id {
                if let Some(class) = self.circuit_breaker.is_open_for_tenant(tenant_id).await {
                    warn!(tenant_id = %tenant_id, error_class = class, "circuit breaker open, skipping attempt");
                    last_err = Some(Error::UpstreamError {
                        reason: format!("circuit breaker open for error class `{class}`"),
                    });
                    continue;
                }
            }

            let model = match self.router.select(&request.prompt, candidate_requirements, request.strategy).await {
                Ok(model) => model,
                Err(err) => {
                    last_err = Some(err);
                    continue;
                }
            };

            if let Some(tenant_id) = &tenant_id {
                self.tenancy.begin_concurrent_request(tenant_id).await?;
            }

            let outcome =
                self.pipeline.process(model, &request.prompt, candidate_requirements, request.use_cache).await;

            // ConcurrentRequests must be decremented on every terminal path
            // of this attempt, success or failure, or the gauge leaks.
            if let Some(tenant_id) = &tenant_id {
                self.tenancy.end_concurrent_request(tenant_id).await;
            }

            match outcome {
                Ok(mut response) => {
                    response.fallbacks_used = attempt as u32;
                    if let Some(tenant_id) = &tenant_id {
                        self.tenancy
                            .record_usage(tenant_id, 1, response.tokens as i64, 0, Some(response.model_id.clone()))
                            .await?;
                        self.circuit_breaker.reset_tenant(tenant_id).await;
                    }
                    info!(model_id = %response.model_id, attempt, "orchestrator-request-succeeded");
                    return Ok(response);
                }
                Err(err) => {
                    if err.is_policy_error() {
                        return Err(err);
                    }
                    if let Some(tenant_id) = &tenant_id {
                        self.circuit_breaker.record_failure(tenant_id, err.kind()).await;
                    }
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or(Error::NoCandidate))
    }
}
