use polyroute_core::{ExecutionEngine, Requirements};
use polyroute_model::ModelIdentity;

/// Input/output cost per 1M tokens, keyed by lowercased name substring.
const RATE_TABLE: &[(&str, f64, f64)] = &[
    ("gpt-4", 30.0, 60.0),
    ("gpt-3.5", 0.5, 1.5),
    ("claude-3-opus", 15.0, 75.0),
    ("claude-3", 3.0, 15.0),
    ("llama", 0.2, 0.2),
    ("mistral", 0.25, 0.25),
];

const DEFAULT_RATE: (f64, f64) = (1.0, 2.0);

/// Hourly compute rate per GB of model size, keyed by execution engine.
fn hourly_rate(engine: ExecutionEngine) -> f64 {
    match engine {
        ExecutionEngine::WebGpu => 0.0,
        ExecutionEngine::Wasm => 0.0,
        ExecutionEngine::Node => 0.02,
        ExecutionEngine::Edge => 0.05,
        ExecutionEngine::Cloud => 0.15,
    }
}

fn rates_for(identity: &ModelIdentity) -> (f64, f64) {
    let lower = identity.name.to_ascii_lowercase();
    for (substring, input_rate, output_rate) in RATE_TABLE {
        if lower.contains(substring) {
            return (*input_rate, *output_rate);
        }
    }
    DEFAULT_RATE
}

const DEFAULT_EXPECTED_TOKENS: f64 = 1_000.0;

/// Pure function of `(Model, requirements)` (spec §4.4 Cost scorer). Lower
/// is cheaper; callers invert or weight this against quality as needed.
pub fn score_cost(identity: &ModelIdentity, requirements: &Requirements) -> f64 {
    let (input_rate, output_rate) = rates_for(identity);
    let expected_tokens = requirements.max_tokens.map(|t| t as f64).unwrap_or(DEFAULT_EXPECTED_TOKENS);
    let token_cost = (input_rate * 0.3 + output_rate * 0.7) * (expected_tokens / 1_000_000.0);
    let compute_cost = hourly_rate(identity.engine) * identity.size_gb;
    token_cost + compute_cost
}
