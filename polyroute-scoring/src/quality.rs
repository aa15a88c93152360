use polyroute_model::ModelIdentity;

/// Lowercased name substrings mapped to a base quality score, checked in
/// order; first match wins (spec §4.4 Quality scorer).
const NAME_TABLE: &[(&str, f64)] = &[
    ("gpt-4", 0.95),
    ("gpt-3.5", 0.8),
    ("claude-3-opus", 0.97),
    ("claude-3", 0.9),
    ("claude", 0.88),
    ("llama-3", 0.85),
    ("llama", 0.75),
    ("mistral", 0.78),
    ("mixtral", 0.82),
    ("phi", 0.7),
];

const DEFAULT_BASE: f64 = 0.6;

/// Keyword → task class, checked in order; first match wins. Unmatched
/// prompts fall into `general`.
const TASK_KEYWORDS: &[(&str, &str)] = &[
    ("fn ", "code"),
    ("function", "code"),
    ("code", "code"),
    ("debug", "code"),
    ("story", "creative"),
    ("poem", "creative"),
    ("write a", "creative"),
    ("analyze", "analysis"),
    ("compare", "analysis"),
    ("evaluate", "analysis"),
    ("translate", "translation"),
    ("summarize", "summary"),
    ("summary", "summary"),
];

/// Task-class → multiplier applied to the base score; unlisted classes
/// (including `general`) default to `1.0`.
fn task_modifier(task: &str) -> f64 {
    match task {
        "code" => 1.1,
        "creative" => 0.95,
        "analysis" => 1.05,
        "translation" => 0.9,
        "summary" => 1.0,
        _ => 1.0,
    }
}

fn detect_task_class(prompt: &str) -> &'static str {
    let lower = prompt.to_ascii_lowercase();
    for (keyword, class) in TASK_KEYWORDS {
        if lower.contains(keyword) {
            return class;
        }
    }
    "general"
}

fn base_score(identity: &ModelIdentity) -> f64 {
    let lower = identity.name.to_ascii_lowercase();
    for (substring, score) in NAME_TABLE {
        if lower.contains(substring) {
            return *score;
        }
    }
    let bonus = (identity.parameter_count as f64 / 1e6).log10() / 10.0;
    (DEFAULT_BASE + bonus).min(1.0)
}

fn context_utilization_score(prompt_len: usize, context_window: u32) -> f64 {
    if context_window == 0 {
        return 1.0;
    }
    let utilization = prompt_len as f64 / context_window as f64;
    if utilization < 0.2 {
        0.9
    } else if utilization > 0.8 {
        0.7
    } else if utilization > 0.6 {
        0.85
    } else {
        1.0
    }
}

/// Pure function of `(Model, prompt)` (spec §4.4 Quality scorer).
pub fn score_quality(identity: &ModelIdentity, prompt: &str) -> f64 {
    let base = base_score(identity);
    let task = base * task_modifier(detect_task_class(prompt));
    let context = context_utilization_score(prompt.len(), identity.context_window);
    (0.5 * base + 0.3 * task + 0.2 * context).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyroute_core::{Capability, ExecutionEngine, ModelId};
    use std::collections::HashSet;

    fn identity(name: &str, parameter_count: u64, context_window: u32) -> ModelIdentity {
        ModelIdentity {
            id: ModelId::new(name),
            name: name.to_string(),
            version: "1.0".into(),
            format: "mock".into(),
            architecture: "mock".into(),
            parameter_count,
            context_window,
            quantization: None,
            capabilities: HashSet::from([Capability::Completion]),
            engine: ExecutionEngine::Cloud,
            size_gb: 1.0,
        }
    }

    #[test]
    fn known_name_uses_table_score() {
        let gpt4 = identity("gpt-4-turbo", 1_000_000_000, 8192);
        assert!(score_quality(&gpt4, "hello") > 0.0);
    }

    #[test]
    fn unknown_name_gets_size_bonus_capped_at_one() {
        let huge = identity("some-custom-model", 1_000_000_000_000, 8192);
        let score = score_quality(&huge, "hello");
        assert!(score <= 1.0);
    }

    #[test]
    fn code_prompts_favor_code_modifier() {
        let model = identity("custom-model", 7_000_000_000, 8192);
        let code_score = score_quality(&model, "write a function to sort a list");
        let plain_score = score_quality(&model, "hello there");
        assert!(code_score >= plain_score);
    }

    #[test]
    fn context_utilization_bands_match_spec() {
        assert_eq!(context_utilization_score(10, 1000), 0.9);
        assert_eq!(context_utilization_score(900, 1000), 0.7);
        assert_eq!(context_utilization_score(700, 1000), 0.85);
        assert_eq!(context_utilization_score(400, 1000), 1.0);
    }
}
