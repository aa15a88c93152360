use polyroute_core::Requirements;

/// Injects `requirements.template` (replacing the literal `{prompt}`
/// placeholder), then prepends `requirements.system_prompt` separated by two
/// newlines if present (spec §4.6 step 3).
pub fn preprocess_prompt(prompt: &str, requirements: &Requirements) -> String {
    let templated = match &requirements.template {
        Some(template) => template.replace("{prompt}", prompt),
        None => prompt.to_string(),
    };
    match &requirements.system_prompt {
        Some(system_prompt) => format!("{system_prompt}\n\n{templated}"),
        None => templated,
    }
}
