//! Format-detection policy applied when a model spec omits an explicit
//! `format` field (spec §4.2).

const EXTENSION_TABLE: &[(&str, &str)] = &[
    (".gguf", "gguf"),
    (".ggml", "ggml"),
    (".onnx", "onnx"),
    (".safetensors", "safetensors"),
    (".pt", "pytorch"),
    (".pth", "pytorch"),
    (".bin", "binary"),
    (".pb", "tensorflow"),
    (".json", "tensorflowjs"),
];

const KNOWN_REGISTRY_HOSTS: &[&str] = &["huggingface.co", "hf.co"];

/// Detects a format tag from a source string, applying the five-step policy
/// in order. Returns `"unknown"` only when every step is exhausted.
pub fn detect_format(source: &str, explicit_format: Option<&str>) -> String {
    if let Some(format) = explicit_format {
        return format.to_string();
    }

    if let Some(idx) = source.find("://") {
        return source[..idx].to_string();
    }

    let lower = source.to_ascii_lowercase();
    for (ext, tag) in EXTENSION_TABLE {
        if lower.ends_with(ext) {
            return tag.to_string();
        }
    }

    if source.contains(':') || KNOWN_REGISTRY_HOSTS.iter().any(|host| lower.contains(host)) {
        return "huggingface".to_string();
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_format_wins_over_everything() {
        assert_eq!(detect_format("model.gguf", Some("custom")), "custom");
    }

    #[test]
    fn scheme_prefix_is_the_format_tag() {
        assert_eq!(detect_format("mock://echo-model", None), "mock");
    }

    #[test]
    fn extension_table_is_checked_case_insensitively() {
        assert_eq!(detect_format("/weights/model.GGUF", None), "gguf");
        assert_eq!(detect_format("model.safetensors", None), "safetensors");
        assert_eq!(detect_format("model.pt", None), "pytorch");
        assert_eq!(detect_format("model.pth", None), "pytorch");
        assert_eq!(detect_format("model.json", None), "tensorflowjs");
    }

    #[test]
    fn remote_pattern_falls_back_to_huggingface() {
        assert_eq!(detect_format("org/model-name", None), "huggingface");
        assert_eq!(detect_format("https://huggingface.co/org/model", None), "https");
    }

    #[test]
    fn unrecognized_source_is_unknown() {
        assert_eq!(detect_format("plainname", None), "unknown");
    }
}
