use regex::RegexBuilder;

use polyroute_core::Result;

/// Parameters for `Registry::search` (spec §4.3): case-insensitive regex
/// match against a model's display name, optionally narrowed to a format.
pub struct SearchQuery {
    pub name_regex: String,
    pub format: Option<String>,
}

impl SearchQuery {
    pub fn compile(&self) -> Result<regex::Regex> {
        RegexBuilder::new(&self.name_regex)
            .case_insensitive(true)
            .build()
            .map_err(|e| polyroute_core::Error::Validation { reason: format!("invalid search pattern: {e}") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_case_insensitively() {
        let query = SearchQuery { name_regex: "^GPT".into(), format: None };
        let regex = query.compile().unwrap();
        assert!(regex.is_match("gpt-4"));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let query = SearchQuery { name_regex: "(".into(), format: None };
        assert!(query.compile().is_err());
    }
}
