//! Agent configuration
//!
//! Tunables for the recommendation dialogue, with env-var overrides following the
//! `WATCHGRAPH_` prefix convention. Invalid override values fall back to the
//! default rather than failing startup.

use tracing::warn;

/// Configuration for the recommendation dialogue.
#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    /// How many watch-history matches to request per search.
    pub search_limit: usize,
    /// Minimum matches considered enough signal to recommend.
    pub min_matches: usize,
    /// Hard cap on availability tool invocations per conversation.
    pub max_availability_checks: usize,
    /// ISO region code used for availability lookups.
    pub region_code: String,
    /// Region display name used in prompts and tool results.
    pub region_name: String,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            search_limit: 5,
            min_matches: 2,
            max_availability_checks: 4,
            region_code: "RO".to_string(),
            region_name: "Romania".to_string(),
        }
    }
}

impl RecommenderConfig {
    /// Build from defaults with environment overrides applied.
    ///
    /// Recognized variables: `WATCHGRAPH_SEARCH_LIMIT`, `WATCHGRAPH_MIN_MATCHES`,
    /// `WATCHGRAPH_MAX_AVAILABILITY_CHECKS`, `WATCHGRAPH_REGION_CODE`,
    /// `WATCHGRAPH_REGION_NAME`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = parse_env("WATCHGRAPH_SEARCH_LIMIT") {
            config.search_limit = v;
        }
        if let Some(v) = parse_env("WATCHGRAPH_MIN_MATCHES") {
            config.min_matches = v;
        }
        if let Some(v) = parse_env("WATCHGRAPH_MAX_AVAILABILITY_CHECKS") {
            config.max_availability_checks = v;
        }
        if let Ok(v) = std::env::var("WATCHGRAPH_REGION_CODE") {
            config.region_code = v;
        }
        if let Ok(v) = std::env::var("WATCHGRAPH_REGION_NAME") {
            config.region_name = v;
        }

        config
    }
}

fn parse_env(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparseable override");
            None
        }
    }
}
