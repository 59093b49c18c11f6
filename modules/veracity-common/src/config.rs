use std::env;

use crate::report::AnalysisMode;
use crate::VeracityError;

/// Service configuration. Loaded from environment variables in the
/// binaries; constructed directly in tests.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Active backend strategy.
    pub mode: AnalysisMode,

    // Provider credentials
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub firecrawl_api_key: String,
    pub jina_api_key: String,
    pub perplexity_api_key: String,
    pub perplexity_model: String,

    // Usage gating
    pub free_limit: u32,

    // Per-backend tunables
    pub max_claims: usize,
    pub searches_per_claim: usize,

    // Sent as attribution headers on OpenRouter requests
    pub site_name: String,
    pub site_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Settings {
    /// Load from environment. Credentials are optional here; the
    /// orchestrator rejects at task start when the active mode's key is
    /// missing, so a misconfigured server still boots and reports cleanly.
    pub fn from_env() -> Self {
        let mode = env::var("VERACITY_MODE")
            .ok()
            .and_then(|s| AnalysisMode::from_identifier(&s))
            .unwrap_or(AnalysisMode::QuickSearch);

        Self {
            mode,
            openrouter_api_key: env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            openrouter_model: env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| "openai/gpt-4o".to_string()),
            firecrawl_api_key: env::var("FIRECRAWL_API_KEY").unwrap_or_default(),
            jina_api_key: env::var("JINA_API_KEY").unwrap_or_default(),
            perplexity_api_key: env::var("PERPLEXITY_API_KEY").unwrap_or_default(),
            perplexity_model: env::var("PERPLEXITY_MODEL")
                .unwrap_or_else(|_| "sonar-pro".to_string()),
            free_limit: parse_env("VERACITY_FREE_LIMIT", 5),
            max_claims: parse_env("VERACITY_MAX_CLAIMS", 10),
            searches_per_claim: parse_env("VERACITY_SEARCHES_PER_CLAIM", 3),
            site_name: env::var("VERACITY_SITE_NAME").unwrap_or_else(|_| "Veracity".to_string()),
            site_url: env::var("VERACITY_SITE_URL").unwrap_or_default(),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: parse_env("WEB_PORT", 3000),
        }
    }

    /// Defaults suitable for tests: quick-search mode, dummy credentials.
    pub fn for_tests(mode: AnalysisMode) -> Self {
        Self {
            mode,
            openrouter_api_key: "test-key".to_string(),
            openrouter_model: "openai/gpt-4o".to_string(),
            firecrawl_api_key: "test-key".to_string(),
            jina_api_key: "test-key".to_string(),
            perplexity_api_key: "test-key".to_string(),
            perplexity_model: "sonar-pro".to_string(),
            free_limit: 5,
            max_claims: 10,
            searches_per_claim: 3,
            site_name: "Veracity".to_string(),
            site_url: String::new(),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
        }
    }

    /// Verify that the credentials the given mode needs are present.
    pub fn check_credentials(&self, mode: AnalysisMode) -> Result<(), VeracityError> {
        let missing = |name: &str| VeracityError::Config(format!("{name} not configured"));
        match mode {
            AnalysisMode::QuickSearch => {
                if self.openrouter_api_key.is_empty() {
                    return Err(missing("OpenRouter API key"));
                }
            }
            AnalysisMode::DeepResearch => {
                if self.openrouter_api_key.is_empty() {
                    return Err(missing("OpenRouter API key"));
                }
                if self.firecrawl_api_key.is_empty() {
                    return Err(missing("Firecrawl API key"));
                }
            }
            AnalysisMode::ClaimGrounding => {
                if self.jina_api_key.is_empty() {
                    return Err(missing("Jina API key"));
                }
            }
            AnalysisMode::Research => {
                if self.perplexity_api_key.is_empty() {
                    return Err(missing("Perplexity API key"));
                }
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_checked_per_mode() {
        let mut settings = Settings::for_tests(AnalysisMode::DeepResearch);
        assert!(settings.check_credentials(AnalysisMode::DeepResearch).is_ok());

        settings.firecrawl_api_key.clear();
        let err = settings.check_credentials(AnalysisMode::DeepResearch).unwrap_err();
        assert!(matches!(err, VeracityError::Config(_)));
        // Quick-search only needs the OpenRouter key
        assert!(settings.check_credentials(AnalysisMode::QuickSearch).is_ok());
    }
}
