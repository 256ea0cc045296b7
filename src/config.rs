use std::env;

use crate::error::ChatError;

/// Default completion endpoint when none is configured.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for a conversation, collected once at construction time.
///
/// Nothing here lives at module scope; every conversation and transport
/// receives its own copy.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key for the completion endpoint
    pub api_key: String,
    /// Normalized completion endpoint URL
    pub api_url: String,
    /// Model identifier sent with each request
    pub model: String,
    /// Sampling temperature; None leaves the endpoint default
    pub temperature: Option<f32>,
    /// Completion token limit; None leaves the endpoint default
    pub max_tokens: Option<u32>,
    /// SearxNG-compatible JSON search endpoint, required for browsing
    pub search_api_url: Option<String>,
    /// Verbose request/response logging to the console
    pub verbose: bool,
}

impl ClientConfig {
    /// Build a config from environment variables.
    ///
    /// `TOOLCHAT_API_KEY` (or `OPENAI_API_KEY`) is required. Optional:
    /// `TOOLCHAT_API_URL`, `TOOLCHAT_MODEL`, `TOOLCHAT_SEARCH_URL`.
    pub fn from_env() -> Result<Self, ChatError> {
        let api_key = env::var("TOOLCHAT_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                ChatError::Configuration(
                    "missing API key: set TOOLCHAT_API_KEY or OPENAI_API_KEY".to_string(),
                )
            })?;

        let api_url = env::var("TOOLCHAT_API_URL")
            .map(|url| normalize_api_url(&url))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = env::var("TOOLCHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            api_url,
            model,
            temperature: None,
            max_tokens: None,
            search_api_url: env::var("TOOLCHAT_SEARCH_URL").ok(),
            verbose: false,
        })
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            search_api_url: None,
            verbose: false,
        }
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = normalize_api_url(url);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_search_api_url(mut self, url: impl Into<String>) -> Self {
        self.search_api_url = Some(url.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Browsing requires a configured search endpoint.
    pub fn require_search_url(&self) -> Result<&str, ChatError> {
        self.search_api_url.as_deref().ok_or_else(|| {
            ChatError::Configuration(
                "browsing enabled but no search endpoint configured (TOOLCHAT_SEARCH_URL)"
                    .to_string(),
            )
        })
    }
}

/// Normalize API URL by ensuring it has the correct path for OpenAI-compatible endpoints
pub fn normalize_api_url(url: &str) -> String {
    // If URL already contains a path with "completions", use it as-is
    if url.contains("/completions") || url.contains("/chat") {
        return url.to_string();
    }

    if url.ends_with('/') {
        format!("{}v1/chat/completions", url)
    } else {
        format!("{}/v1/chat/completions", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_appends_standard_path() {
        assert_eq!(
            normalize_api_url("http://localhost:8080"),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            normalize_api_url("http://localhost:8080/"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn normalize_keeps_explicit_path() {
        assert_eq!(
            normalize_api_url("https://api.groq.com/openai/v1/chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn browsing_requires_search_endpoint() {
        let config = ClientConfig::new("test-key");
        assert!(matches!(
            config.require_search_url(),
            Err(ChatError::Configuration(_))
        ));

        let config = config.with_search_api_url("http://localhost:8888/search");
        assert!(config.require_search_url().is_ok());
    }
}
