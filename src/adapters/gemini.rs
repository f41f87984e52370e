use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::domain::config::TranslationConfig;
use crate::domain::DomainError;
use crate::ports::{HttpClient, HttpResponse, TextGenerator};

/// Quota/rate-limit marker in Google API error bodies.
const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

/// Text generator backed by the Gemini `generateContent` REST API.
pub struct GeminiGenerator {
    config: TranslationConfig,
    http: Arc<dyn HttpClient>,
    api_key: Option<Zeroizing<String>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiGenerator {
    /// Create a generator; the API key is read from `config.api_key_env` per request.
    pub fn new(config: TranslationConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http,
            api_key: None,
        }
    }

    /// Create a generator with an explicit API key.
    pub fn with_api_key(config: TranslationConfig, http: Arc<dyn HttpClient>, api_key: String) -> Self {
        Self {
            config,
            http,
            api_key: Some(Zeroizing::new(api_key)),
        }
    }

    fn generate_url(&self) -> String {
        let base = self.config.endpoint.trim_end_matches('/');
        format!("{base}/models/{}:generateContent", self.config.model)
    }

    /// Resolve the API key: explicit key > environment variable.
    fn resolve_api_key(&self) -> Result<Zeroizing<String>, DomainError> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        std::env::var(&self.config.api_key_env)
            .map(Zeroizing::new)
            .map_err(|_| {
                DomainError::TranslationService(format!(
                    "API key not configured: set {} env var",
                    self.config.api_key_env
                ))
            })
    }

    /// Map a non-success response onto the translation error taxonomy.
    fn classify_failure(response: &HttpResponse) -> DomainError {
        if response.status == 429 || response.body.contains(RESOURCE_EXHAUSTED) {
            warn!(status = response.status, "Translation quota exhausted");
            return DomainError::QuotaExceeded(format!("HTTP {}", response.status));
        }
        DomainError::TranslationService(format!("HTTP {}: {}", response.status, response.body.trim()))
    }

    fn extract_text(body: &str) -> Result<String, DomainError> {
        let parsed: GenerateResponse = serde_json::from_str(body).map_err(|e| {
            DomainError::TranslationService(format!("Invalid generateContent response: {e}"))
        })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, DomainError> {
        let api_key = self.resolve_api_key()?;
        let url = self.generate_url();
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        debug!(model = %self.config.model, prompt_chars = prompt.len(), "Sending generateContent request");

        let response = self
            .http
            .post_json(&url, &[("x-goog-api-key", api_key.as_str())], &body)
            .await
            .map_err(|e| match e {
                DomainError::QuotaExceeded(_) | DomainError::TranslationService(_) => e,
                other => DomainError::TranslationService(other.to_string()),
            })?;

        if !response.is_success() {
            return Err(Self::classify_failure(&response));
        }

        let text = Self::extract_text(&response.body)?;
        debug!(reply_chars = text.len(), "generateContent reply received");
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
