use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};
use zeroize::Zeroizing;

use crate::domain::config::SynthesisConfig;
use crate::domain::{DomainError, SynthesisJob, SynthesizedAudio};
use crate::ports::{HttpClient, SpeechSynthesizer};

/// Speech synthesizer backed by the Cloud Text-to-Speech REST API.
///
/// The bearer token is provisioned out-of-band and read from the environment
/// on every request.
pub struct CloudTtsSynthesizer {
    config: SynthesisConfig,
    http: Arc<dyn HttpClient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

impl CloudTtsSynthesizer {
    pub fn new(config: SynthesisConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    fn access_token(&self) -> Result<Zeroizing<String>, DomainError> {
        std::env::var(&self.config.access_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(Zeroizing::new)
            .ok_or_else(|| {
                DomainError::Credential(format!("set {} env var", self.config.access_token_env))
            })
    }

    fn file_extension(&self) -> String {
        match self.config.audio_encoding.to_ascii_uppercase().as_str() {
            "LINEAR16" => "wav".to_string(),
            "OGG_OPUS" => "ogg".to_string(),
            other => other.to_ascii_lowercase(),
        }
    }

    fn decode_audio(body: &str) -> Result<Vec<u8>, DomainError> {
        let parsed: SynthesizeResponse = serde_json::from_str(body)
            .map_err(|e| DomainError::Synthesis(format!("Invalid synthesize response: {e}")))?;
        STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| DomainError::Synthesis(format!("Invalid audio content: {e}")))
    }
}

#[async_trait]
impl SpeechSynthesizer for CloudTtsSynthesizer {
    async fn synthesize(&self, job: &SynthesisJob) -> Result<SynthesizedAudio, DomainError> {
        let token = self.access_token()?;
        let authorization = Zeroizing::new(format!("Bearer {}", token.as_str()));

        let body = json!({
            "input": { "text": job.text },
            "voice": {
                "languageCode": job.language_code,
                "name": job.voice_name,
            },
            "audioConfig": { "audioEncoding": self.config.audio_encoding },
        });

        debug!(
            language = %job.language_code,
            voice = %job.voice_name,
            chars = job.text.len(),
            "Requesting speech synthesis"
        );

        let response = self
            .http
            .post_json(
                &self.config.endpoint,
                &[("Authorization", authorization.as_str())],
                &body,
            )
            .await
            .map_err(|e| DomainError::Synthesis(e.to_string()))?;

        if !response.is_success() {
            error!(status = response.status, body = %response.body, "Synthesis request failed");
            return Err(DomainError::Synthesis(format!(
                "HTTP {}: {}",
                response.status,
                response.body.trim()
            )));
        }

        let bytes = Self::decode_audio(&response.body)?;
        debug!(bytes = bytes.len(), "Synthesized audio received");
        Ok(SynthesizedAudio::new(bytes, self.file_extension()))
    }
}
