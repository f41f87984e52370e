use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::translation::{build_prompt, parse_reply};
use crate::domain::{
    AtomicPipelinePhase, DomainError, LanguageRegistry, ModeResolver, PipelinePhase,
    TranslationOutcome, TranslationRequest,
};
use crate::ports::{ConnectivityCheck, TextGenerator};

/// Single-flight translation of recognized utterances.
///
/// While one request holds the `Translating` phase, any other call is answered
/// with a `Busy` failure before touching the network.
pub struct TranslationCoordinator {
    generator: Arc<dyn TextGenerator>,
    connectivity: Arc<dyn ConnectivityCheck>,
    registry: Arc<LanguageRegistry>,
    phase: Arc<AtomicPipelinePhase>,
    min_utterance_chars: usize,
}

impl TranslationCoordinator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        connectivity: Arc<dyn ConnectivityCheck>,
        registry: Arc<LanguageRegistry>,
        phase: Arc<AtomicPipelinePhase>,
        min_utterance_chars: usize,
    ) -> Self {
        Self {
            generator,
            connectivity,
            registry,
            phase,
            min_utterance_chars,
        }
    }

    pub async fn translate(&self, request: &TranslationRequest) -> TranslationOutcome {
        let _guard = match self.phase.try_enter(PipelinePhase::Translating) {
            Ok(guard) => guard,
            Err(e) => {
                warn!(request_id = request.request_id, error = %e, "Translation rejected");
                return e.into();
            }
        };

        match self.run(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(request_id = request.request_id, error = %e, "Translation failed");
                e.into()
            }
        }
    }

    async fn run(&self, request: &TranslationRequest) -> Result<TranslationOutcome, DomainError> {
        let text = request.text.trim();
        let length = text.chars().count();
        if length < self.min_utterance_chars {
            return Err(DomainError::EmptyOrTooShortUtterance { length });
        }

        if !self.connectivity.is_network_available().await {
            return Err(DomainError::NetworkUnavailable);
        }

        let prompt = build_prompt(text, &request.mode);
        debug!(
            request_id = request.request_id,
            generator = self.generator.name(),
            "Dispatching translation"
        );
        let raw = self.generator.generate(&prompt).await?;

        let reply = parse_reply(&raw)?.ensure_processable()?;
        let pair = ModeResolver::new(&self.registry).resolve(&request.mode, &reply.source_language_name);

        if !reply.target_language_name.is_empty()
            && self.registry.match_name(&reply.target_language_name) != Some(&pair.target)
        {
            debug!(
                reported = %reply.target_language_name,
                resolved = %pair.target,
                "Model target language overridden by mode rule"
            );
        }

        info!(
            request_id = request.request_id,
            source = %pair.source,
            target = %pair.target,
            confidence = ?pair.confidence,
            "Translation complete"
        );

        Ok(TranslationOutcome::Success {
            source_key: pair.source,
            target_key: pair.target,
            translated_text: reply.translated_text.trim().to_string(),
            confidence: pair.confidence,
        })
    }
}
