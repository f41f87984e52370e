use serde::Serialize;
use serde_json::Value;

use crate::domain::error::{DomainError, FailureKind};
use crate::domain::language::LanguageKey;
use crate::domain::mode::{Confidence, TranslationMode};

/// Marker carried by every reply-parse failure message.
///
/// A "translation" containing it is never spoken.
pub const PARSE_FAILURE_MARKER: &str = "Unable to process translation";

/// Maximum number of characters of a raw reply quoted in diagnostics.
const EXCERPT_CHARS: usize = 200;

/// One utterance to translate, tagged with the generation that dispatched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub mode: TranslationMode,
    pub request_id: u64,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, mode: TranslationMode, request_id: u64) -> Self {
        Self {
            text: text.into(),
            mode,
            request_id,
        }
    }
}

/// Result of a translation request, consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranslationOutcome {
    Success {
        source_key: LanguageKey,
        target_key: LanguageKey,
        translated_text: String,
        confidence: Confidence,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl TranslationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TranslationOutcome::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            TranslationOutcome::Success { .. } => None,
            TranslationOutcome::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<DomainError> for TranslationOutcome {
    fn from(err: DomainError) -> Self {
        TranslationOutcome::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// The three fields the translation model is asked to return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReply {
    pub source_language_name: String,
    pub target_language_name: String,
    pub translated_text: String,
}

impl TranslationReply {
    /// Reject replies that carry nothing worth speaking.
    pub fn ensure_processable(self) -> Result<Self, DomainError> {
        let text = self.translated_text.trim();
        if text.is_empty() {
            return Err(DomainError::UnprocessableTranslation(
                "translated text is empty".to_string(),
            ));
        }
        if text.contains(PARSE_FAILURE_MARKER) {
            return Err(DomainError::UnprocessableTranslation(excerpt(text)));
        }
        Ok(self)
    }
}

/// Remove a surrounding code fence (```` ```json ```` or bare ```` ``` ````).
pub fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Optional language tag right after the opening fence.
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    let body = &rest[tag_len..];
    // Anything after the last closing fence is commentary.
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parse a raw model reply into its three fields.
///
/// Missing fields default to empty strings; a reply that is not a JSON object
/// is a `TranslationParse` failure, never a panic.
pub fn parse_reply(raw: &str) -> Result<TranslationReply, DomainError> {
    if raw.trim().is_empty() {
        return Err(DomainError::UnprocessableTranslation(
            "empty reply from translator".to_string(),
        ));
    }

    let body = strip_fence(raw);
    let parse_failure =
        || DomainError::TranslationParse(format!("{PARSE_FAILURE_MARKER}. Raw reply: {}", excerpt(body)));

    let value: Value = serde_json::from_str(body).map_err(|_| parse_failure())?;
    let object = value.as_object().ok_or_else(parse_failure)?;

    let field = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(TranslationReply {
        source_language_name: field("source_language_name"),
        target_language_name: field("target_language_name"),
        translated_text: field("translated_text"),
    })
}

/// Build the instruction sent to the translation model.
pub fn build_prompt(text: &str, mode: &TranslationMode) -> String {
    let quoted = serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""));
    let instructions = match mode {
        TranslationMode::FixedPair { lang_a, lang_b } => format!(
            "You are a bidirectional translator. The input text is in {lang_a} or {lang_b}.\n\
             \n\
             1. Detect the source language of the text. Use the exact language name from the pair ({lang_a} or {lang_b}).\n\
             2. The target language is the other language of the pair. Use its exact name from the pair.\n\
             3. Translate the text."
        ),
        TranslationMode::AutoDetect {
            default_target,
            alternate,
            ..
        } => {
            let names = mode
                .permissible_sources()
                .into_iter()
                .map(LanguageKey::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "You are a smart translator. The input text may be in any of the following languages: {names}.\n\
                 \n\
                 1. Detect the source language of the text. Use the exact language name from that list.\n\
                 2. Determine the target language with this rule:\n\
                 \x20  - IF the source language is '{default_target}', the target must be '{alternate}'.\n\
                 \x20  - OTHERWISE, the target MUST be '{default_target}'.\n\
                 3. Translate the text."
            )
        }
    };

    format!(
        "{instructions}\n\
         \n\
         Reply ONLY with a JSON object with exactly these three fields:\n\
         \n\
         {{\n\
         \x20 \"source_language_name\": \"Name of the source language\",\n\
         \x20 \"target_language_name\": \"Name of the target language\",\n\
         \x20 \"translated_text\": \"The translation here.\"\n\
         }}\n\
         \n\
         Input text: {quoted}"
    )
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(EXCERPT_CHARS).collect();
    cut.push('…');
    cut
}
