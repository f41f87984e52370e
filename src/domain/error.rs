use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::pipeline::PipelinePhase;
use crate::domain::recognition::RecognitionErrorKind;

/// Domain-level errors for the voice translator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Unknown translation mode: {0}")]
    UnknownMode(String),

    #[error("Pipeline busy ({current:?})")]
    Busy { current: PipelinePhase },

    #[error("No network connection available")]
    NetworkUnavailable,

    #[error("Network request blocked: {reason}")]
    NetworkBlocked { reason: String },

    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    #[error("Utterance too short ({length} chars)")]
    EmptyOrTooShortUtterance { length: usize },

    #[error("Recognition error: {0}")]
    RecognitionEngine(RecognitionErrorKind),

    #[error("Could not parse translation reply: {0}")]
    TranslationParse(String),

    #[error("Translation not processable: {0}")]
    UnprocessableTranslation(String),

    #[error("Too many requests. Please wait a minute and try again. ({0})")]
    QuotaExceeded(String),

    #[error("Translation service error: {0}")]
    TranslationService(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Missing credential: {0}")]
    Credential(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Copyable classification of a failure, carried in outcomes and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Busy,
    NetworkUnavailable,
    EmptyOrTooShortUtterance,
    RecognitionEngine,
    ParseError,
    UnprocessableTranslation,
    QuotaExceeded,
    TranslationService,
    SynthesisError,
    Playback,
    UnknownLanguage,
    Internal,
}

impl DomainError {
    /// Classify this error for status reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            DomainError::Busy { .. } => FailureKind::Busy,
            DomainError::NetworkUnavailable => FailureKind::NetworkUnavailable,
            DomainError::EmptyOrTooShortUtterance { .. } => FailureKind::EmptyOrTooShortUtterance,
            DomainError::RecognitionEngine(_) => FailureKind::RecognitionEngine,
            DomainError::TranslationParse(_) => FailureKind::ParseError,
            DomainError::UnprocessableTranslation(_) => FailureKind::UnprocessableTranslation,
            DomainError::QuotaExceeded(_) => FailureKind::QuotaExceeded,
            DomainError::TranslationService(_)
            | DomainError::NetworkBlocked { .. }
            | DomainError::HttpRequest(_) => FailureKind::TranslationService,
            DomainError::Synthesis(_) | DomainError::Credential(_) => FailureKind::SynthesisError,
            DomainError::Playback(_) => FailureKind::Playback,
            DomainError::UnknownLanguage(_) | DomainError::UnknownMode(_) => {
                FailureKind::UnknownLanguage
            }
            DomainError::Config(_) | DomainError::Serialization(_) | DomainError::Io(_) => {
                FailureKind::Internal
            }
        }
    }

    /// Whether the pipeline can carry on with the next cycle after this error.
    ///
    /// Only broken configuration invariants are fatal; they are caught at startup.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DomainError::UnknownLanguage(_) | DomainError::Config(_))
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
