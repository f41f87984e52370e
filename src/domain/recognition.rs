use std::fmt;

use serde::{Deserialize, Serialize};

/// Recognition session state machine.
///
/// State transitions:
/// - Idle -> Listening (start)
/// - Listening -> Finalizing (final transcript received)
/// - Finalizing -> Idle (utterance handed off or discarded as noise)
/// - Listening -> Idle (explicit stop, engine error, stream closed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionState {
    /// No active engine stream.
    Idle,
    /// Engine stream open, silence timer armed.
    Listening,
    /// Final transcript received and being validated.
    Finalizing,
}

impl RecognitionState {
    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(self, RecognitionState::Idle)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, RecognitionState::Idle)
    }
}

/// Events delivered by a speech-recognition engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ReadyForSpeech,
    Partial(String),
    Final(String),
    EndOfSpeech,
    /// Engine-specific error code.
    Error(i32),
}

/// Classified recognition engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionErrorKind {
    NetworkTimeout,
    NoSpeechDetected,
    AudioError,
    Unknown(i32),
}

impl RecognitionErrorKind {
    pub const CODE_NETWORK_TIMEOUT: i32 = 1;
    pub const CODE_AUDIO: i32 = 3;
    pub const CODE_SPEECH_TIMEOUT: i32 = 6;
    pub const CODE_NO_MATCH: i32 = 7;

    /// Map an engine error code (platform recognizer numbering).
    pub fn from_code(code: i32) -> Self {
        match code {
            Self::CODE_NETWORK_TIMEOUT => RecognitionErrorKind::NetworkTimeout,
            Self::CODE_AUDIO => RecognitionErrorKind::AudioError,
            Self::CODE_SPEECH_TIMEOUT | Self::CODE_NO_MATCH => RecognitionErrorKind::NoSpeechDetected,
            other => RecognitionErrorKind::Unknown(other),
        }
    }
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionErrorKind::NetworkTimeout => write!(f, "network timeout"),
            RecognitionErrorKind::NoSpeechDetected => write!(f, "no speech detected or recognized"),
            RecognitionErrorKind::AudioError => write!(f, "audio recording error"),
            RecognitionErrorKind::Unknown(code) => write!(f, "unknown recognition error ({code})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(RecognitionErrorKind::from_code(1), RecognitionErrorKind::NetworkTimeout);
        assert_eq!(RecognitionErrorKind::from_code(3), RecognitionErrorKind::AudioError);
        assert_eq!(RecognitionErrorKind::from_code(7), RecognitionErrorKind::NoSpeechDetected);
        assert_eq!(RecognitionErrorKind::from_code(6), RecognitionErrorKind::NoSpeechDetected);
        assert_eq!(RecognitionErrorKind::from_code(42), RecognitionErrorKind::Unknown(42));
    }

    #[test]
    fn test_state_predicates() {
        assert!(RecognitionState::Idle.can_start());
        assert!(!RecognitionState::Listening.can_start());
        assert!(!RecognitionState::Finalizing.can_start());
        assert!(RecognitionState::Listening.is_active());
        assert!(!RecognitionState::Idle.is_active());
    }

    #[test]
    fn test_unknown_error_display_includes_code() {
        assert_eq!(
            RecognitionErrorKind::Unknown(13).to_string(),
            "unknown recognition error (13)"
        );
    }
}
