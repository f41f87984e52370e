use zeroize::Zeroize;

use crate::domain::language::LanguageConfig;

/// Text to be spoken in a given voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisJob {
    pub text: String,
    pub language_code: String,
    pub voice_name: String,
}

impl SynthesisJob {
    pub fn new(
        text: impl Into<String>,
        language_code: impl Into<String>,
        voice_name: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            language_code: language_code.into(),
            voice_name: voice_name.into(),
        }
    }

    /// Job speaking `text` with the synthesis voice of `language`.
    pub fn for_language(text: impl Into<String>, language: &LanguageConfig) -> Self {
        Self::new(
            text,
            language.synthesis_language_code.clone(),
            language.synthesis_voice_name.clone(),
        )
    }
}

/// Encoded audio returned by the synthesis service.
/// Zeroed on drop; it only lives for the current playback.
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
pub struct SynthesizedAudio {
    bytes: Vec<u8>,
    /// File extension matching the encoding, e.g. "mp3".
    extension: String,
}

impl SynthesizedAudio {
    pub fn new(bytes: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            bytes,
            extension: extension.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}
