use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::mode::TranslationMode;

/// Stable key of a registered language (e.g. "Português").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageKey(String);

impl LanguageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Recognition and synthesis settings of one supported language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Registry key, also the name the translation model is asked to use.
    pub key: LanguageKey,
    /// Human-readable name, e.g. "Português (Brasil)".
    pub display_name: String,
    /// Language hint for the speech recognizer (BCP-47, e.g. "pt-BR").
    pub recognition_code: String,
    /// Language code for the synthesis voice.
    pub synthesis_language_code: String,
    /// Synthesis voice name, e.g. "pt-BR-Wavenet-B".
    pub synthesis_voice_name: String,
    /// Other surface forms the model may report for this language.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl LanguageConfig {
    fn new(
        key: &str,
        display_name: &str,
        code: &str,
        voice: &str,
        aliases: &[&str],
    ) -> Self {
        Self {
            key: LanguageKey::from(key),
            display_name: display_name.to_string(),
            recognition_code: code.to_string(),
            synthesis_language_code: code.to_string(),
            synthesis_voice_name: voice.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// The built-in language table.
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new(
                "Português",
                "Português (Brasil)",
                "pt-BR",
                "pt-BR-Wavenet-B",
                &["Portuguese", "Portugues"],
            ),
            Self::new(
                "Espanhol",
                "Espanhol (Espanha)",
                "es-ES",
                "es-ES-Neural2-F",
                &["Spanish", "Español", "Espanol"],
            ),
            Self::new(
                "Inglês",
                "Inglês (EUA)",
                "en-US",
                "en-US-Standard-C",
                &["English", "Ingles"],
            ),
            Self::new(
                "Francês",
                "Francês (França)",
                "fr-FR",
                "fr-FR-Wavenet-B",
                &["French", "Français", "Frances"],
            ),
            Self::new(
                "Alemão",
                "Alemão (Alemanha)",
                "de-DE",
                "de-DE-Wavenet-B",
                &["German", "Deutsch", "Alemao"],
            ),
            Self::new(
                "Italiano",
                "Italiano (Itália)",
                "it-IT",
                "it-IT-Wavenet-B",
                &["Italian"],
            ),
        ]
    }

    /// Check whether `name` (already lowercased and trimmed) names this language.
    fn accepts(&self, name: &str) -> bool {
        self.key.as_str().to_lowercase() == name
            || self.display_name.to_lowercase() == name
            || self.aliases.iter().any(|a| a.to_lowercase() == name)
    }
}

/// Immutable table of supported languages, built once at startup and shared.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

impl LanguageRegistry {
    /// Build a registry, rejecting an empty table or duplicate keys.
    pub fn new(languages: Vec<LanguageConfig>) -> Result<Self, DomainError> {
        if languages.is_empty() {
            return Err(DomainError::Config(
                "Language registry must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for language in &languages {
            if !seen.insert(language.key.clone()) {
                return Err(DomainError::Config(format!(
                    "Duplicate language key: {}",
                    language.key
                )));
            }
        }

        Ok(Self { languages })
    }

    /// Registry with the built-in language table.
    pub fn builtin() -> Self {
        Self {
            languages: LanguageConfig::builtin(),
        }
    }

    /// Look up a language by key.
    pub fn resolve(&self, key: &LanguageKey) -> Result<&LanguageConfig, DomainError> {
        self.languages
            .iter()
            .find(|l| &l.key == key)
            .ok_or_else(|| DomainError::UnknownLanguage(key.to_string()))
    }

    /// Look up a key that startup validation already vouched for.
    ///
    /// A miss is a broken invariant: it panics in debug builds and falls back
    /// to the first registered language in release builds.
    pub fn resolve_or_default(&self, key: &LanguageKey) -> &LanguageConfig {
        match self.resolve(key) {
            Ok(config) => config,
            Err(err) => {
                debug_assert!(false, "{err}");
                tracing::error!(%key, "Unregistered language key, using registry default");
                &self.languages[0]
            }
        }
    }

    pub fn contains(&self, key: &LanguageKey) -> bool {
        self.languages.iter().any(|l| &l.key == key)
    }

    /// Normalize a free-text language name (key, display name or alias,
    /// case-insensitive) to its registry key.
    pub fn match_name(&self, name: &str) -> Option<&LanguageKey> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.languages
            .iter()
            .find(|l| l.accepts(&needle))
            .map(|l| &l.key)
    }

    /// Check that every key `mode` references is registered.
    pub fn validate_mode(&self, mode: &TranslationMode) -> Result<(), DomainError> {
        mode.validate(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageConfig> {
        self.languages.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &LanguageKey> {
        self.languages.iter().map(|l| &l.key)
    }
}
