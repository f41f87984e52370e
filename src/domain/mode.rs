use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::error::DomainError;
use crate::domain::language::{LanguageKey, LanguageRegistry};

/// How the direction of a translation is decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslationMode {
    /// Two languages; whichever one is spoken is translated into the other.
    FixedPair {
        lang_a: LanguageKey,
        lang_b: LanguageKey,
    },
    /// Any candidate is translated into `default_target`; speech in
    /// `default_target` itself is translated into `alternate`.
    AutoDetect {
        candidates: Vec<LanguageKey>,
        default_target: LanguageKey,
        alternate: LanguageKey,
    },
}

impl TranslationMode {
    /// The language used as the recognition hint.
    pub fn primary(&self) -> &LanguageKey {
        match self {
            TranslationMode::FixedPair { lang_a, .. } => lang_a,
            TranslationMode::AutoDetect { default_target, .. } => default_target,
        }
    }

    /// Languages the speaker may use in this mode.
    pub fn permissible_sources(&self) -> Vec<&LanguageKey> {
        match self {
            TranslationMode::FixedPair { lang_a, lang_b } => vec![lang_a, lang_b],
            TranslationMode::AutoDetect { candidates, .. } => candidates.iter().collect(),
        }
    }

    /// Check every referenced key against the registry.
    pub fn validate(&self, registry: &LanguageRegistry) -> Result<(), DomainError> {
        match self {
            TranslationMode::FixedPair { lang_a, lang_b } => {
                registry.resolve(lang_a)?;
                registry.resolve(lang_b)?;
                if lang_a == lang_b {
                    return Err(DomainError::Config(format!(
                        "Fixed pair uses {lang_a} on both sides"
                    )));
                }
            }
            TranslationMode::AutoDetect {
                candidates,
                default_target,
                alternate,
            } => {
                for key in candidates {
                    registry.resolve(key)?;
                }
                registry.resolve(default_target)?;
                registry.resolve(alternate)?;
                if default_target == alternate {
                    return Err(DomainError::Config(format!(
                        "Auto-detect alternate must differ from default {default_target}"
                    )));
                }
                if !candidates.contains(default_target) || !candidates.contains(alternate) {
                    return Err(DomainError::Config(format!(
                        "Auto-detect candidates must include {default_target} and {alternate}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A selectable mode as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDefinition {
    pub id: String,
    pub display_name: String,
    pub mode: TranslationMode,
}

impl ModeDefinition {
    fn pair(id: &str, display_name: &str, a: &str, b: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            mode: TranslationMode::FixedPair {
                lang_a: LanguageKey::from(a),
                lang_b: LanguageKey::from(b),
            },
        }
    }

    /// The built-in modes.
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::pair("pt-es", "Português ↔ Espanhol", "Português", "Espanhol"),
            Self::pair("pt-en", "Português ↔ Inglês", "Português", "Inglês"),
            Self::pair("es-en", "Espanhol ↔ Inglês", "Espanhol", "Inglês"),
            Self {
                id: "auto-pt".to_string(),
                display_name: "Auto Detect ↔ Português".to_string(),
                mode: TranslationMode::AutoDetect {
                    candidates: ["Português", "Espanhol", "Inglês", "Francês", "Alemão", "Italiano"]
                        .into_iter()
                        .map(LanguageKey::from)
                        .collect(),
                    default_target: LanguageKey::from("Português"),
                    alternate: LanguageKey::from("Inglês"),
                },
            },
        ]
    }
}

/// Validated set of selectable modes.
#[derive(Debug, Clone)]
pub struct ModeCatalog {
    modes: Vec<ModeDefinition>,
}

impl ModeCatalog {
    /// Build the catalog, validating every mode against the registry.
    ///
    /// This is where an `UnknownLanguage` configuration surfaces, before any
    /// voice cycle starts.
    pub fn new(modes: Vec<ModeDefinition>, registry: &LanguageRegistry) -> Result<Self, DomainError> {
        if modes.is_empty() {
            return Err(DomainError::Config("No translation modes configured".to_string()));
        }

        let mut ids = HashSet::new();
        for def in &modes {
            if !ids.insert(def.id.as_str()) {
                return Err(DomainError::Config(format!("Duplicate mode id: {}", def.id)));
            }
            registry.validate_mode(&def.mode)?;
        }

        Ok(Self { modes })
    }

    pub fn get(&self, id: &str) -> Result<&ModeDefinition, DomainError> {
        self.modes
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| DomainError::UnknownMode(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModeDefinition> {
        self.modes.iter()
    }
}

/// How a resolved pair was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// The reported source language matched the mode.
    Detected,
    /// Detection failed; the mode's default orientation was used.
    Fallback,
}

/// Concrete translation direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPair {
    pub source: LanguageKey,
    pub target: LanguageKey,
    pub confidence: Confidence,
}

/// Turns a mode and a model-reported source language name into a direction.
///
/// Pure: no I/O, no state beyond the borrowed registry.
#[derive(Debug, Clone, Copy)]
pub struct ModeResolver<'a> {
    registry: &'a LanguageRegistry,
}

impl<'a> ModeResolver<'a> {
    pub fn new(registry: &'a LanguageRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, mode: &TranslationMode, reported_source: &str) -> ResolvedPair {
        let detected = self.registry.match_name(reported_source);

        match mode {
            TranslationMode::FixedPair { lang_a, lang_b } => match detected {
                Some(key) if key == lang_a => Self::detected(lang_a, lang_b),
                Some(key) if key == lang_b => Self::detected(lang_b, lang_a),
                _ => {
                    warn!(
                        reported = reported_source,
                        assumed_source = %lang_a,
                        "Language detection failed, assuming first language of the pair"
                    );
                    Self::fallback(lang_a, lang_b)
                }
            },
            TranslationMode::AutoDetect {
                candidates,
                default_target,
                alternate,
            } => match detected {
                Some(key) if key == default_target => Self::detected(default_target, alternate),
                Some(key) if candidates.contains(key) => Self::detected(key, default_target),
                _ => {
                    warn!(
                        reported = reported_source,
                        assumed_source = %default_target,
                        "Language detection failed, assuming default language as source"
                    );
                    Self::fallback(default_target, alternate)
                }
            },
        }
    }

    fn detected(source: &LanguageKey, target: &LanguageKey) -> ResolvedPair {
        debug!(%source, %target, "Translation direction resolved");
        ResolvedPair {
            source: source.clone(),
            target: target.clone(),
            confidence: Confidence::Detected,
        }
    }

    fn fallback(source: &LanguageKey, target: &LanguageKey) -> ResolvedPair {
        ResolvedPair {
            source: source.clone(),
            target: target.clone(),
            confidence: Confidence::Fallback,
        }
    }
}
