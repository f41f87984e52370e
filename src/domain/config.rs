use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::language::LanguageConfig;
use crate::domain::mode::ModeDefinition;

/// Network-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Domains the HTTP gateway may contact.
    pub allowed_domains: Vec<String>,
    /// URL requested to decide whether a network path exists.
    pub connectivity_probe_url: String,
    /// Connectivity probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
    /// Timeout for translation and synthesis requests, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            allowed_domains: Self::default_allowed_domains(),
            connectivity_probe_url: "https://generativelanguage.googleapis.com/".to_string(),
            probe_timeout_ms: 3000,
            request_timeout_secs: 30,
        }
    }
}

impl NetworkConfig {
    /// Default allowed domains for the translation and synthesis APIs.
    pub fn default_allowed_domains() -> Vec<String> {
        vec![
            "generativelanguage.googleapis.com".to_string(),
            "texttospeech.googleapis.com".to_string(),
        ]
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

/// Speech recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Silence after the last partial result that ends an utterance.
    pub silence_timeout_ms: u64,
    /// Final transcripts shorter than this (after trimming) are noise.
    pub min_utterance_chars: usize,
    /// How long the engine gets to deliver its final result once asked to stop.
    pub stop_grace_ms: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            silence_timeout_ms: 5000,
            min_utterance_chars: 2,
            stop_grace_ms: 3000,
        }
    }
}

/// Translation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Base URL of the generative language API.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

/// Speech synthesis service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Full URL of the `text:synthesize` endpoint.
    pub endpoint: String,
    /// Environment variable holding the OAuth bearer token.
    pub access_token_env: String,
    /// Requested audio encoding.
    pub audio_encoding: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://texttospeech.googleapis.com/v1/text:synthesize".to_string(),
            access_token_env: "GOOGLE_TTS_ACCESS_TOKEN".to_string(),
            audio_encoding: "MP3".to_string(),
        }
    }
}

/// Audio playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// External player invoked with the audio file path appended.
    pub player_command: Vec<String>,
    /// Where synthesized audio is written before playback.
    /// Defaults to the OS temp directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            player_command: ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"]
                .into_iter()
                .map(String::from)
                .collect(),
            scratch_dir: None,
        }
    }
}

impl PlaybackConfig {
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("voice-translator"))
    }
}

/// Voice cycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Mode selected at startup.
    pub default_mode: String,
    /// Start listening again after a completed cycle while the toggle is on.
    pub continuous: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_mode: "pt-es".to_string(),
            continuous: true,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub network: NetworkConfig,
    pub recognition: RecognitionConfig,
    pub translation: TranslationConfig,
    pub synthesis: SynthesisConfig,
    pub playback: PlaybackConfig,
    pub pipeline: PipelineConfig,
    pub languages: Vec<LanguageConfig>,
    pub modes: Vec<ModeDefinition>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            network: NetworkConfig::default(),
            recognition: RecognitionConfig::default(),
            translation: TranslationConfig::default(),
            synthesis: SynthesisConfig::default(),
            playback: PlaybackConfig::default(),
            pipeline: PipelineConfig::default(),
            languages: LanguageConfig::builtin(),
            modes: ModeDefinition::builtin(),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
