use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{
    CloudTtsSynthesizer, CommandAudioSink, GeminiGenerator, HttpConnectivityProbe, HttpGateway,
    TomlConfigStore,
};
use crate::app::coordinator::TranslationCoordinator;
use crate::app::orchestrator::{Orchestrator, OrchestratorHandle, PipelineServices};
use crate::app::sequencer::SynthesisSequencer;
use crate::domain::{
    AppConfig, AtomicPipelinePhase, DomainError, LanguageConfig, LanguageKey, LanguageRegistry,
    ModeCatalog, SynthesisJob, TranslationOutcome, TranslationRequest,
};
use crate::infrastructure::init_logging;
use crate::ports::{AudioSink, ConfigStore, HttpClient, SpeechRecognizer};

/// Application controller: loads configuration, sets up logging, validates
/// the language and mode tables, and builds the pipeline around them.
pub struct AppController {
    config: RwLock<AppConfig>,
    config_store: Arc<TomlConfigStore>,
    registry: Arc<LanguageRegistry>,
    catalog: Arc<ModeCatalog>,
    http: Arc<HttpGateway>,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// Initialize from the default config location, or `data_dir` if given.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self, DomainError> {
        // Step 1: Config store
        let config_store = Arc::new(match data_dir {
            Some(dir) => TomlConfigStore::with_data_dir(dir)?,
            None => TomlConfigStore::new()?,
        });

        // Step 2: Configuration
        let config = config_store.load()?;

        // Step 3: Logging
        let log_guard = init_logging(&config_store.logs_dir(), &config.logging)?;

        info!(version = env!("CARGO_PKG_VERSION"), "Voice translator starting up");

        // Step 4: Language and mode tables; a broken table is fatal here
        let registry = Arc::new(LanguageRegistry::new(config.languages.clone())?);
        let catalog = Arc::new(ModeCatalog::new(config.modes.clone(), &registry)?);
        catalog.get(&config.pipeline.default_mode)?;

        // Step 5: HTTP gateway shared by every network adapter
        let http = Arc::new(HttpGateway::new(&config.network)?);

        info!(
            languages = registry.iter().count(),
            modes = catalog.iter().count(),
            default_mode = %config.pipeline.default_mode,
            "AppController initialized"
        );

        Ok(Self {
            config: RwLock::new(config),
            config_store,
            registry,
            catalog,
            http,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Replace the stored configuration with the defaults.
    ///
    /// Takes effect on the next start.
    pub fn reset_config(&self) -> Result<AppConfig, DomainError> {
        let config = self.config_store.reset()?;
        *self.config.write() = config.clone();
        info!("Configuration reset to defaults");
        Ok(config)
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &ModeCatalog {
        &self.catalog
    }

    pub fn allowed_domains(&self) -> Vec<String> {
        self.http.allowed_domains()
    }

    pub fn data_dir(&self) -> String {
        self.config_store.data_dir().to_string_lossy().to_string()
    }

    pub fn logs_dir(&self) -> String {
        self.config_store.logs_dir().to_string_lossy().to_string()
    }

    pub fn config_path(&self) -> String {
        self.config_store.config_path().to_string_lossy().to_string()
    }

    /// Start the continuous pipeline on `recognizer`, in `mode` or the
    /// configured default mode.
    pub fn launch(
        &self,
        recognizer: Arc<dyn SpeechRecognizer>,
        mode: Option<&str>,
    ) -> Result<(OrchestratorHandle, JoinHandle<()>), DomainError> {
        let config = self.config();
        let mode = mode.unwrap_or(&config.pipeline.default_mode).to_string();
        let services = self.services(&config, recognizer)?;

        Orchestrator::spawn(
            services,
            Arc::clone(&self.registry),
            Arc::clone(&self.catalog),
            &config,
            &mode,
        )
    }

    /// Translate one text in `mode` without listening or speaking.
    pub async fn translate_once(&self, mode: &str, text: &str) -> Result<TranslationOutcome, DomainError> {
        let config = self.config();
        let definition = self.catalog.get(mode)?;

        let coordinator = TranslationCoordinator::new(
            Arc::new(self.generator(&config)),
            Arc::new(self.connectivity(&config)),
            Arc::clone(&self.registry),
            Arc::new(AtomicPipelinePhase::default()),
            config.recognition.min_utterance_chars,
        );
        let request = TranslationRequest::new(text, definition.mode.clone(), 0);
        Ok(coordinator.translate(&request).await)
    }

    /// Speak `text` with the voice of the named language.
    pub async fn speak_once(&self, language: &str, text: &str) -> Result<(), DomainError> {
        let config = self.config();
        let language = self.find_language(language)?;

        let sequencer = SynthesisSequencer::new(
            Arc::new(self.synthesizer(&config)),
            self.audio_sink(&config)?,
            Arc::new(AtomicPipelinePhase::default()),
            config.playback.scratch_dir(),
        );
        sequencer.speak(&SynthesisJob::for_language(text, language)).await
    }

    fn find_language(&self, name: &str) -> Result<&LanguageConfig, DomainError> {
        match self.registry.match_name(name) {
            Some(key) => self.registry.resolve(key),
            None => self.registry.resolve(&LanguageKey::from(name)),
        }
    }

    fn services(
        &self,
        config: &AppConfig,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Result<PipelineServices, DomainError> {
        Ok(PipelineServices {
            recognizer,
            generator: Arc::new(self.generator(config)),
            connectivity: Arc::new(self.connectivity(config)),
            synthesizer: Arc::new(self.synthesizer(config)),
            sink: self.audio_sink(config)?,
        })
    }

    fn http_client(&self) -> Arc<dyn HttpClient> {
        self.http.clone()
    }

    fn generator(&self, config: &AppConfig) -> GeminiGenerator {
        GeminiGenerator::new(config.translation.clone(), self.http_client())
    }

    fn synthesizer(&self, config: &AppConfig) -> CloudTtsSynthesizer {
        CloudTtsSynthesizer::new(config.synthesis.clone(), self.http_client())
    }

    fn connectivity(&self, config: &AppConfig) -> HttpConnectivityProbe {
        HttpConnectivityProbe::new(self.http_client(), config.network.connectivity_probe_url.clone())
    }

    #[cfg(not(feature = "rodio-playback"))]
    fn audio_sink(&self, config: &AppConfig) -> Result<Arc<dyn AudioSink>, DomainError> {
        Ok(Arc::new(CommandAudioSink::new(&config.playback.player_command)?))
    }

    /// In-process playback unless an external player is configured.
    #[cfg(feature = "rodio-playback")]
    fn audio_sink(&self, config: &AppConfig) -> Result<Arc<dyn AudioSink>, DomainError> {
        if config.playback.player_command.is_empty() {
            return Ok(Arc::new(crate::adapters::RodioAudioSink::new()));
        }
        Ok(Arc::new(CommandAudioSink::new(&config.playback.player_command)?))
    }
}
