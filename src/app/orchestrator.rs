use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::coordinator::TranslationCoordinator;
use crate::app::sequencer::SynthesisSequencer;
use crate::app::session::{RecognitionSession, SessionStep};
use crate::domain::config::AppConfig;
use crate::domain::{
    AtomicPipelinePhase, DomainError, LanguageRegistry, ModeCatalog, ModeDefinition,
    PipelineEvent, PipelinePhase, SynthesisJob, TranslationOutcome, TranslationRequest,
};
use crate::ports::{AudioSink, ConnectivityCheck, SpeechRecognizer, SpeechSynthesizer, TextGenerator};

const COMMAND_CAPACITY: usize = 16;
const REPORT_CAPACITY: usize = 8;
const EVENT_CAPACITY: usize = 64;

/// Port implementations the pipeline runs on.
#[derive(Clone)]
pub struct PipelineServices {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub generator: Arc<dyn TextGenerator>,
    pub connectivity: Arc<dyn ConnectivityCheck>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub sink: Arc<dyn AudioSink>,
}

/// Outcome of a listening toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleResult {
    Started,
    Stopped,
}

/// Commands sent to the orchestrator task.
enum Command {
    SelectMode {
        id: String,
        reply: oneshot::Sender<Result<ModeDefinition, DomainError>>,
    },
    ToggleListening {
        reply: oneshot::Sender<Result<ToggleResult, DomainError>>,
    },
    CurrentMode {
        reply: oneshot::Sender<ModeDefinition>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Results folded back into the loop by worker tasks.
#[derive(Debug)]
enum WorkerReport {
    Translated {
        generation: u64,
        outcome: TranslationOutcome,
    },
    Spoken {
        generation: u64,
        result: Result<(), DomainError>,
    },
}

/// Work dispatched for the current cycle and not yet reported back.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    generation: u64,
    stage: PipelinePhase,
}

/// Cloneable front end of a running orchestrator.
#[derive(Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<PipelineEvent>,
    phase: Arc<AtomicPipelinePhase>,
}

impl OrchestratorHandle {
    /// Switch to another translation mode, stopping any active session.
    pub async fn select_mode(&self, id: &str) -> Result<ModeDefinition, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SelectMode {
            id: id.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| Self::stopped())?
    }

    /// Start listening, or stop if a session is active or armed.
    pub async fn toggle_listening(&self) -> Result<ToggleResult, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ToggleListening { reply }).await?;
        rx.await.map_err(|_| Self::stopped())?
    }

    pub async fn current_mode(&self) -> Result<ModeDefinition, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CurrentMode { reply }).await?;
        rx.await.map_err(|_| Self::stopped())
    }

    /// Stop everything and end the orchestrator task. Idempotent.
    pub async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase.load()
    }

    async fn send(&self, command: Command) -> Result<(), DomainError> {
        self.commands.send(command).await.map_err(|_| Self::stopped())
    }

    fn stopped() -> DomainError {
        DomainError::Config("voice pipeline is not running".to_string())
    }
}

/// Single event loop wiring session, coordinator and sequencer into one
/// continuous listen, translate, speak cycle.
pub struct Orchestrator {
    registry: Arc<LanguageRegistry>,
    catalog: Arc<ModeCatalog>,
    session: RecognitionSession,
    coordinator: Arc<TranslationCoordinator>,
    sequencer: Arc<SynthesisSequencer>,
    events: broadcast::Sender<PipelineEvent>,
    reports_tx: mpsc::Sender<WorkerReport>,
    reports_rx: mpsc::Receiver<WorkerReport>,
    mode: ModeDefinition,
    continuous: bool,
    generation: u64,
    in_flight: Option<InFlight>,
    armed: bool,
}

impl Orchestrator {
    /// Build the pipeline and run it on a new task.
    pub fn spawn(
        services: PipelineServices,
        registry: Arc<LanguageRegistry>,
        catalog: Arc<ModeCatalog>,
        config: &AppConfig,
        initial_mode: &str,
    ) -> Result<(OrchestratorHandle, JoinHandle<()>), DomainError> {
        let mode = catalog.get(initial_mode)?.clone();
        let phase = Arc::new(AtomicPipelinePhase::default());

        let session = RecognitionSession::new(
            services.recognizer,
            Arc::clone(&phase),
            &config.recognition,
        );
        let coordinator = Arc::new(TranslationCoordinator::new(
            services.generator,
            services.connectivity,
            Arc::clone(&registry),
            Arc::clone(&phase),
            config.recognition.min_utterance_chars,
        ));
        let sequencer = Arc::new(SynthesisSequencer::new(
            services.synthesizer,
            services.sink,
            Arc::clone(&phase),
            config.playback.scratch_dir(),
        ));

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (reports_tx, reports_rx) = mpsc::channel(REPORT_CAPACITY);

        let orchestrator = Self {
            registry,
            catalog,
            session,
            coordinator,
            sequencer,
            events: events.clone(),
            reports_tx,
            reports_rx,
            mode,
            continuous: config.pipeline.continuous,
            generation: 0,
            in_flight: None,
            armed: false,
        };

        info!(
            mode = %orchestrator.mode.id,
            continuous = orchestrator.continuous,
            "Voice pipeline started"
        );
        let task = tokio::spawn(orchestrator.run(commands_rx));

        Ok((
            OrchestratorHandle {
                commands: commands_tx,
                events,
                phase,
            },
            task,
        ))
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.reset_cycle().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.on_command(command).await,
                    None => {
                        self.reset_cycle().await;
                        break;
                    }
                },
                step = self.session.next_step() => self.on_step(step).await,
                Some(report) = self.reports_rx.recv() => self.on_report(report).await,
            }
        }
        info!("Voice pipeline stopped");
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::SelectMode { id, reply } => {
                let _ = reply.send(self.select_mode(&id).await);
            }
            Command::ToggleListening { reply } => {
                let _ = reply.send(self.toggle_listening().await);
            }
            Command::CurrentMode { reply } => {
                let _ = reply.send(self.mode.clone());
            }
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn select_mode(&mut self, id: &str) -> Result<ModeDefinition, DomainError> {
        let mode = self.catalog.get(id)?.clone();

        self.armed = false;
        self.reset_cycle().await;
        self.mode = mode.clone();

        info!(mode = %mode.id, "Translation mode selected");
        self.emit(PipelineEvent::ModeSelected {
            id: mode.id.clone(),
            display_name: mode.display_name.clone(),
        });
        self.emit(PipelineEvent::status(format!("Mode: {}", mode.display_name)));
        Ok(mode)
    }

    async fn toggle_listening(&mut self) -> Result<ToggleResult, DomainError> {
        if self.session.state().is_active() {
            self.armed = false;
            self.session.stop().await;
            self.emit(PipelineEvent::ListeningStopped);
            return Ok(ToggleResult::Stopped);
        }

        if self.armed {
            // Waiting for the current cycle before listening again.
            self.armed = false;
            debug!("Continuous listening disarmed");
            return Ok(ToggleResult::Stopped);
        }

        self.start_listening().await?;
        self.armed = true;
        Ok(ToggleResult::Started)
    }

    async fn start_listening(&mut self) -> Result<(), DomainError> {
        if let Some(work) = self.in_flight {
            return Err(DomainError::Busy {
                current: work.stage,
            });
        }

        let language = self.registry.resolve(self.mode.mode.primary())?;
        let hint = language.recognition_code.clone();
        self.session.start(&hint).await?;

        self.emit(PipelineEvent::ListeningStarted {
            language_hint: hint,
        });
        self.emit(PipelineEvent::status("Listening..."));
        Ok(())
    }

    async fn on_step(&mut self, step: SessionStep) {
        match step {
            SessionStep::Partial(text) => self.emit(PipelineEvent::Partial { text }),
            SessionStep::SilenceElapsed => self.session.request_stop().await,
            SessionStep::Utterance(text) => {
                self.emit(PipelineEvent::Recognized { text: text.clone() });
                self.dispatch_translation(text);
            }
            SessionStep::Discarded { length } => {
                debug!(length, "Ignoring noise");
                self.emit(PipelineEvent::ListeningStopped);
                self.resume_listening().await;
            }
            SessionStep::Failed(kind) => {
                self.armed = false;
                self.emit(PipelineEvent::ListeningStopped);
                self.emit(PipelineEvent::failure(&DomainError::RecognitionEngine(kind)));
            }
            SessionStep::Closed => {
                self.armed = false;
                self.emit(PipelineEvent::ListeningStopped);
            }
        }
    }

    fn dispatch_translation(&mut self, text: String) {
        self.generation += 1;
        let generation = self.generation;
        self.in_flight = Some(InFlight {
            generation,
            stage: PipelinePhase::Translating,
        });
        if !self.continuous {
            self.armed = false;
        }

        self.emit(PipelineEvent::status("Translating..."));
        let request = TranslationRequest::new(text, self.mode.mode.clone(), generation);
        let coordinator = Arc::clone(&self.coordinator);
        let reports = self.reports_tx.clone();

        tokio::spawn(async move {
            let outcome = coordinator.translate(&request).await;
            if reports
                .send(WorkerReport::Translated {
                    generation,
                    outcome,
                })
                .await
                .is_err()
            {
                debug!(generation, "Pipeline gone, translation result dropped");
            }
        });
    }

    fn dispatch_speech(&mut self, generation: u64, job: SynthesisJob) {
        self.in_flight = Some(InFlight {
            generation,
            stage: PipelinePhase::Speaking,
        });
        self.emit(PipelineEvent::SpeakingStarted);

        let sequencer = Arc::clone(&self.sequencer);
        let reports = self.reports_tx.clone();

        tokio::spawn(async move {
            let result = sequencer.speak(&job).await;
            if reports
                .send(WorkerReport::Spoken { generation, result })
                .await
                .is_err()
            {
                debug!(generation, "Pipeline gone, playback result dropped");
            }
        });
    }

    async fn on_report(&mut self, report: WorkerReport) {
        let generation = match &report {
            WorkerReport::Translated { generation, .. } | WorkerReport::Spoken { generation, .. } => {
                *generation
            }
        };
        if self.in_flight.map(|w| w.generation) != Some(generation) {
            debug!(generation, current = self.generation, "Discarding stale worker result");
            return;
        }

        match report {
            WorkerReport::Translated { outcome, .. } => self.on_translated(generation, outcome).await,
            WorkerReport::Spoken { result, .. } => {
                self.in_flight = None;
                match result {
                    Ok(()) => self.emit(PipelineEvent::SpeakingFinished),
                    Err(e) => {
                        warn!(error = %e, "Speech output failed");
                        if !e.is_recoverable() {
                            self.armed = false;
                        }
                        self.emit(PipelineEvent::failure(&e));
                    }
                }
                self.resume_listening().await;
            }
        }
    }

    async fn on_translated(&mut self, generation: u64, outcome: TranslationOutcome) {
        match outcome {
            TranslationOutcome::Success {
                source_key,
                target_key,
                translated_text,
                ..
            } => {
                self.emit(PipelineEvent::Translated {
                    source: source_key.clone(),
                    target: target_key.clone(),
                    text: translated_text.clone(),
                });
                self.emit(PipelineEvent::status(format!(
                    "Translated: {source_key} → {target_key}"
                )));

                let language = self.registry.resolve_or_default(&target_key);
                let job = SynthesisJob::for_language(translated_text, language);
                self.dispatch_speech(generation, job);
            }
            TranslationOutcome::Failure { kind, message } => {
                self.in_flight = None;
                self.emit(PipelineEvent::Failure { kind, message });
                self.resume_listening().await;
            }
        }
    }

    /// Listen again after a finished cycle if the user left the toggle on.
    async fn resume_listening(&mut self) {
        if !(self.armed && self.continuous) || self.in_flight.is_some() {
            self.armed = false;
            return;
        }
        if let Err(e) = self.start_listening().await {
            warn!(error = %e, "Could not resume listening");
            self.armed = false;
            self.emit(PipelineEvent::failure(&e));
        }
    }

    /// Drop the current cycle: stop the session and orphan in-flight work.
    async fn reset_cycle(&mut self) {
        if self.session.stop().await {
            self.emit(PipelineEvent::ListeningStopped);
        }
        if let Some(work) = self.in_flight.take() {
            debug!(generation = work.generation, stage = ?work.stage, "Abandoning in-flight work");
        }
        self.generation += 1;
    }

    fn emit(&self, event: PipelineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
