use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::domain::config::RecognitionConfig;
use crate::domain::{
    AtomicPipelinePhase, DomainError, EngineEvent, PhaseGuard, PipelinePhase, RecognitionErrorKind,
    RecognitionState,
};
use crate::ports::SpeechRecognizer;

/// What the session produced while it was being driven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStep {
    /// Partial transcript; the silence window was re-armed.
    Partial(String),
    /// No partial result within the silence window. The caller should ask the
    /// engine for its final result with [`RecognitionSession::request_stop`].
    SilenceElapsed,
    /// A complete utterance, trimmed. The session is back to Idle.
    Utterance(String),
    /// The final transcript was too short to be speech. Back to Idle.
    Discarded { length: usize },
    /// The engine reported an error. Back to Idle.
    Failed(RecognitionErrorKind),
    /// The engine closed its stream without a result. Back to Idle.
    Closed,
}

/// Silence endpointing deadline.
///
/// Armed for a full window on start and on every partial result. Once the
/// deadline has fired it stays disarmed until the next start.
#[derive(Debug)]
struct SilenceTimer {
    window: Duration,
    deadline: Option<Instant>,
    fired: bool,
}

impl SilenceTimer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            fired: false,
        }
    }

    fn arm(&mut self) {
        self.fired = false;
        self.deadline = Some(Instant::now() + self.window);
    }

    fn rearm(&mut self) {
        if !self.fired {
            self.deadline = Some(Instant::now() + self.window);
        }
    }

    fn fire(&mut self) {
        self.fired = true;
        self.deadline = None;
    }

    fn disarm(&mut self) {
        self.deadline = None;
    }

}

/// Resolves at `deadline`, or never when there is none.
async fn reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Silence-endpointed listening state machine around a recognition engine.
///
/// The session holds the `Listening` phase while the engine stream is open, so
/// it cannot start while a translation or playback owns the pipeline.
pub struct RecognitionSession {
    recognizer: Arc<dyn SpeechRecognizer>,
    phase: Arc<AtomicPipelinePhase>,
    min_utterance_chars: usize,
    state: RecognitionState,
    events: Option<mpsc::Receiver<EngineEvent>>,
    guard: Option<PhaseGuard>,
    timer: SilenceTimer,
    stop_grace: Duration,
    /// Set by a stop request; the engine must deliver its final result by then.
    stop_deadline: Option<Instant>,
}

impl RecognitionSession {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        phase: Arc<AtomicPipelinePhase>,
        config: &RecognitionConfig,
    ) -> Self {
        Self {
            recognizer,
            phase,
            min_utterance_chars: config.min_utterance_chars,
            state: RecognitionState::Idle,
            events: None,
            guard: None,
            timer: SilenceTimer::new(Duration::from_millis(config.silence_timeout_ms)),
            stop_grace: Duration::from_millis(config.stop_grace_ms),
            stop_deadline: None,
        }
    }

    pub fn state(&self) -> RecognitionState {
        self.state
    }

    /// Open an engine stream with `language_hint` and arm the silence timer.
    pub async fn start(&mut self, language_hint: &str) -> Result<(), DomainError> {
        if !self.state.can_start() {
            return Err(DomainError::Busy {
                current: PipelinePhase::Listening,
            });
        }
        if !self.recognizer.is_available() {
            return Err(DomainError::RecognitionEngine(RecognitionErrorKind::AudioError));
        }

        let guard = self.phase.try_enter(PipelinePhase::Listening)?;
        let events = self.recognizer.start(language_hint).await?;

        self.guard = Some(guard);
        self.events = Some(events);
        self.state = RecognitionState::Listening;
        self.timer.arm();

        info!(language_hint, "Listening started");
        Ok(())
    }

    /// Ask the engine to end the utterance and deliver its final result.
    ///
    /// An engine that stays silent past the stop grace period is cancelled and
    /// the session ends with [`SessionStep::Closed`].
    pub async fn request_stop(&mut self) {
        if self.state == RecognitionState::Listening {
            self.timer.fire();
            if self.stop_deadline.is_none() {
                self.stop_deadline = Some(Instant::now() + self.stop_grace);
            }
            self.recognizer.stop_listening().await;
        }
    }

    /// Abort the session, discarding any partial transcript.
    ///
    /// Returns false if nothing was active.
    pub async fn stop(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.recognizer.cancel().await;
        self.finish();
        info!("Listening stopped");
        true
    }

    /// Wait for the next meaningful step of the active session.
    ///
    /// Pends forever while Idle. Cancel safe: dropping the future before it
    /// completes loses no engine event.
    pub async fn next_step(&mut self) -> SessionStep {
        loop {
            let Some(events) = self.events.as_mut() else {
                return std::future::pending().await;
            };
            let deadline = self.timer.deadline;
            let stop_deadline = self.stop_deadline;

            let event = tokio::select! {
                event = events.recv() => event,
                _ = reached(deadline) => {
                    self.timer.fire();
                    debug!("Silence window elapsed, ending utterance");
                    return SessionStep::SilenceElapsed;
                }
                _ = reached(stop_deadline) => {
                    warn!("No final result after stop request, cancelling engine");
                    self.finish();
                    self.recognizer.cancel().await;
                    return SessionStep::Closed;
                }
            };

            if let Some(step) = self.on_event(event) {
                return step;
            }
        }
    }

    fn on_event(&mut self, event: Option<EngineEvent>) -> Option<SessionStep> {
        match event {
            Some(EngineEvent::ReadyForSpeech) => {
                trace!("Engine ready for speech");
                None
            }
            Some(EngineEvent::EndOfSpeech) => {
                trace!("Engine reported end of speech");
                None
            }
            Some(EngineEvent::Partial(text)) => {
                self.timer.rearm();
                Some(SessionStep::Partial(text))
            }
            Some(EngineEvent::Final(text)) => {
                self.state = RecognitionState::Finalizing;
                self.timer.disarm();

                let utterance = text.trim().to_string();
                let length = utterance.chars().count();
                self.finish();

                if length < self.min_utterance_chars {
                    debug!(length, "Final transcript too short, discarded");
                    Some(SessionStep::Discarded { length })
                } else {
                    info!(chars = length, "Utterance recognized");
                    Some(SessionStep::Utterance(utterance))
                }
            }
            Some(EngineEvent::Error(code)) => {
                let kind = RecognitionErrorKind::from_code(code);
                warn!(code, %kind, "Recognition engine error");
                self.finish();
                Some(SessionStep::Failed(kind))
            }
            None => {
                debug!("Engine stream closed without a result");
                self.finish();
                Some(SessionStep::Closed)
            }
        }
    }

    fn finish(&mut self) {
        self.timer.disarm();
        self.stop_deadline = None;
        self.events = None;
        self.guard = None;
        self.state = RecognitionState::Idle;
    }
}
