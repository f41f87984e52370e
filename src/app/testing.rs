//! In-memory port fakes shared by the app-layer unit tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use crate::domain::{DomainError, EngineEvent, SynthesisJob, SynthesizedAudio};
use crate::ports::{AudioSink, ConnectivityCheck, SpeechRecognizer, SpeechSynthesizer, TextGenerator};

/// Recognizer driven by the test through [`ScriptedRecognizer::emit`].
#[derive(Default)]
pub struct ScriptedRecognizer {
    sender: Mutex<Option<mpsc::Sender<EngineEvent>>>,
    final_on_stop: Option<String>,
    hints: Mutex<Vec<String>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    cancels: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every stop request with this final transcript.
    pub fn with_final_on_stop(mut self, text: &str) -> Self {
        self.final_on_stop = Some(text.to_string());
        self
    }

    pub fn emit(&self, event: EngineEvent) {
        if let Some(sender) = self.sender.lock().as_ref() {
            sender.try_send(event).unwrap();
        }
    }

    pub fn close(&self) {
        self.sender.lock().take();
    }

    pub fn hints(&self) -> Vec<String> {
        self.hints.lock().clone()
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start(&self, language_hint: &str) -> Result<mpsc::Receiver<EngineEvent>, DomainError> {
        let (sender, receiver) = mpsc::channel(32);
        *self.sender.lock() = Some(sender);
        self.hints.lock().push(language_hint.to_string());
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(receiver)
    }

    async fn stop_listening(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(text) = &self.final_on_stop {
            self.emit(EngineEvent::Final(text.clone()));
        }
    }

    async fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.close();
    }
}

/// Generator returning a canned reply, optionally held until released.
pub struct StubGenerator {
    reply: Result<String, DomainError>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: DomainError) -> Self {
        Self {
            reply: Err(err),
            ..Self::replying("")
        }
    }

    /// Hold every call until the returned gate is notified.
    pub fn gated(reply: &str) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let generator = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::replying(reply)
        };
        (generator, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.reply.clone()
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Connectivity check with a fixed answer.
pub struct StubConnectivity(pub AtomicBool);

impl StubConnectivity {
    pub fn online() -> Self {
        Self(AtomicBool::new(true))
    }

    pub fn offline() -> Self {
        Self(AtomicBool::new(false))
    }
}

#[async_trait]
impl ConnectivityCheck for StubConnectivity {
    async fn is_network_available(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Synthesizer returning fixed bytes and recording the jobs it served.
pub struct StubSynthesizer {
    failure: Option<DomainError>,
    jobs: Mutex<Vec<SynthesisJob>>,
}

impl StubSynthesizer {
    pub fn new() -> Self {
        Self {
            failure: None,
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: DomainError) -> Self {
        Self {
            failure: Some(err),
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn jobs(&self) -> Vec<SynthesisJob> {
        self.jobs.lock().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for StubSynthesizer {
    async fn synthesize(&self, job: &SynthesisJob) -> Result<SynthesizedAudio, DomainError> {
        self.jobs.lock().push(job.clone());
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(SynthesizedAudio::new(b"ID3fake".to_vec(), "mp3")),
        }
    }
}

/// Sink recording which files it was asked to play and whether they existed.
#[derive(Default)]
pub struct RecordingSink {
    fail: bool,
    gate: Option<Arc<Notify>>,
    played: Mutex<Vec<(PathBuf, bool)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Hold every playback until the returned gate is notified.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let sink = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (sink, gate)
    }

    pub fn played(&self) -> Vec<(PathBuf, bool)> {
        self.played.lock().clone()
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, path: &Path) -> Result<(), DomainError> {
        self.played.lock().push((path.to_path_buf(), path.exists()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(DomainError::Playback("device lost".to_string()));
        }
        Ok(())
    }
}
