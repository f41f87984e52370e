#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, Notify};

use voice_translator_lib::adapters::HttpGateway;
use voice_translator_lib::domain::config::NetworkConfig;
use voice_translator_lib::domain::{DomainError, EngineEvent, PipelineEvent};
use voice_translator_lib::ports::{AudioSink, ConnectivityCheck, HttpClient, SpeechRecognizer, TextGenerator};

/// Gateway that may only talk to a local mock server.
pub fn local_gateway() -> Arc<dyn HttpClient> {
    let config = NetworkConfig {
        allowed_domains: vec!["127.0.0.1".to_string()],
        ..NetworkConfig::default()
    };
    Arc::new(HttpGateway::new(&config).unwrap())
}

#[derive(Default)]
pub struct FakeRecognizer {
    sender: Mutex<Option<mpsc::Sender<EngineEvent>>>,
    pub starts: AtomicUsize,
}

impl FakeRecognizer {
    pub fn say(&self, text: &str) {
        let guard = self.sender.lock();
        let sender = guard.as_ref().expect("recognizer not started");
        sender.try_send(EngineEvent::Partial(text.to_string())).unwrap();
        sender.try_send(EngineEvent::Final(text.to_string())).unwrap();
    }
}

#[async_trait]
impl SpeechRecognizer for FakeRecognizer {
    async fn start(&self, _language_hint: &str) -> Result<mpsc::Receiver<EngineEvent>, DomainError> {
        let (sender, receiver) = mpsc::channel(8);
        *self.sender.lock() = Some(sender);
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(receiver)
    }

    async fn stop_listening(&self) {}

    async fn cancel(&self) {
        self.sender.lock().take();
    }
}

pub struct FixedConnectivity(pub bool);

#[async_trait]
impl ConnectivityCheck for FixedConnectivity {
    async fn is_network_available(&self) -> bool {
        self.0
    }
}

/// Generator counting calls, holding each call until released.
pub struct HeldGenerator {
    pub reply: String,
    pub calls: AtomicUsize,
    pub release: Notify,
}

impl HeldGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            release: Notify::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for HeldGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "held"
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub played: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, path: &Path) -> Result<(), DomainError> {
        let bytes = tokio::fs::read(path).await?;
        self.played.lock().push((path.to_path_buf(), bytes));
        Ok(())
    }
}

/// Wait for the first event matching `pred`, failing after five seconds.
pub async fn wait_for<F>(events: &mut broadcast::Receiver<PipelineEvent>, pred: F) -> PipelineEvent
where
    F: Fn(&PipelineEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for pipeline event")
}
