use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{DomainError, EngineEvent};

/// Port for a streaming speech-recognition engine.
///
/// Implementations deliver engine callbacks as a typed event stream; the core
/// never sees raw audio frames.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Open a recognition stream with the given language hint (e.g. "pt-BR").
    ///
    /// The stream ends after a `Final` or `Error` event, or when cancelled.
    async fn start(&self, language_hint: &str) -> Result<mpsc::Receiver<EngineEvent>, DomainError>;

    /// Ask the engine to finish the current utterance and emit its final result.
    async fn stop_listening(&self);

    /// Abort the current stream without a final result.
    async fn cancel(&self);

    /// Check if the engine can be used on this system.
    fn is_available(&self) -> bool {
        true
    }
}
