use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::{DomainError, EngineEvent, RecognitionErrorKind};
use crate::ports::SpeechRecognizer;

/// Channel capacity for engine events.
const EVENT_CAPACITY: usize = 32;

/// Text-driven recognition engine for terminal use.
///
/// While a stream is open, every line fed through [`ConsoleRecognizer::feed_line`]
/// extends the transcript and is reported as a partial result. `stop_listening`
/// turns the accumulated transcript into the final result; an empty transcript
/// ends the stream with a no-match error, as a microphone engine would.
#[derive(Default)]
pub struct ConsoleRecognizer {
    stream: Mutex<Option<OpenStream>>,
}

struct OpenStream {
    sender: mpsc::Sender<EngineEvent>,
    transcript: String,
}

impl ConsoleRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a recognition stream is currently open.
    pub fn is_listening(&self) -> bool {
        self.stream.lock().is_some()
    }

    /// Feed one typed line. Returns false if no stream is open.
    pub fn feed_line(&self, line: &str) -> bool {
        let line = line.trim();
        let mut guard = self.stream.lock();
        let Some(stream) = guard.as_mut() else {
            return false;
        };
        if line.is_empty() {
            return true;
        }

        if !stream.transcript.is_empty() {
            stream.transcript.push(' ');
        }
        stream.transcript.push_str(line);

        if let Err(e) = stream.sender.try_send(EngineEvent::Partial(stream.transcript.clone())) {
            warn!(error = %e, "Dropping partial result");
        }
        true
    }
}

#[async_trait]
impl SpeechRecognizer for ConsoleRecognizer {
    async fn start(&self, language_hint: &str) -> Result<mpsc::Receiver<EngineEvent>, DomainError> {
        let (sender, receiver) = mpsc::channel(EVENT_CAPACITY);
        // Fresh channel with spare capacity.
        let _ = sender.try_send(EngineEvent::ReadyForSpeech);

        let previous = self.stream.lock().replace(OpenStream {
            sender,
            transcript: String::new(),
        });
        if previous.is_some() {
            debug!("Replacing an open console recognition stream");
        }

        debug!(language_hint, "Console recognizer listening");
        Ok(receiver)
    }

    async fn stop_listening(&self) {
        let Some(stream) = self.stream.lock().take() else {
            return;
        };

        let _ = stream.sender.try_send(EngineEvent::EndOfSpeech);
        let event = if stream.transcript.is_empty() {
            EngineEvent::Error(RecognitionErrorKind::CODE_NO_MATCH)
        } else {
            EngineEvent::Final(stream.transcript)
        };
        if let Err(e) = stream.sender.try_send(event) {
            warn!(error = %e, "Could not deliver final recognition result");
        }
    }

    async fn cancel(&self) {
        if self.stream.lock().take().is_some() {
            debug!("Console recognition stream cancelled");
        }
    }
}
