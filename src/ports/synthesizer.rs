use async_trait::async_trait;

use crate::domain::{DomainError, SynthesisJob, SynthesizedAudio};

/// Port for the speech-synthesis service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Turn text into encoded audio in the requested voice.
    async fn synthesize(&self, job: &SynthesisJob) -> Result<SynthesizedAudio, DomainError>;
}
