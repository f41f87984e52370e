use std::path::Path;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Port for audio output.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play an encoded audio file, resolving when playback completes.
    async fn play(&self, path: &Path) -> Result<(), DomainError>;
}
