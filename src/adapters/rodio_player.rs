use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::DomainError;
use crate::ports::AudioSink;

/// In-process audio sink decoding and playing the file on the default output device.
#[derive(Debug, Default)]
pub struct RodioAudioSink;

impl RodioAudioSink {
    pub fn new() -> Self {
        Self
    }

    fn play_blocking(path: PathBuf) -> Result<(), DomainError> {
        let stream = rodio::OutputStreamBuilder::open_default_stream()
            .map_err(|e| DomainError::Playback(format!("Audio output unavailable: {e}")))?;
        let sink = rodio::Sink::connect_new(stream.mixer());

        let file = File::open(&path)?;
        let source = rodio::Decoder::new(BufReader::new(file))
            .map_err(|e| DomainError::Playback(format!("Cannot decode audio: {e}")))?;

        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

#[async_trait]
impl AudioSink for RodioAudioSink {
    async fn play(&self, path: &Path) -> Result<(), DomainError> {
        debug!(path = ?path, "Starting in-process playback");
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::play_blocking(path))
            .await
            .map_err(|e| DomainError::Playback(format!("Playback task failed: {e}")))?
    }
}
