use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{AtomicPipelinePhase, DomainError, PipelinePhase, SynthesisJob};
use crate::ports::{AudioSink, SpeechSynthesizer};

/// Fetches synthesized speech and plays it, holding the `Speaking` phase
/// from the synthesis request until playback ends.
pub struct SynthesisSequencer {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    phase: Arc<AtomicPipelinePhase>,
    scratch_dir: PathBuf,
    clips: AtomicU64,
}

impl SynthesisSequencer {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        sink: Arc<dyn AudioSink>,
        phase: Arc<AtomicPipelinePhase>,
        scratch_dir: PathBuf,
    ) -> Self {
        Self {
            synthesizer,
            sink,
            phase,
            scratch_dir,
            clips: AtomicU64::new(0),
        }
    }

    pub async fn speak(&self, job: &SynthesisJob) -> Result<(), DomainError> {
        let _guard = self.phase.try_enter(PipelinePhase::Speaking)?;

        let audio = self.synthesizer.synthesize(job).await.map_err(|e| match e {
            DomainError::Synthesis(_) | DomainError::Credential(_) => e,
            other => DomainError::Synthesis(other.to_string()),
        })?;
        if audio.is_empty() {
            return Err(DomainError::Synthesis("service returned no audio".to_string()));
        }

        let clip = self.clips.fetch_add(1, Ordering::Relaxed);
        let path = self.scratch_dir.join(format!(
            "speech-{}-{clip}.{}",
            std::process::id(),
            audio.extension()
        ));

        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| DomainError::Playback(format!("Cannot create scratch dir: {e}")))?;
        write_scratch(&path, audio.bytes()).await?;
        let bytes = audio.len();
        drop(audio);

        debug!(path = ?path, voice = %job.voice_name, bytes, "Playing synthesized speech");
        let played = self.sink.play(&path).await.map_err(|e| match e {
            DomainError::Playback(_) => e,
            other => DomainError::Playback(other.to_string()),
        });

        remove_scratch(&path).await;

        if played.is_ok() {
            info!(language = %job.language_code, "Speech played");
        }
        played
    }
}

/// Write a scratch clip; a failed write leaves no partial file behind.
async fn write_scratch(path: &Path, bytes: &[u8]) -> Result<(), DomainError> {
    if let Err(e) = tokio::fs::write(path, bytes).await {
        remove_scratch(path).await;
        return Err(DomainError::Playback(format!("Cannot write audio file: {e}")));
    }
    Ok(())
}

async fn remove_scratch(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = ?path, error = %e, "Failed to remove scratch audio file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{RecordingSink, StubSynthesizer};
    use crate::domain::FailureKind;

    fn job() -> SynthesisJob {
        SynthesisJob::new("Hola", "es-ES", "es-ES-Neural2-F")
    }

    fn sequencer(
        synthesizer: StubSynthesizer,
        sink: &Arc<RecordingSink>,
        dir: &std::path::Path,
    ) -> (SynthesisSequencer, Arc<AtomicPipelinePhase>) {
        let phase = Arc::new(AtomicPipelinePhase::default());
        let sequencer = SynthesisSequencer::new(
            Arc::new(synthesizer),
            sink.clone(),
            Arc::clone(&phase),
            dir.to_path_buf(),
        );
        (sequencer, phase)
    }

    #[tokio::test]
    async fn test_speak_plays_and_removes_scratch_file() {
        let temp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let (sequencer, phase) = sequencer(StubSynthesizer::new(), &sink, temp.path());

        sequencer.speak(&job()).await.unwrap();

        let played = sink.played();
        assert_eq!(played.len(), 1);
        let (path, existed) = &played[0];
        assert!(*existed);
        assert_eq!(path.extension().unwrap(), "mp3");
        assert!(!path.exists());
        assert_eq!(phase.load(), PipelinePhase::Idle);
    }

    #[tokio::test]
    async fn test_busy_pipeline_rejects_speak() {
        let temp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let (sequencer, phase) = sequencer(StubSynthesizer::new(), &sink, temp.path());
        let _listening = phase.try_enter(PipelinePhase::Listening).unwrap();

        let err = sequencer.speak(&job()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Busy);
        assert!(sink.played().is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_failure_releases_phase() {
        let temp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let synthesizer = StubSynthesizer::failing(DomainError::HttpRequest("reset".to_string()));
        let (sequencer, phase) = sequencer(synthesizer, &sink, temp.path());

        let err = sequencer.speak(&job()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::SynthesisError);
        assert!(sink.played().is_empty());
        assert_eq!(phase.load(), PipelinePhase::Idle);
    }

    #[tokio::test]
    async fn test_playback_failure_still_cleans_up() {
        let temp = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::failing());
        let (sequencer, phase) = sequencer(StubSynthesizer::new(), &sink, temp.path());

        let err = sequencer.speak(&job()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Playback);
        assert!(!sink.played()[0].0.exists());
        assert_eq!(phase.load(), PipelinePhase::Idle);
    }

    #[tokio::test]
    async fn test_failed_scratch_write_leaves_no_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing").join("speech.mp3");

        let err = write_scratch(&path, b"ID3").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Playback);
        assert!(!path.exists());
    }
}
