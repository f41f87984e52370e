use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::DomainError;
use crate::ports::AudioSink;

/// Audio sink that hands the file to an external player and waits for it to exit.
pub struct CommandAudioSink {
    program: String,
    args: Vec<String>,
}

impl CommandAudioSink {
    /// Build from a command line such as `["ffplay", "-nodisp", "-autoexit"]`.
    /// The audio file path is appended as the last argument.
    pub fn new(command: &[String]) -> Result<Self, DomainError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| DomainError::Config("playback.player_command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl AudioSink for CommandAudioSink {
    async fn play(&self, path: &Path) -> Result<(), DomainError> {
        debug!(player = %self.program, path = ?path, "Starting playback");

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| DomainError::Playback(format!("Failed to run {}: {}", self.program, e)))?;

        if !status.success() {
            warn!(player = %self.program, ?status, "Player exited with failure");
            return Err(DomainError::Playback(format!("{} exited with {}", self.program, status)));
        }

        debug!("Playback completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(CommandAudioSink::new(&[]), Err(DomainError::Config(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_player_completes() {
        let sink = CommandAudioSink::new(&["true".to_string()]).unwrap();
        assert!(sink.play(Path::new("/dev/null")).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_player_is_playback_error() {
        let sink = CommandAudioSink::new(&["false".to_string()]).unwrap();
        assert!(matches!(
            sink.play(Path::new("/dev/null")).await,
            Err(DomainError::Playback(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_player_is_playback_error() {
        let sink = CommandAudioSink::new(&["definitely-not-a-player-binary".to_string()]).unwrap();
        assert!(matches!(
            sink.play(Path::new("clip.mp3")).await,
            Err(DomainError::Playback(_))
        ));
    }
}
