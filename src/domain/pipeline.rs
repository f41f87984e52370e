use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::error::{DomainError, FailureKind};
use crate::domain::language::LanguageKey;

/// Pipeline phase state machine.
///
/// State transitions:
/// - Idle -> Listening (recognition session started)
/// - Idle -> Translating (utterance handed to the coordinator)
/// - Idle -> Speaking (translation handed to the sequencer)
/// - Listening | Translating | Speaking -> Idle (phase guard dropped)
///
/// Every busy phase is entered from Idle only, so at most one of them is
/// active for a given orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PipelinePhase {
    /// Nothing running; a new session may start.
    Idle = 0,
    /// The recognition engine is capturing an utterance.
    Listening = 1,
    /// A translation request is in flight.
    Translating = 2,
    /// Synthesized audio is being fetched or played.
    Speaking = 3,
}

impl PipelinePhase {
    /// Check if a new phase can be entered from this one.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, PipelinePhase::Idle)
    }
}

impl From<u8> for PipelinePhase {
    fn from(value: u8) -> Self {
        match value {
            1 => PipelinePhase::Listening,
            2 => PipelinePhase::Translating,
            3 => PipelinePhase::Speaking,
            _ => PipelinePhase::Idle,
        }
    }
}

impl From<PipelinePhase> for u8 {
    fn from(phase: PipelinePhase) -> Self {
        phase as u8
    }
}

/// Atomic wrapper for PipelinePhase for lock-free reads.
#[derive(Debug)]
pub struct AtomicPipelinePhase(AtomicU8);

impl AtomicPipelinePhase {
    pub fn new(phase: PipelinePhase) -> Self {
        Self(AtomicU8::new(phase.into()))
    }

    pub fn load(&self) -> PipelinePhase {
        self.0.load(Ordering::Acquire).into()
    }

    /// Compare and swap, returns true if successful.
    pub fn compare_exchange(&self, current: PipelinePhase, new: PipelinePhase) -> bool {
        self.0
            .compare_exchange(current.into(), new.into(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Enter `phase` from Idle, or fail with `Busy` naming the phase in the way.
    ///
    /// The returned guard puts the cell back to Idle when dropped, whatever
    /// path the holder exits through.
    pub fn try_enter(self: &Arc<Self>, phase: PipelinePhase) -> Result<PhaseGuard, DomainError> {
        if self.compare_exchange(PipelinePhase::Idle, phase) {
            trace!(?phase, "Pipeline phase entered");
            Ok(PhaseGuard {
                cell: Arc::clone(self),
                phase,
            })
        } else {
            Err(DomainError::Busy {
                current: self.load(),
            })
        }
    }
}

impl Default for AtomicPipelinePhase {
    fn default() -> Self {
        Self::new(PipelinePhase::Idle)
    }
}

/// Scoped ownership of a busy phase.
#[derive(Debug)]
pub struct PhaseGuard {
    cell: Arc<AtomicPipelinePhase>,
    phase: PipelinePhase,
}

impl PhaseGuard {
    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        if self.cell.compare_exchange(self.phase, PipelinePhase::Idle) {
            trace!(phase = ?self.phase, "Pipeline phase released");
        }
    }
}

/// Events emitted by the orchestrator for UI/CLI consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// A mode was selected.
    ModeSelected { id: String, display_name: String },
    /// The recognition session started listening.
    ListeningStarted { language_hint: String },
    /// The recognition session returned to Idle without an utterance.
    ListeningStopped,
    /// Partial transcript (not final).
    Partial { text: String },
    /// A complete utterance was recognized and handed to translation.
    Recognized { text: String },
    /// Translation finished.
    Translated {
        source: LanguageKey,
        target: LanguageKey,
        text: String,
    },
    /// Playback of the translation started.
    SpeakingStarted,
    /// Playback finished; the pipeline is idle again.
    SpeakingFinished,
    /// Human-readable status line.
    Status { message: String },
    /// A recoverable failure.
    Failure { kind: FailureKind, message: String },
}

impl PipelineEvent {
    pub fn status(message: impl Into<String>) -> Self {
        PipelineEvent::Status {
            message: message.into(),
        }
    }

    pub fn failure(err: &DomainError) -> Self {
        PipelineEvent::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_roundtrip() {
        for phase in [
            PipelinePhase::Idle,
            PipelinePhase::Listening,
            PipelinePhase::Translating,
            PipelinePhase::Speaking,
        ] {
            let value: u8 = phase.into();
            let recovered: PipelinePhase = value.into();
            assert_eq!(phase, recovered);
        }
    }

    #[test]
    fn test_try_enter_is_exclusive() {
        let cell = Arc::new(AtomicPipelinePhase::default());
        let guard = cell.try_enter(PipelinePhase::Translating).unwrap();
        assert_eq!(cell.load(), PipelinePhase::Translating);

        let err = cell.try_enter(PipelinePhase::Listening).unwrap_err();
        assert_eq!(
            err,
            DomainError::Busy {
                current: PipelinePhase::Translating
            }
        );

        drop(guard);
        assert_eq!(cell.load(), PipelinePhase::Idle);
        assert!(cell.try_enter(PipelinePhase::Listening).is_ok());
    }

    #[test]
    fn test_guard_releases_on_early_return() {
        fn failing_step(cell: &Arc<AtomicPipelinePhase>) -> Result<(), DomainError> {
            let _guard = cell.try_enter(PipelinePhase::Speaking)?;
            Err(DomainError::Synthesis("boom".to_string()))
        }

        let cell = Arc::new(AtomicPipelinePhase::default());
        assert!(failing_step(&cell).is_err());
        assert_eq!(cell.load(), PipelinePhase::Idle);
    }

    #[test]
    fn test_atomic_phase_cas() {
        let atomic = AtomicPipelinePhase::new(PipelinePhase::Idle);
        assert!(atomic.compare_exchange(PipelinePhase::Idle, PipelinePhase::Speaking));
        assert!(!atomic.compare_exchange(PipelinePhase::Idle, PipelinePhase::Listening));
        assert_eq!(atomic.load(), PipelinePhase::Speaking);
    }
}
