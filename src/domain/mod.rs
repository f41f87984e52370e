pub mod config;
pub mod error;
pub mod language;
pub mod mode;
pub mod pipeline;
pub mod recognition;
pub mod synthesis;
pub mod translation;

pub use config::AppConfig;
pub use error::{DomainError, FailureKind};
pub use language::{LanguageConfig, LanguageKey, LanguageRegistry};
pub use mode::{Confidence, ModeCatalog, ModeDefinition, ModeResolver, ResolvedPair, TranslationMode};
pub use pipeline::{AtomicPipelinePhase, PhaseGuard, PipelineEvent, PipelinePhase};
pub use recognition::{EngineEvent, RecognitionErrorKind, RecognitionState};
pub use synthesis::{SynthesisJob, SynthesizedAudio};
pub use translation::{TranslationOutcome, TranslationReply, TranslationRequest};
