pub mod controller;
pub mod coordinator;
pub mod orchestrator;
pub mod sequencer;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::AppController;
pub use coordinator::TranslationCoordinator;
pub use orchestrator::{Orchestrator, OrchestratorHandle, PipelineServices, ToggleResult};
pub use sequencer::SynthesisSequencer;
pub use session::{RecognitionSession, SessionStep};
