pub mod audio_sink;
pub mod config;
pub mod connectivity;
pub mod generator;
pub mod http;
pub mod recognizer;
pub mod synthesizer;

pub use audio_sink::AudioSink;
pub use config::ConfigStore;
pub use connectivity::ConnectivityCheck;
pub use generator::TextGenerator;
pub use http::{HttpClient, HttpResponse};
pub use recognizer::SpeechRecognizer;
pub use synthesizer::SpeechSynthesizer;
