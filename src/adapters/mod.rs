pub mod cloud_tts;
pub mod command_player;
pub mod config_store;
pub mod connectivity_probe;
pub mod console_recognizer;
pub mod gemini;
pub mod http_gateway;
#[cfg(feature = "rodio-playback")]
pub mod rodio_player;

pub use cloud_tts::CloudTtsSynthesizer;
pub use command_player::CommandAudioSink;
pub use config_store::TomlConfigStore;
pub use connectivity_probe::HttpConnectivityProbe;
pub use console_recognizer::ConsoleRecognizer;
pub use gemini::GeminiGenerator;
pub use http_gateway::HttpGateway;
#[cfg(feature = "rodio-playback")]
pub use rodio_player::RodioAudioSink;
