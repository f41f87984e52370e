use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use crate::adapters::ConsoleRecognizer;
use crate::app::{AppController, OrchestratorHandle, ToggleResult};
use crate::domain::{FailureKind, PipelineEvent, TranslationOutcome};

/// Continuous speech-to-speech translator.
#[derive(Debug, Parser)]
#[command(name = "voice-translator", version, about)]
pub struct Cli {
    /// Use this directory for configuration and logs instead of the OS default.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the interactive listen, translate, speak loop.
    Listen {
        /// Mode id to start in (see `modes`).
        #[arg(long)]
        mode: Option<String>,
    },
    /// Translate one text without audio.
    Translate {
        #[arg(long)]
        mode: Option<String>,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Synthesize and play one text.
    Speak {
        /// Language key, display name or alias.
        #[arg(long)]
        language: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List translation modes.
    Modes,
    /// List supported languages.
    Languages,
    /// Inspect or reset the configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print file locations.
    Path,
    /// Print the active configuration.
    Show,
    /// Overwrite the configuration file with the defaults.
    Reset,
}

/// Application paths information.
#[derive(Serialize)]
pub struct AppPaths {
    pub data_dir: String,
    pub logs_dir: String,
    pub config_path: String,
    pub allowed_domains: Vec<String>,
}

/// Run a parsed command line.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let controller =
        AppController::new(cli.data_dir).context("Failed to initialize application")?;

    match cli.command {
        Command::Listen { mode } => listen(&controller, mode.as_deref()).await,
        Command::Translate { mode, text } => translate(&controller, mode, &text.join(" ")).await,
        Command::Speak { language, text } => {
            controller.speak_once(&language, &text.join(" ")).await?;
            Ok(())
        }
        Command::Modes => {
            print_modes(&controller, None);
            Ok(())
        }
        Command::Languages => {
            for language in controller.registry().iter() {
                println!(
                    "{:<10} {:<22} listen {:<6} voice {}",
                    language.key.as_str(),
                    language.display_name,
                    language.recognition_code,
                    language.synthesis_voice_name
                );
            }
            Ok(())
        }
        Command::Config { action } => config(&controller, action),
    }
}

fn config(controller: &AppController, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let paths = AppPaths {
                data_dir: controller.data_dir(),
                logs_dir: controller.logs_dir(),
                config_path: controller.config_path(),
                allowed_domains: controller.allowed_domains(),
            };
            println!("{}", serde_json::to_string_pretty(&paths)?);
        }
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(&controller.config())?);
        }
        ConfigAction::Reset => {
            controller.reset_config()?;
            println!("Configuration reset: {}", controller.config_path());
        }
    }
    Ok(())
}

fn print_modes(controller: &AppController, current: Option<&str>) {
    for mode in controller.catalog().iter() {
        let marker = if current == Some(mode.id.as_str()) { "*" } else { " " };
        println!("{marker} {:<8} {}", mode.id, mode.display_name);
    }
}

async fn translate(controller: &AppController, mode: Option<String>, text: &str) -> Result<()> {
    let mode = mode.unwrap_or_else(|| controller.config().pipeline.default_mode);
    match controller.translate_once(&mode, text).await? {
        TranslationOutcome::Success {
            source_key,
            target_key,
            translated_text,
            confidence,
        } => {
            println!("{source_key} → {target_key} ({confidence:?})");
            println!("{translated_text}");
            Ok(())
        }
        TranslationOutcome::Failure { kind, message } => {
            anyhow::bail!("{}: {message}", describe(kind))
        }
    }
}

async fn listen(controller: &AppController, mode: Option<&str>) -> Result<()> {
    let recognizer = Arc::new(ConsoleRecognizer::new());
    let (handle, task) = controller.launch(recognizer.clone(), mode)?;

    let printer = tokio::spawn(print_events(handle.subscribe()));
    let current = handle.current_mode().await?;
    println!("Mode: {} ({})", current.display_name, current.id);
    println!("Enter: start/stop listening   /mode ID   /modes   /quit");

    let result = input_loop(controller, &handle, &recognizer).await;

    handle.shutdown().await;
    let _ = task.await;
    printer.abort();
    result
}

async fn input_loop(
    controller: &AppController,
    handle: &OrchestratorHandle,
    recognizer: &ConsoleRecognizer,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => return Ok(()),
        };
        let Some(line) = line else {
            return Ok(());
        };

        match parse_input(&line) {
            InputLine::Quit => return Ok(()),
            InputLine::Modes => {
                let current = handle.current_mode().await?;
                print_modes(controller, Some(current.id.as_str()));
            }
            InputLine::SelectMode(id) => {
                if let Err(e) = handle.select_mode(id).await {
                    println!("{e}");
                }
            }
            InputLine::Toggle => match handle.toggle_listening().await {
                Ok(ToggleResult::Started) => {}
                Ok(ToggleResult::Stopped) => println!("Stopped."),
                Err(e) => println!("{e}"),
            },
            InputLine::Unknown(command) => println!("Unknown command: {command}"),
            InputLine::Speech(text) => {
                if !recognizer.feed_line(text) {
                    println!("Not listening. Press Enter to start.");
                }
            }
        }
    }
}

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum InputLine<'a> {
    Quit,
    Modes,
    SelectMode(&'a str),
    Toggle,
    Unknown(&'a str),
    Speech(&'a str),
}

fn parse_input(line: &str) -> InputLine<'_> {
    let input = line.trim();
    if input.is_empty() {
        return InputLine::Toggle;
    }
    if !input.starts_with('/') {
        return InputLine::Speech(input);
    }

    let mut words = input.split_whitespace();
    let command = words.next().unwrap_or_default();
    match (command, words.next()) {
        ("/quit", None) => InputLine::Quit,
        ("/modes", None) => InputLine::Modes,
        ("/mode", Some(id)) => InputLine::SelectMode(id),
        _ => InputLine::Unknown(command),
    }
}

async fn print_events(mut events: broadcast::Receiver<PipelineEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = render(&event) {
                    println!("{line}");
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// One status line per user-visible event.
fn render(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::ListeningStarted { language_hint } => {
            Some(format!("Listening ({language_hint}): type, then pause to translate. Enter cancels."))
        }
        PipelineEvent::Partial { text } => Some(format!("  … {text}")),
        PipelineEvent::Recognized { text } => Some(format!("Heard: {text}")),
        PipelineEvent::Translated {
            source,
            target,
            text,
        } => Some(format!("Translated: {source} → {target}\n  {text}")),
        PipelineEvent::SpeakingStarted => Some("Speaking...".to_string()),
        PipelineEvent::Failure { kind, message } => Some(format!("{}: {message}", describe(*kind))),
        PipelineEvent::ModeSelected { display_name, .. } => Some(format!("Mode: {display_name}")),
        PipelineEvent::Status { .. }
        | PipelineEvent::ListeningStopped
        | PipelineEvent::SpeakingFinished => None,
    }
}

fn describe(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Busy => "Busy",
        FailureKind::NetworkUnavailable => "No internet connection",
        FailureKind::EmptyOrTooShortUtterance => "Nothing to translate",
        FailureKind::RecognitionEngine => "Recognition failed",
        FailureKind::ParseError => "Could not read translation",
        FailureKind::UnprocessableTranslation => "Translation unusable",
        FailureKind::QuotaExceeded => "Too many requests",
        FailureKind::TranslationService => "Translation failed",
        FailureKind::SynthesisError => "Speech synthesis failed",
        FailureKind::Playback => "Playback failed",
        FailureKind::UnknownLanguage => "Unknown language",
        FailureKind::Internal => "Error",
    }
}
