mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voice_translator_lib::adapters::{CloudTtsSynthesizer, GeminiGenerator};
use voice_translator_lib::app::{Orchestrator, PipelineServices, ToggleResult, TranslationCoordinator};
use voice_translator_lib::domain::{
    AppConfig, AtomicPipelinePhase, FailureKind, LanguageKey, LanguageRegistry, ModeCatalog,
    ModeDefinition, PipelineEvent, PipelinePhase, TranslationMode, TranslationRequest,
};

use common::{local_gateway, wait_for, FakeRecognizer, FixedConnectivity, HeldGenerator, RecordingSink};

fn mode(id: &str) -> TranslationMode {
    ModeDefinition::builtin()
        .into_iter()
        .find(|m| m.id == id)
        .unwrap()
        .mode
}

#[tokio::test]
async fn test_auto_detect_cycle_over_http_speaks_alternate() {
    std::env::set_var("VT_CYCLE_TTS_TOKEN", "cycle-token");
    let server = MockServer::start().await;

    let reply = r#"{"source_language_name":"Português","target_language_name":"Inglês","translated_text":"Good morning, everyone"}"#;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": reply }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .and(body_string_contains("en-US-Standard-C"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "audioContent": "SUQzBA==" })))
        .expect(1)
        .mount(&server)
        .await;

    let scratch = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.pipeline.continuous = false;
    config.playback.scratch_dir = Some(scratch.path().to_path_buf());
    config.translation.endpoint = format!("{}/v1beta", server.uri());
    config.translation.api_key_env = "VT_CYCLE_GEMINI_KEY".to_string();
    config.synthesis.endpoint = format!("{}/v1/text:synthesize", server.uri());
    config.synthesis.access_token_env = "VT_CYCLE_TTS_TOKEN".to_string();

    let http = local_gateway();
    let recognizer = Arc::new(FakeRecognizer::default());
    let sink = Arc::new(RecordingSink::default());
    let services = PipelineServices {
        recognizer: recognizer.clone(),
        generator: Arc::new(GeminiGenerator::with_api_key(
            config.translation.clone(),
            Arc::clone(&http),
            "cycle-key".to_string(),
        )),
        connectivity: Arc::new(FixedConnectivity(true)),
        synthesizer: Arc::new(CloudTtsSynthesizer::new(config.synthesis.clone(), http)),
        sink: sink.clone(),
    };

    let registry = Arc::new(LanguageRegistry::builtin());
    let catalog = Arc::new(ModeCatalog::new(config.modes.clone(), &registry).unwrap());
    let (handle, task) = Orchestrator::spawn(services, registry, catalog, &config, "auto-pt").unwrap();
    let mut events = handle.subscribe();

    assert_eq!(handle.toggle_listening().await.unwrap(), ToggleResult::Started);
    recognizer.say("Bom dia a todos");

    let translated = wait_for(&mut events, |e| matches!(e, PipelineEvent::Translated { .. })).await;
    assert_eq!(
        translated,
        PipelineEvent::Translated {
            source: LanguageKey::from("Português"),
            target: LanguageKey::from("Inglês"),
            text: "Good morning, everyone".to_string(),
        }
    );
    wait_for(&mut events, |e| *e == PipelineEvent::SpeakingFinished).await;

    let played = sink.played.lock().clone();
    assert_eq!(played.len(), 1);
    assert_eq!(played[0].1, b"ID3\x04".to_vec());
    assert!(!played[0].0.exists());
    assert_eq!(handle.phase(), PipelinePhase::Idle);
    assert_eq!(recognizer.starts.load(Ordering::SeqCst), 1);

    handle.shutdown().await;
    task.await.unwrap();
}

#[tokio::test]
async fn test_quota_failure_surfaces_and_pipeline_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("RESOURCE_EXHAUSTED"))
        .mount(&server)
        .await;

    let mut config = AppConfig::default();
    config.pipeline.continuous = false;
    config.translation.endpoint = format!("{}/v1beta", server.uri());

    let http = local_gateway();
    let recognizer = Arc::new(FakeRecognizer::default());
    let services = PipelineServices {
        recognizer: recognizer.clone(),
        generator: Arc::new(GeminiGenerator::with_api_key(
            config.translation.clone(),
            Arc::clone(&http),
            "k".to_string(),
        )),
        connectivity: Arc::new(FixedConnectivity(true)),
        synthesizer: Arc::new(CloudTtsSynthesizer::new(config.synthesis.clone(), http)),
        sink: Arc::new(RecordingSink::default()),
    };
    let registry = Arc::new(LanguageRegistry::builtin());
    let catalog = Arc::new(ModeCatalog::new(config.modes.clone(), &registry).unwrap());
    let (handle, _task) = Orchestrator::spawn(services, registry, catalog, &config, "pt-en").unwrap();
    let mut events = handle.subscribe();

    handle.toggle_listening().await.unwrap();
    recognizer.say("Good evening");

    match wait_for(&mut events, |e| matches!(e, PipelineEvent::Failure { .. })).await {
        PipelineEvent::Failure { kind, message } => {
            assert_eq!(kind, FailureKind::QuotaExceeded);
            assert!(message.contains("wait a minute"));
        }
        other => panic!("unexpected: {other:?}"),
    }

    assert_eq!(handle.toggle_listening().await.unwrap(), ToggleResult::Started);
    assert_eq!(recognizer.starts.load(Ordering::SeqCst), 2);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_second_translate_while_first_in_flight_is_busy() {
    let generator = Arc::new(HeldGenerator::new(
        r#"{"source_language_name":"Espanhol","translated_text":"Olá"}"#,
    ));
    let coordinator = Arc::new(TranslationCoordinator::new(
        generator.clone(),
        Arc::new(FixedConnectivity(true)),
        Arc::new(LanguageRegistry::builtin()),
        Arc::new(AtomicPipelinePhase::default()),
        2,
    ));

    let first = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move {
            coordinator
                .translate(&TranslationRequest::new("Hola", mode("pt-es"), 1))
                .await
        }
    });
    while generator.calls() == 0 {
        tokio::task::yield_now().await;
    }

    let second = coordinator
        .translate(&TranslationRequest::new("Hola otra vez", mode("pt-es"), 2))
        .await;
    assert_eq!(second.failure_kind(), Some(FailureKind::Busy));

    generator.release.notify_one();
    assert!(first.await.unwrap().is_success());
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_offline_translate_makes_no_service_call() {
    let generator = Arc::new(HeldGenerator::new("{}"));
    let coordinator = TranslationCoordinator::new(
        generator.clone(),
        Arc::new(FixedConnectivity(false)),
        Arc::new(LanguageRegistry::builtin()),
        Arc::new(AtomicPipelinePhase::default()),
        2,
    );

    let outcome = coordinator
        .translate(&TranslationRequest::new("Bom dia", mode("auto-pt"), 1))
        .await;
    assert_eq!(outcome.failure_kind(), Some(FailureKind::NetworkUnavailable));
    assert_eq!(generator.calls(), 0);
}
