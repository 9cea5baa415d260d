use aisay_core::settings::Settings;
use aisay_core::voice::mock::{MockCatalog, MockConnector, MockFrame, RecordingOutput};
use aisay_core::voice::pipeline::speak_with;
use aisay_core::SayError;
use serde_json::Value;

mod fixture;

use fixture::{init_tracing, voice};

fn settings_with_key() -> Settings {
    Settings::default().with_api_key_override(Some("test-key".to_string()))
}

#[tokio::test]
async fn test_missing_key_touches_nothing() {
    init_tracing();
    let catalog = MockCatalog::new(vec![voice("id-1", "Narrator", true)]);
    let connector = MockConnector::new(vec![MockFrame::done()]);
    let mut output = RecordingOutput::new();
    let settings = Settings::default().with_voice(Some("Narrator".to_string()));

    let err = speak_with(&settings, "Hello", &catalog, &connector, &mut output)
        .await
        .unwrap_err();

    assert!(matches!(err, SayError::Config(_)));
    assert_eq!(catalog.fetch_count(), 0);
    assert_eq!(connector.log().connects, 0);
}

#[tokio::test]
async fn test_blank_text_is_config_error() {
    let catalog = MockCatalog::new(Vec::new());
    let connector = MockConnector::new(Vec::new());
    let mut output = RecordingOutput::new();

    let err = speak_with(&settings_with_key(), " \n\t", &catalog, &connector, &mut output)
        .await
        .unwrap_err();

    assert!(matches!(err, SayError::Config(_)));
    assert_eq!(connector.log().connects, 0);
}

#[tokio::test]
async fn test_speaks_with_resolved_voice_name() {
    let catalog = MockCatalog::new(vec![
        voice("id-barbershop", "Barbershop Man", true),
        voice("id-man", "Man", true),
    ]);
    let connector = MockConnector::new(vec![
        MockFrame::chunk(&[1, 0, 2, 0], false),
        MockFrame::chunk(&[3, 0], true),
    ]);
    let mut output = RecordingOutput::new();
    let probe = output.probe();
    let settings = settings_with_key()
        .with_voice(Some("man".to_string()))
        .with_model(Some("sonic-2".to_string()));

    let report = speak_with(&settings, "  Hello world ", &catalog, &connector, &mut output)
        .await
        .unwrap();

    assert_eq!(report.chunks, 2);
    assert_eq!(probe.snapshot().writes.concat(), vec![1, 0, 2, 0, 3, 0]);

    let sent: Value = serde_json::from_str(&connector.log().sent[0]).unwrap();
    assert_eq!(sent["voice"]["id"], "id-man");
    assert_eq!(sent["model_id"], "sonic-2");
    assert_eq!(sent["transcript"], "Hello world");
}

#[tokio::test]
async fn test_default_voice_skips_catalog() {
    let catalog = MockCatalog::failing("should not be called");
    let connector = MockConnector::new(vec![MockFrame::done()]);
    let mut output = RecordingOutput::new();

    speak_with(&settings_with_key(), "Hi", &catalog, &connector, &mut output)
        .await
        .unwrap();

    assert_eq!(catalog.fetch_count(), 0);
    let sent: Value = serde_json::from_str(&connector.log().sent[0]).unwrap();
    assert_eq!(sent["voice"]["id"], "694f9389-aac1-45b6-b726-9d9369183238");
}

#[tokio::test]
async fn test_unknown_voice_never_connects() {
    let catalog = MockCatalog::new(vec![voice("id-1", "Narrator", true)]);
    let connector = MockConnector::new(vec![MockFrame::done()]);
    let mut output = RecordingOutput::new();
    let settings = settings_with_key().with_voice(Some("Pirate".to_string()));

    let err = speak_with(&settings, "Ahoy", &catalog, &connector, &mut output)
        .await
        .unwrap_err();

    assert!(matches!(err, SayError::VoiceNotFound(_)));
    assert_eq!(connector.log().connects, 0);
}
