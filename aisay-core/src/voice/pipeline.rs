//! The full speak path: resolve the voice, run one synthesis session

use super::audio::AudioOutput;
use super::catalog::cartesia::CartesiaCatalog;
use super::catalog::provider::VoiceCatalog;
use super::catalog::resolver::VoiceResolver;
use super::tts::cartesia::CartesiaConnector;
use super::tts::provider::SynthesisConnector;
use super::tts::session::{SessionReport, SynthesisSession};
use super::tts::types::SynthesisRequest;
use crate::error::{Result, SayError};
use crate::settings::Settings;

/// Speak `text` with the voice and model from `settings` against the live backend
pub async fn speak(
    settings: &Settings,
    text: &str,
    output: &mut dyn AudioOutput,
) -> Result<SessionReport> {
    settings.api_key()?;
    let catalog = CartesiaCatalog::new(settings)?;
    let connector = CartesiaConnector::new(settings)?;
    speak_with(settings, text, &catalog, &connector, output).await
}

/// Speak using the given catalog and connector. Configuration is validated
/// before either is touched.
pub async fn speak_with(
    settings: &Settings,
    text: &str,
    catalog: &dyn VoiceCatalog,
    connector: &dyn SynthesisConnector,
    output: &mut dyn AudioOutput,
) -> Result<SessionReport> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SayError::Config("no text to speak".to_string()));
    }
    settings.api_key()?;

    let voice_id = VoiceResolver::new(catalog).resolve(&settings.voice).await?;
    let request = SynthesisRequest::new(settings.model.as_str(), text, voice_id)?;

    SynthesisSession::new(connector).run(&request, output).await
}

/// Every public voice as `(id, name)`, sorted by name
pub async fn list_voices(settings: &Settings) -> Result<Vec<(String, String)>> {
    let catalog = CartesiaCatalog::new(settings)?;
    let voices = VoiceResolver::new(&catalog).list().await?;
    Ok(voices.collect())
}
