use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, SayError};
use crate::voice::audio::AudioProfile;

pub const SAMPLE_RATE: u32 = 44_100;
pub const LANGUAGE: &str = "en";

const FALLBACK_ERROR: &str = "unknown synthesis error";

/// Raw mono signed 16-bit little-endian PCM at 44.1 kHz
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFormat {
    container: &'static str,
    encoding: &'static str,
    sample_rate: u32,
}

impl OutputFormat {
    pub fn pcm_s16le() -> Self {
        Self {
            container: "raw",
            encoding: "pcm_s16le",
            sample_rate: SAMPLE_RATE,
        }
    }

    pub fn profile(&self) -> AudioProfile {
        AudioProfile {
            sample_rate: self.sample_rate,
            channels: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct VoiceSpec {
    mode: &'static str,
    id: String,
}

/// The single request sent at the start of a synthesis session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisRequest {
    model_id: String,
    transcript: String,
    voice: VoiceSpec,
    language: &'static str,
    context_id: String,
    output_format: OutputFormat,
}

impl SynthesisRequest {
    /// Build a request with a fresh context ID. Fails if the transcript is blank.
    pub fn new(
        model_id: impl Into<String>,
        transcript: impl Into<String>,
        voice_id: impl Into<String>,
    ) -> Result<Self> {
        let transcript = transcript.into();
        if transcript.trim().is_empty() {
            return Err(SayError::Config("no text to speak".to_string()));
        }

        Ok(Self {
            model_id: model_id.into(),
            transcript,
            voice: VoiceSpec {
                mode: "id",
                id: voice_id.into(),
            },
            language: LANGUAGE,
            context_id: Uuid::new_v4().to_string(),
            output_format: OutputFormat::pcm_s16le(),
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn voice_id(&self) -> &str {
        &self.voice.id
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SayError::Synthesis(format!("failed to serialize request: {e}")))
    }
}

/// Inbound message as it appears on the wire
#[derive(Debug, Default, Deserialize)]
struct RawServerMessage {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<Value>,
}

/// A parsed message from the synthesis backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Decoded audio; `done` marks the final chunk
    Chunk { audio: Vec<u8>, done: bool },
    /// End of synthesis with no audio attached
    Done,
    /// Backend reported a failure
    Error(String),
    /// Anything else (timestamps, flush acks); not acted on
    Other(String),
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawServerMessage = serde_json::from_str(text)
            .map_err(|e| SayError::Transport(format!("malformed server message: {e}")))?;

        let kind = raw.kind.unwrap_or_default();

        if kind == "error" || raw.error.is_some() {
            let message = match raw.error {
                Some(Value::String(s)) if !s.is_empty() => s,
                Some(Value::String(_) | Value::Null) | None => FALLBACK_ERROR.to_string(),
                Some(other) => other.to_string(),
            };
            return Ok(Self::Error(message));
        }

        if kind == "chunk" {
            if let Some(data) = raw.data.filter(|d| !d.is_empty()) {
                let audio = base64::engine::general_purpose::STANDARD
                    .decode(data.as_bytes())
                    .map_err(|e| SayError::Transport(format!("invalid audio payload: {e}")))?;
                return Ok(Self::Chunk {
                    audio,
                    done: raw.done,
                });
            }
        }

        if raw.done {
            return Ok(Self::Done);
        }

        Ok(Self::Other(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = SynthesisRequest::new(
            "sonic-turbo-2025-03-07",
            "Hello there",
            "694f9389-aac1-45b6-b726-9d9369183238",
        )
        .unwrap();

        let json: Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(json["model_id"], "sonic-turbo-2025-03-07");
        assert_eq!(json["transcript"], "Hello there");
        assert_eq!(json["voice"]["mode"], "id");
        assert_eq!(json["voice"]["id"], "694f9389-aac1-45b6-b726-9d9369183238");
        assert_eq!(json["language"], "en");
        assert_eq!(json["context_id"], request.context_id());
        assert_eq!(json["output_format"]["container"], "raw");
        assert_eq!(json["output_format"]["encoding"], "pcm_s16le");
        assert_eq!(json["output_format"]["sample_rate"], 44_100);
    }

    #[test]
    fn test_context_ids_are_unique() {
        let a = SynthesisRequest::new("m", "text", "v").unwrap();
        let b = SynthesisRequest::new("m", "text", "v").unwrap();
        assert_ne!(a.context_id(), b.context_id());
    }

    #[test]
    fn test_blank_transcript_rejected() {
        assert!(matches!(
            SynthesisRequest::new("m", "  \n", "v"),
            Err(SayError::Config(_))
        ));
    }

    #[test]
    fn test_parse_chunk() {
        let message = ServerMessage::parse(r#"{"type":"chunk","data":"AQID","done":false}"#);
        assert_eq!(
            message.unwrap(),
            ServerMessage::Chunk {
                audio: vec![1, 2, 3],
                done: false
            }
        );
    }

    #[test]
    fn test_parse_final_chunk() {
        let message = ServerMessage::parse(r#"{"type":"chunk","data":"AQID","done":true}"#);
        assert_eq!(
            message.unwrap(),
            ServerMessage::Chunk {
                audio: vec![1, 2, 3],
                done: true
            }
        );
    }

    #[test]
    fn test_parse_done_without_audio() {
        let done = ServerMessage::parse(r#"{"type":"done","done":true,"status_code":206}"#);
        assert_eq!(done.unwrap(), ServerMessage::Done);

        let empty_chunk = ServerMessage::parse(r#"{"type":"chunk","data":"","done":true}"#);
        assert_eq!(empty_chunk.unwrap(), ServerMessage::Done);
    }

    #[test]
    fn test_parse_errors() {
        let explicit = ServerMessage::parse(r#"{"type":"error","error":"bad voice","done":true}"#);
        assert_eq!(explicit.unwrap(), ServerMessage::Error("bad voice".to_string()));

        let field_only = ServerMessage::parse(r#"{"type":"chunk","data":"AQID","error":"quota"}"#);
        assert_eq!(field_only.unwrap(), ServerMessage::Error("quota".to_string()));

        let no_text = ServerMessage::parse(r#"{"type":"error"}"#);
        assert_eq!(
            no_text.unwrap(),
            ServerMessage::Error(FALLBACK_ERROR.to_string())
        );
    }

    #[test]
    fn test_parse_other() {
        let message = ServerMessage::parse(r#"{"type":"timestamps","done":false}"#);
        assert_eq!(message.unwrap(), ServerMessage::Other("timestamps".to_string()));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            ServerMessage::parse("not json"),
            Err(SayError::Transport(_))
        ));
        assert!(matches!(
            ServerMessage::parse(r#"{"type":"chunk","data":"!!!"}"#),
            Err(SayError::Transport(_))
        ));
    }
}
