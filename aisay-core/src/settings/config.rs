use serde::{Deserialize, Serialize};

use crate::error::{Result, SayError};

/// Environment variable consulted for the API key when settings don't carry one
pub const API_KEY_ENV: &str = "CARTESIA_API_KEY";

pub const DEFAULT_MODEL: &str = "sonic-turbo-2025-03-07";
pub const DEFAULT_VOICE: &str = "694f9389-aac1-45b6-b726-9d9369183238";
pub const DEFAULT_API_BASE: &str = "https://api.cartesia.ai";
pub const DEFAULT_WS_BASE: &str = "wss://api.cartesia.ai";
pub const DEFAULT_API_VERSION: &str = "2025-04-16";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_ws_base() -> String {
    DEFAULT_WS_BASE.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Cartesia API key. `CARTESIA_API_KEY` takes precedence when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Synthesis model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Voice ID or voice name
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Base URL for the REST API (voice catalog)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Base URL for the streaming websocket endpoint
    #[serde(default = "default_ws_base")]
    pub ws_base: String,

    /// Value of the `Cartesia-Version` protocol header
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            voice: default_voice(),
            api_base: default_api_base(),
            ws_base: default_ws_base(),
            api_version: default_api_version(),
        }
    }
}

impl Settings {
    /// Apply `CARTESIA_API_KEY` from the process environment
    pub fn with_env(self) -> Self {
        self.with_api_key_override(std::env::var(API_KEY_ENV).ok())
    }

    /// Replace the API key when `key` is present and non-blank
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        self
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        if let Some(voice) = voice {
            self.voice = voice;
        }
        self
    }

    /// The effective API key, or a `Config` error when none is configured
    pub fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(SayError::Config(format!(
                "{API_KEY_ENV} environment variable is required"
            ))),
        }
    }
}
