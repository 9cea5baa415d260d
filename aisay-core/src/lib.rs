pub mod error;
pub mod settings;
pub mod voice;

// Public library API
pub use error::{Result, SayError};
pub use settings::{Settings, SettingsManager};
pub use voice::pipeline::{list_voices, speak};
pub use voice::tts::session::{SessionReport, SessionState, SynthesisSession};
