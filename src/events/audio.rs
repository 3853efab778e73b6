//! Audio messages exchanged with the audio thread.
//!
//! Sound effects buffer their playback requests during a frame and forward
//! the coalesced result as [`AudioCmd`] values when
//! [`ResourceRegistry::flush_audio_commands`](crate::resources::registry::ResourceRegistry::flush_audio_commands)
//! runs. The audio thread answers with [`AudioMessage`] values.

/// Commands sent *to* the audio thread
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCmd {
    PlayFx { id: String, volume: f32, pan: f32 },
    StopFx { id: String },
    Shutdown,
}

/// Messages sent *from* the audio thread
#[derive(Debug, Clone, PartialEq)]
pub enum AudioMessage {
    FxPlayStarted { id: String, volume: f32 },
    FxStopped { id: String },
}
