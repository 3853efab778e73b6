//! Bridge between the main thread and the background audio thread.
//!
//! Use [`setup_audio`] once during initialization to spawn the audio thread,
//! then hand [`AudioBridge::tx_cmd`] clones to the sound effects that should
//! be audible. Call [`shutdown_audio`] during teardown to stop the thread.

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::systems::audio::audio_thread;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// Channels and join handle for the audio thread.
pub struct AudioBridge {
    /// Sender for [`AudioCmd`] messages (main -> audio thread).
    pub tx_cmd: Sender<AudioCmd>,
    /// Receiver for [`AudioMessage`] messages (audio thread -> main).
    pub rx_msg: Receiver<AudioMessage>,
    /// Join handle for the background audio thread.
    pub handle: std::thread::JoinHandle<()>,
}

/// Spawn the audio thread and return its bridge.
pub fn setup_audio() -> AudioBridge {
    let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
    let (tx_msg, rx_msg) = unbounded::<AudioMessage>();

    let handle = std::thread::spawn(move || audio_thread(rx_cmd, tx_msg));

    AudioBridge {
        tx_cmd,
        rx_msg,
        handle,
    }
}

/// Send [`AudioCmd::Shutdown`] and wait for the thread to exit.
pub fn shutdown_audio(bridge: AudioBridge) {
    let _ = bridge.tx_cmd.send(AudioCmd::Shutdown);
    let _ = bridge.handle.join();
}
