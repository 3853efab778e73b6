//! Audio thread.
//!
//! [`audio_thread`] runs on its own OS thread and consumes the
//! [`AudioCmd`](crate::events::audio::AudioCmd) values forwarded by flushed
//! sound effects. Mixing is left to whatever backend the host plugs in; this
//! loop tracks which effects are playing and reports state changes as
//! [`AudioMessage`](crate::events::audio::AudioMessage) values.
//!
//! The thread must be created once via
//! [`crate::resources::audio::setup_audio`] and joined via
//! [`crate::resources::audio::shutdown_audio`].

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::audio::AudioBridge;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info};
use rustc_hash::FxHashSet;

/// Drain pending messages from the audio thread without blocking.
pub fn poll_audio_messages(bridge: &AudioBridge) -> Vec<AudioMessage> {
    bridge.rx_msg.try_iter().collect()
}

/// Entry point of the dedicated audio thread.
///
/// Blocks on the command channel until it receives [`AudioCmd::Shutdown`] or
/// every sender is dropped.
pub fn audio_thread(rx_cmd: Receiver<AudioCmd>, tx_evt: Sender<AudioMessage>) {
    info!(
        "Audio thread starting (id={:?})",
        std::thread::current().id()
    );

    let mut fx_playing: FxHashSet<String> = FxHashSet::default();

    while let Ok(cmd) = rx_cmd.recv() {
        match cmd {
            AudioCmd::PlayFx { id, volume, pan } => {
                debug!("[audio] play fx id='{}' volume={} pan={}", id, volume, pan);
                fx_playing.insert(id.clone());
                let _ = tx_evt.send(AudioMessage::FxPlayStarted { id, volume });
            }
            AudioCmd::StopFx { id } => {
                if fx_playing.remove(&id) {
                    debug!("[audio] stop fx id='{}'", id);
                    let _ = tx_evt.send(AudioMessage::FxStopped { id });
                }
            }
            AudioCmd::Shutdown => break,
        }
    }

    info!(
        "Audio thread exiting ({} effects still playing)",
        fx_playing.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::audio::{setup_audio, shutdown_audio};
    use crate::resources::resource::SoundEffectResource;

    #[test]
    fn test_flushed_sound_reaches_audio_thread() {
        let bridge = setup_audio();
        let snd = SoundEffectResource::new("hit", "se/hit.wav", Some(bridge.tx_cmd.clone()));
        snd.play(0.3, 0.0);
        snd.play(0.8, 0.0);
        assert_eq!(snd.flush_command(), 1);

        let msg = bridge
            .rx_msg
            .recv_timeout(std::time::Duration::from_secs(2))
            .unwrap();
        assert_eq!(
            msg,
            AudioMessage::FxPlayStarted {
                id: "hit".into(),
                volume: 0.8
            }
        );
        shutdown_audio(bridge);
    }

    #[test]
    fn test_stop_of_idle_fx_is_silent() {
        let bridge = setup_audio();
        bridge
            .tx_cmd
            .send(AudioCmd::StopFx { id: "idle".into() })
            .unwrap();
        bridge
            .tx_cmd
            .send(AudioCmd::PlayFx {
                id: "a".into(),
                volume: 1.0,
                pan: 0.0,
            })
            .unwrap();
        let msg = bridge
            .rx_msg
            .recv_timeout(std::time::Duration::from_secs(2))
            .unwrap();
        assert!(matches!(msg, AudioMessage::FxPlayStarted { .. }));
        assert!(poll_audio_messages(&bridge).is_empty());
        shutdown_audio(bridge);
    }
}
