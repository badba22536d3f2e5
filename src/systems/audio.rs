//! Audio systems and the headless backend thread.
//!
//! - [`audio_router_system`] applies clip-end reports from the backend, then
//!   advances the router's clips, fades and control loops once per frame on
//!   the main thread.
//! - [`audio_thread`] runs on its own OS thread and consumes the
//!   [`AudioCmd`] stream produced by the router. This backend has no output
//!   device: it keeps track of what each channel is doing, logs it, and
//!   reports one-shots of known length as finished once their wall-clock
//!   duration has passed.
//!
//! The thread must be created via [`crate::resources::audio::setup_audio`]
//! and joined via [`crate::resources::audio::shutdown_audio`].

use std::time::{Duration, Instant};

use bevy_ecs::prelude::{Res, ResMut};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::audio::AudioBridge;
use crate::resources::audiochannel::ChannelHandle;
use crate::resources::audiorouter::AudioRouter;
use crate::resources::worldtime::WorldTime;

/// Drain backend reports, then advance the router by the scaled frame delta
/// so fades, loops and clip lengths freeze while the game is paused.
pub fn audio_router_system(
    time: Res<WorldTime>,
    bridge: Option<Res<AudioBridge>>,
    mut router: ResMut<AudioRouter>,
) {
    if let Some(bridge) = bridge {
        for msg in bridge.rx_msg.try_iter() {
            match msg {
                AudioMessage::Finished { channel, playback } => {
                    router.finished(channel, playback);
                }
            }
        }
    }
    router.update(time.delta);
}

// What the backend knows about one channel.
struct Voice {
    sound: String,
    playback: u64,
    ends: Option<Instant>,
    // Time left while paused.
    left: Option<Duration>,
}

fn finish_due(voices: &mut FxHashMap<ChannelHandle, Voice>, tx_msg: &Sender<AudioMessage>) {
    let now = Instant::now();
    let due: Vec<ChannelHandle> = voices
        .iter()
        .filter(|(_, v)| v.ends.is_some_and(|end| end <= now))
        .map(|(&channel, _)| channel)
        .collect();
    for channel in due {
        if let Some(voice) = voices.remove(&channel) {
            debug!("[audio] {}#{} finished '{}'", channel.category, channel.index, voice.sound);
            let _ = tx_msg.send(AudioMessage::Finished {
                channel,
                playback: voice.playback,
            });
        }
    }
}

/// Entry point of the audio thread.
///
/// Blocks on the command channel until [`AudioCmd::Shutdown`] arrives or
/// every sender is dropped, waking up early whenever a clip is due to end.
/// Returns the number of commands processed.
pub fn audio_thread(rx_cmd: Receiver<AudioCmd>, tx_msg: Sender<AudioMessage>) -> usize {
    info!(
        "audio thread starting (id={:?})",
        std::thread::current().id()
    );

    let mut voices: FxHashMap<ChannelHandle, Voice> = FxHashMap::default();
    let mut processed = 0;

    loop {
        let next_end = voices.values().filter_map(|v| v.ends).min();
        let received = match next_end {
            Some(deadline) => rx_cmd.recv_deadline(deadline),
            None => rx_cmd.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        let cmd = match received {
            Ok(cmd) => cmd,
            Err(RecvTimeoutError::Timeout) => {
                finish_due(&mut voices, &tx_msg);
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };
        processed += 1;
        let now = Instant::now();
        match cmd {
            AudioCmd::Play {
                channel,
                playback,
                sound,
                clip,
                volume,
                looped,
                length,
                ..
            } => {
                debug!(
                    "[audio] {}#{} play '{}' clip='{}' vol={:.2} looped={}",
                    channel.category, channel.index, sound, clip, volume, looped
                );
                let ends = length
                    .and_then(|s| Duration::try_from_secs_f32(s).ok())
                    .map(|d| now + d);
                voices.insert(
                    channel,
                    Voice {
                        sound,
                        playback,
                        ends,
                        left: None,
                    },
                );
            }
            AudioCmd::Stop { channel } => {
                if let Some(voice) = voices.remove(&channel) {
                    debug!("[audio] {}#{} stop '{}'", channel.category, channel.index, voice.sound);
                }
            }
            AudioCmd::Pause { channel } => {
                debug!("[audio] {}#{} pause", channel.category, channel.index);
                if let Some(voice) = voices.get_mut(&channel) {
                    voice.left = voice.ends.take().map(|end| end.saturating_duration_since(now));
                }
            }
            AudioCmd::Resume { channel } => {
                debug!("[audio] {}#{} resume", channel.category, channel.index);
                if let Some(voice) = voices.get_mut(&channel) {
                    voice.ends = voice.left.take().map(|left| now + left);
                }
            }
            AudioCmd::Volume { channel, volume } => {
                debug!("[audio] {}#{} volume {:.2}", channel.category, channel.index, volume);
            }
            AudioCmd::Position { channel, position } => {
                debug!("[audio] {}#{} position {}", channel.category, channel.index, position);
            }
            AudioCmd::LowPass {
                category,
                cutoff_hz,
            } => {
                debug!("[audio] {} low-pass {} Hz", category, cutoff_hz);
            }
            AudioCmd::Shutdown => break,
        }
        finish_due(&mut voices, &tx_msg);
    }

    info!(
        "audio thread exiting after {} commands ({} channels still playing)",
        processed,
        voices.len()
    );
    processed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::audiochannel::PlaybackState;
    use crate::resources::soundbank::{SoundBank, SoundCategory, SoundDefinition};
    use bevy_ecs::prelude::*;
    use crossbeam_channel::unbounded;

    fn sfx(index: usize) -> ChannelHandle {
        ChannelHandle {
            category: SoundCategory::Sfx,
            index,
        }
    }

    fn play(channel: ChannelHandle, playback: u64, length: Option<f32>) -> AudioCmd {
        AudioCmd::Play {
            channel,
            playback,
            sound: "hit".into(),
            clip: "hit.wav".into(),
            volume: 1.0,
            pan: 0.0,
            looped: false,
            length,
            position: None,
        }
    }

    #[test]
    fn thread_counts_commands_until_shutdown() {
        let (tx, rx) = unbounded();
        let (tx_msg, _rx_msg) = unbounded();
        let channel = sfx(0);
        tx.send(AudioCmd::Pause { channel }).unwrap();
        tx.send(AudioCmd::Resume { channel }).unwrap();
        tx.send(AudioCmd::Shutdown).unwrap();
        tx.send(AudioCmd::Stop { channel }).unwrap();
        assert_eq!(audio_thread(rx, tx_msg), 3);
    }

    #[test]
    fn thread_exits_when_senders_drop() {
        let (tx, rx) = unbounded();
        let (tx_msg, _rx_msg) = unbounded();
        let handle = std::thread::spawn(move || audio_thread(rx, tx_msg));
        drop(tx);
        assert_eq!(handle.join().unwrap(), 0);
    }

    #[test]
    fn thread_reports_one_shots_of_known_length() {
        let (tx, rx) = unbounded();
        let (tx_msg, rx_msg) = unbounded();
        let handle = std::thread::spawn(move || audio_thread(rx, tx_msg));
        tx.send(play(sfx(0), 7, Some(0.02))).unwrap();
        tx.send(play(sfx(1), 8, None)).unwrap();
        let msg = rx_msg.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            msg,
            AudioMessage::Finished {
                channel: sfx(0),
                playback: 7
            }
        );
        tx.send(AudioCmd::Shutdown).unwrap();
        assert_eq!(handle.join().unwrap(), 3);
        assert!(rx_msg.try_recv().is_err());
    }

    #[test]
    fn stopped_clip_is_not_reported() {
        let (tx, rx) = unbounded();
        let (tx_msg, rx_msg) = unbounded();
        tx.send(play(sfx(0), 1, Some(5.0))).unwrap();
        tx.send(AudioCmd::Stop { channel: sfx(0) }).unwrap();
        tx.send(AudioCmd::Shutdown).unwrap();
        audio_thread(rx, tx_msg);
        assert!(rx_msg.try_recv().is_err());
    }

    #[test]
    fn system_applies_finished_reports() {
        let mut bank = SoundBank::new();
        bank.insert(SoundDefinition::new("hit", SoundCategory::Sfx, vec!["hit.wav".into()]))
            .unwrap();
        let mut router = AudioRouter::new(bank, 1, 1).unwrap();
        let h = router.play("hit", SoundCategory::Sfx, None).unwrap().unwrap();
        let playback = router.channel(h).unwrap().playback;

        let (tx_cmd, _rx_cmd) = unbounded();
        let (tx_msg, rx_msg) = unbounded();
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(router);
        world.insert_resource(AudioBridge {
            tx_cmd,
            rx_msg,
            handle: std::thread::spawn(|| 0),
        });
        tx_msg
            .send(AudioMessage::Finished {
                channel: h,
                playback: playback + 1,
            })
            .unwrap();
        tx_msg.send(AudioMessage::Finished { channel: h, playback }).unwrap();

        let mut schedule = Schedule::default();
        schedule.add_systems(audio_router_system);
        schedule.run(&mut world);

        let router = world.resource::<AudioRouter>();
        assert_eq!(router.channel(h).unwrap().state, PlaybackState::Stopped);
    }
}
