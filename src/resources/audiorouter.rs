//! Priority-based routing of sounds onto a fixed set of channels.
//!
//! The [`AudioRouter`] resource owns one [`ChannelGroup`] per
//! [`SoundCategory`] and decides which channel a sound plays on (see
//! [`ChannelGroup::select`]). It never produces audio itself: every state
//! change is mirrored as an [`AudioCmd`] on the optional backend sender
//! installed by [`crate::resources::audio::setup_audio`].
//!
//! Fades and control loops are per-channel tasks advanced by
//! [`AudioRouter::update`], which [`crate::systems::audio::audio_router_system`]
//! calls once per frame.
//!
//! # Clip end
//!
//! A one-shot leaves `Playing` on its own in two ways: its definition has a
//! `length` and that much playing time elapses in [`AudioRouter::update`], or
//! the backend reports it through [`AudioRouter::finished`]. Either way the
//! channel becomes free for the next request. Every play gets a fresh
//! playback id so a late report for a replaced clip is ignored.
//!
//! # Volume
//!
//! The stored channel volume is never touched by muting. What reaches the
//! backend is the effective volume: `0.0` when the channel or its group is
//! muted, otherwise `volume * master_volume`.

use bevy_ecs::prelude::Resource;
use crossbeam_channel::Sender;
use fastrand::Rng;
use glam::Vec2;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::components::timer::Timer;
use crate::error::AudioError;
use crate::events::audio::AudioCmd;
use crate::resources::audiochannel::{Channel, ChannelGroup, ChannelHandle, PlaybackState};
use crate::resources::audiotask::{ChannelTask, Fade, FadeDirection};
use crate::resources::soundbank::{SoundBank, SoundCategory, SoundDefinition};

/// Music low-pass cutoff while the game is paused.
pub const PAUSED_CUTOFF_HZ: f32 = 3000.0;
/// Music low-pass cutoff during normal play (filter effectively open).
pub const OPEN_CUTOFF_HZ: f32 = 22000.0;
/// Shortest re-trigger period of a control loop, in seconds.
pub const MIN_LOOP_INTERVAL: f32 = 0.05;

fn clamp_unit(what: &str, v: f32) -> f32 {
    if v.is_nan() {
        warn!("{} is NaN, using 0", what);
        0.0
    } else if !(0.0..=1.0).contains(&v) {
        warn!("{} {} out of range, clamping", what, v);
        v.clamp(0.0, 1.0)
    } else {
        v
    }
}

#[derive(Resource)]
pub struct AudioRouter {
    bank: SoundBank,
    music: ChannelGroup,
    sfx: ChannelGroup,
    tasks: FxHashMap<ChannelHandle, ChannelTask>,
    master_volume: f32,
    music_cutoff_hz: f32,
    rng: Rng,
    next_playback: u64,
    tx_cmd: Option<Sender<AudioCmd>>,
}

impl AudioRouter {
    pub fn new(bank: SoundBank, music_channels: usize, sfx_channels: usize) -> Result<Self, AudioError> {
        Ok(AudioRouter {
            bank,
            music: ChannelGroup::new(SoundCategory::Music, music_channels)?,
            sfx: ChannelGroup::new(SoundCategory::Sfx, sfx_channels)?,
            tasks: FxHashMap::default(),
            master_volume: 1.0,
            music_cutoff_hz: OPEN_CUTOFF_HZ,
            rng: Rng::new(),
            next_playback: 0,
            tx_cmd: None,
        })
    }

    /// Use a seeded random source for clip variant picks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng::with_seed(seed);
        self
    }

    /// Mirror every state change to a backend.
    pub fn connect(&mut self, tx_cmd: Sender<AudioCmd>) {
        self.tx_cmd = Some(tx_cmd);
    }

    pub fn disconnect(&mut self) {
        self.tx_cmd = None;
    }

    pub fn bank(&self) -> &SoundBank {
        &self.bank
    }

    pub fn group(&self, category: SoundCategory) -> &ChannelGroup {
        match category {
            SoundCategory::Music => &self.music,
            SoundCategory::Sfx => &self.sfx,
        }
    }

    fn group_mut(&mut self, category: SoundCategory) -> &mut ChannelGroup {
        match category {
            SoundCategory::Music => &mut self.music,
            SoundCategory::Sfx => &mut self.sfx,
        }
    }

    pub fn channel(&self, handle: ChannelHandle) -> Option<&Channel> {
        self.group(handle.category).channels.get(handle.index)
    }

    fn channel_mut(&mut self, handle: ChannelHandle) -> Option<&mut Channel> {
        self.group_mut(handle.category).channels.get_mut(handle.index)
    }

    pub fn task(&self, handle: ChannelHandle) -> Option<&ChannelTask> {
        self.tasks.get(&handle)
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn music_cutoff_hz(&self) -> f32 {
        self.music_cutoff_hz
    }

    /// Volume the backend actually plays `handle` at.
    pub fn effective_volume(&self, handle: ChannelHandle) -> f32 {
        let group = self.group(handle.category);
        match group.channels.get(handle.index) {
            Some(c) if !group.muted && !c.muted => c.volume * self.master_volume,
            _ => 0.0,
        }
    }

    fn send(&self, cmd: AudioCmd) {
        if let Some(tx) = &self.tx_cmd {
            // The backend may already be gone during shutdown.
            let _ = tx.send(cmd);
        }
    }

    fn send_volume(&self, handle: ChannelHandle) {
        self.send(AudioCmd::Volume {
            channel: handle,
            volume: self.effective_volume(handle),
        });
    }

    // Handles of the channels in `category` currently assigned `name`.
    fn holders(&self, name: &str, category: SoundCategory) -> Vec<ChannelHandle> {
        let group = self.group(category);
        group.find(name).into_iter().map(|i| group.handle(i)).collect()
    }

    // Configure `handle` from `def` with a random clip variant and start it.
    fn start_on(&mut self, handle: ChannelHandle, def: &SoundDefinition, position: Option<Vec2>) {
        let clip = def.clips[self.rng.usize(..def.clips.len())].clone();
        self.next_playback += 1;
        let playback = self.next_playback;
        let Some(channel) = self.channel_mut(handle) else {
            return;
        };
        channel.configure(def, &clip, position);
        channel.state = PlaybackState::Playing;
        channel.playback = playback;
        let pan = channel.pan;
        let looped = channel.looped;
        let length = channel.remaining;
        let spatial = (channel.spatial_blend > 0.0).then_some(channel.position);
        self.send(AudioCmd::Play {
            channel: handle,
            playback,
            sound: def.name.clone(),
            clip,
            volume: self.effective_volume(handle),
            pan,
            looped,
            length,
            position: spatial,
        });
    }

    /// Play `name` on a channel of `category`.
    ///
    /// Returns `Ok(None)` when every channel is busy with a sound at least as
    /// important. Any task running on the chosen channel is cancelled.
    pub fn play(
        &mut self,
        name: &str,
        category: SoundCategory,
        position: Option<Vec2>,
    ) -> Result<Option<ChannelHandle>, AudioError> {
        let def = self.bank.find(name, category)?.clone();
        let group = self.group(category);
        let Some(index) = group.select(&def) else {
            debug!(
                "Can't play '{}': no {} channel free and its priority {} is not high enough",
                def.name, category, def.priority
            );
            return Ok(None);
        };
        let handle = group.handle(index);
        self.tasks.remove(&handle);
        self.start_on(handle, &def, position);
        Ok(Some(handle))
    }

    /// Stop every channel holding `name`. Returns how many were stopped.
    pub fn stop(&mut self, name: &str, category: SoundCategory) -> usize {
        let mut stopped = 0;
        for handle in self.holders(name, category) {
            self.tasks.remove(&handle);
            if let Some(c) = self.channel_mut(handle)
                && c.state != PlaybackState::Stopped
            {
                c.state = PlaybackState::Stopped;
                stopped += 1;
                self.send(AudioCmd::Stop { channel: handle });
            }
        }
        if stopped == 0 {
            debug!("Can't find any {} sound named '{}' to stop", category, name);
        }
        stopped
    }

    fn transition(
        &mut self,
        name: &str,
        category: SoundCategory,
        from: PlaybackState,
        to: PlaybackState,
    ) -> usize {
        let mut changed = 0;
        for handle in self.holders(name, category) {
            if let Some(c) = self.channel_mut(handle)
                && c.state == from
            {
                c.state = to;
                changed += 1;
                self.send(match to {
                    PlaybackState::Paused => AudioCmd::Pause { channel: handle },
                    _ => AudioCmd::Resume { channel: handle },
                });
            }
        }
        changed
    }

    pub fn pause(&mut self, name: &str, category: SoundCategory) -> usize {
        self.transition(name, category, PlaybackState::Playing, PlaybackState::Paused)
    }

    pub fn resume(&mut self, name: &str, category: SoundCategory) -> usize {
        self.transition(name, category, PlaybackState::Paused, PlaybackState::Playing)
    }

    /// Set the stored volume of every channel holding `name`.
    pub fn set_volume(&mut self, name: &str, category: SoundCategory, volume: f32) -> usize {
        let volume = clamp_unit("volume", volume);
        let handles = self.holders(name, category);
        for &handle in &handles {
            if let Some(c) = self.channel_mut(handle) {
                c.volume = volume;
            }
            self.send_volume(handle);
        }
        handles.len()
    }

    fn set_muted(&mut self, name: &str, category: SoundCategory, muted: bool) -> usize {
        let handles = self.holders(name, category);
        for &handle in &handles {
            if let Some(c) = self.channel_mut(handle) {
                c.muted = muted;
            }
            self.send_volume(handle);
        }
        handles.len()
    }

    pub fn mute(&mut self, name: &str, category: SoundCategory) -> usize {
        self.set_muted(name, category, true)
    }

    pub fn unmute(&mut self, name: &str, category: SoundCategory) -> usize {
        self.set_muted(name, category, false)
    }

    fn set_group_muted(&mut self, category: SoundCategory, muted: bool) {
        self.group_mut(category).muted = muted;
        for index in 0..self.group(category).len() {
            let handle = self.group(category).handle(index);
            self.send_volume(handle);
        }
    }

    pub fn mute_group(&mut self, category: SoundCategory) {
        self.set_group_muted(category, true);
    }

    pub fn unmute_group(&mut self, category: SoundCategory) {
        self.set_group_muted(category, false);
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = clamp_unit("master volume", volume);
        for category in [SoundCategory::Music, SoundCategory::Sfx] {
            for index in 0..self.group(category).len() {
                let handle = self.group(category).handle(index);
                self.send_volume(handle);
            }
        }
    }

    /// Close the music low-pass filter while paused, open it otherwise.
    pub fn set_paused_filter(&mut self, paused: bool) {
        self.music_cutoff_hz = if paused { PAUSED_CUTOFF_HZ } else { OPEN_CUTOFF_HZ };
        self.send(AudioCmd::LowPass {
            category: SoundCategory::Music,
            cutoff_hz: self.music_cutoff_hz,
        });
    }

    /// Play `name` and re-trigger it on the same channel every `interval`
    /// seconds, each time with a fresh clip variant.
    pub fn play_looped(
        &mut self,
        name: &str,
        category: SoundCategory,
        interval: f32,
        position: Option<Vec2>,
    ) -> Result<Option<ChannelHandle>, AudioError> {
        let interval = if interval.is_nan() || interval < MIN_LOOP_INTERVAL {
            warn!(
                "loop interval {} for '{}' below minimum, clamping to {}",
                interval, name, MIN_LOOP_INTERVAL
            );
            MIN_LOOP_INTERVAL
        } else {
            interval
        };
        let handle = self.play(name, category, position)?;
        if let Some(handle) = handle {
            self.tasks.insert(
                handle,
                ChannelTask::ControlLoop {
                    sound: name.to_string(),
                    timer: Timer::new(interval),
                },
            );
        }
        Ok(handle)
    }

    /// Cancel the control loops of `name`; current playback continues.
    pub fn stop_looped(&mut self, name: &str, category: SoundCategory) -> usize {
        let mut cancelled = 0;
        for handle in self.holders(name, category) {
            if matches!(self.tasks.get(&handle), Some(ChannelTask::ControlLoop { .. })) {
                self.tasks.remove(&handle);
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Play `name` starting silent and ramp up to its volume over `seconds`.
    pub fn play_fade(
        &mut self,
        name: &str,
        category: SoundCategory,
        seconds: f32,
        position: Option<Vec2>,
    ) -> Result<Option<ChannelHandle>, AudioError> {
        let handle = self.play(name, category, position)?;
        if let Some(handle) = handle
            && let Some(c) = self.channel_mut(handle)
        {
            let target = c.volume;
            c.volume = 0.0;
            self.tasks
                .insert(handle, ChannelTask::Fade(Fade::fade_in(seconds, target)));
            self.send_volume(handle);
        }
        Ok(handle)
    }

    /// Ramp every active channel holding `name` down to silence over
    /// `seconds`, then stop it.
    pub fn stop_fade(&mut self, name: &str, category: SoundCategory, seconds: f32) -> usize {
        let mut fading = 0;
        for handle in self.holders(name, category) {
            let Some(c) = self.channel(handle) else {
                continue;
            };
            if c.state == PlaybackState::Stopped {
                continue;
            }
            let fade = Fade::fade_out(seconds, c.volume);
            self.tasks.insert(handle, ChannelTask::Fade(fade));
            fading += 1;
        }
        if fading == 0 {
            debug!("Can't find any {} sound named '{}' to fade out", category, name);
        }
        fading
    }

    /// Fade `name_in` in and `name_out` out over the same duration.
    pub fn cross_fade(
        &mut self,
        name_in: &str,
        name_out: &str,
        seconds: f32,
        category: SoundCategory,
    ) -> Result<Option<ChannelHandle>, AudioError> {
        let available = self.group(category).len();
        if available < 2 {
            return Err(AudioError::CrossFadeNeedsTwoChannels {
                category,
                available,
            });
        }
        self.bank.find(name_out, category)?;
        let handle = self.play_fade(name_in, category, seconds, None)?;
        self.stop_fade(name_out, category, seconds);
        Ok(handle)
    }

    pub fn restart(
        &mut self,
        name: &str,
        category: SoundCategory,
        position: Option<Vec2>,
    ) -> Result<Option<ChannelHandle>, AudioError> {
        self.stop(name, category);
        self.play(name, category, position)
    }

    /// Move a positioned channel. Returns `false` for unknown handles.
    pub fn set_position(&mut self, handle: ChannelHandle, position: Vec2) -> bool {
        let Some(c) = self.channel_mut(handle) else {
            return false;
        };
        c.position = position;
        c.spatial_blend = 1.0;
        self.send(AudioCmd::Position {
            channel: handle,
            position,
        });
        true
    }

    /// Backend report that playback `playback` on `handle` reached its end.
    ///
    /// Frees the channel if it is still playing that one-shot. Returns
    /// whether the channel was stopped.
    pub fn finished(&mut self, handle: ChannelHandle, playback: u64) -> bool {
        let Some(c) = self.channel_mut(handle) else {
            return false;
        };
        if c.playback != playback || c.looped || c.state != PlaybackState::Playing {
            return false;
        }
        c.state = PlaybackState::Stopped;
        c.remaining = None;
        debug!("{}#{} finished '{}'", handle.category, handle.index, c.sound.as_deref().unwrap_or("?"));
        true
    }

    /// Advance clip lengths and every channel task by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for category in [SoundCategory::Music, SoundCategory::Sfx] {
            for (index, c) in self.group_mut(category).channels.iter_mut().enumerate() {
                if c.advance_clip(dt) {
                    debug!("{}#{} clip ended", category, index);
                }
            }
        }
        let mut tasks = std::mem::take(&mut self.tasks);
        tasks.retain(|&handle, task| self.advance(handle, task, dt));
        self.tasks = tasks;
    }

    // Returns whether the task stays alive.
    fn advance(&mut self, handle: ChannelHandle, task: &mut ChannelTask, dt: f32) -> bool {
        match task {
            ChannelTask::Fade(fade) => {
                let Some(c) = self.channel_mut(handle) else {
                    return false;
                };
                let state = c.state;
                c.volume = fade.advance(dt, state == PlaybackState::Playing);
                let finished = fade.is_finished() || state == PlaybackState::Stopped;
                if finished && fade.direction == FadeDirection::Out {
                    c.volume = 0.0;
                    if state != PlaybackState::Stopped {
                        c.state = PlaybackState::Stopped;
                        self.send(AudioCmd::Stop { channel: handle });
                    }
                }
                self.send_volume(handle);
                !finished
            }
            ChannelTask::ControlLoop { sound, timer } => {
                if !timer.tick(dt) {
                    return true;
                }
                let Some(def) = self.bank.get(sound, handle.category).cloned() else {
                    return false;
                };
                let position = self
                    .channel(handle)
                    .and_then(|c| (c.spatial_blend > 0.0).then_some(c.position));
                self.start_on(handle, &def, position);
                true
            }
        }
    }
}
