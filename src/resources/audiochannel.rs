//! Playback channels and the per-category groups that own them.
//!
//! A [`ChannelGroup`] is a fixed array of [`Channel`]s. Routing a play
//! request to a channel follows [`ChannelGroup::select`]:
//!
//! 1. a concurrent sound takes the first channel that is not playing;
//! 2. a non-concurrent sound reuses the channel already holding it, in any
//!    state, so at most one instance plays per group;
//! 3. otherwise the first channel that is not playing;
//! 4. otherwise the channel with the numerically highest priority value is
//!    evicted if the request's value is strictly lower (first one in group
//!    order on ties);
//! 5. otherwise the request is rejected.

use arrayvec::ArrayVec;
use glam::Vec2;

use crate::error::AudioError;
use crate::resources::soundbank::{DEFAULT_PRIORITY, SoundCategory, SoundDefinition};

/// Largest channel group allowed.
pub const MAX_CHANNELS: usize = 16;

/// Identifies one channel of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    pub category: SoundCategory,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// One playback slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Name of the sound last assigned; kept after the channel stops.
    pub sound: Option<String>,
    /// Clip variant picked for the current playback.
    pub clip: Option<String>,
    pub state: PlaybackState,
    pub priority: u16,
    /// Stored volume, before mute and master volume.
    pub volume: f32,
    pub pan: f32,
    pub looped: bool,
    pub position: Vec2,
    /// 0.0 for flat playback, 1.0 for positioned playback.
    pub spatial_blend: f32,
    pub muted: bool,
    /// Playing time left before a one-shot clip ends, if its length is known.
    pub remaining: Option<f32>,
    /// Router-assigned id of the current playback, echoed back by backends.
    pub playback: u64,
}

impl Default for Channel {
    fn default() -> Self {
        Channel {
            sound: None,
            clip: None,
            state: PlaybackState::Stopped,
            priority: DEFAULT_PRIORITY,
            volume: 1.0,
            pan: 0.0,
            looped: false,
            position: Vec2::ZERO,
            spatial_blend: 0.0,
            muted: false,
            remaining: None,
            playback: 0,
        }
    }
}

impl Channel {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn holds(&self, name: &str) -> bool {
        self.sound
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(name))
    }

    /// Count down the clip by `dt` while playing. Returns `true` when a
    /// one-shot runs out, leaving the channel stopped.
    pub fn advance_clip(&mut self, dt: f32) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let Some(remaining) = self.remaining.as_mut() else {
            return false;
        };
        *remaining -= dt;
        if *remaining > 0.0 {
            return false;
        }
        self.remaining = None;
        self.state = PlaybackState::Stopped;
        true
    }

    /// Copy the definition's properties onto the channel.
    pub fn configure(&mut self, def: &SoundDefinition, clip: &str, position: Option<Vec2>) {
        self.sound = Some(def.name.clone());
        self.clip = Some(clip.to_string());
        self.volume = def.volume;
        self.priority = def.priority;
        self.pan = def.pan;
        self.looped = def.looped;
        self.remaining = if def.looped { None } else { def.length };
        match position {
            Some(p) => {
                self.position = p;
                self.spatial_blend = 1.0;
            }
            None => self.spatial_blend = 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelGroup {
    pub category: SoundCategory,
    pub channels: ArrayVec<Channel, MAX_CHANNELS>,
    pub muted: bool,
}

impl ChannelGroup {
    pub fn new(category: SoundCategory, size: usize) -> Result<Self, AudioError> {
        if size == 0 || size > MAX_CHANNELS {
            return Err(AudioError::ChannelCount {
                category,
                requested: size,
                max: MAX_CHANNELS,
            });
        }
        Ok(ChannelGroup {
            category,
            channels: (0..size).map(|_| Channel::default()).collect(),
            muted: false,
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn handle(&self, index: usize) -> ChannelHandle {
        ChannelHandle {
            category: self.category,
            index,
        }
    }

    /// Pick the channel a request for `def` should play on, if any.
    pub fn select(&self, def: &SoundDefinition) -> Option<usize> {
        let first_free = self.channels.iter().position(|c| !c.is_playing());
        if def.allow_concurrent {
            if first_free.is_some() {
                return first_free;
            }
        } else {
            if let Some(i) = self.channels.iter().position(|c| c.holds(&def.name)) {
                return Some(i);
            }
            if first_free.is_some() {
                return first_free;
            }
        }
        // Every channel is playing: evict the least important one.
        let mut victim: Option<(usize, u16)> = None;
        for (i, c) in self.channels.iter().enumerate() {
            if victim.is_none_or(|(_, p)| c.priority > p) {
                victim = Some((i, c.priority));
            }
        }
        victim
            .filter(|&(_, p)| def.priority < p)
            .map(|(i, _)| i)
    }

    /// Indices of the channels holding `name`, in group order.
    pub fn find(&self, name: &str) -> Vec<usize> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, c)| c.holds(name))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, priority: u16) -> SoundDefinition {
        SoundDefinition::new(name, SoundCategory::Sfx, vec![format!("{name}.wav")])
            .with_priority(priority)
    }

    fn occupy(group: &mut ChannelGroup, index: usize, d: &SoundDefinition) {
        let c = &mut group.channels[index];
        c.configure(d, &d.clips[0], None);
        c.state = PlaybackState::Playing;
    }

    #[test]
    fn group_size_is_bounded() {
        assert!(ChannelGroup::new(SoundCategory::Sfx, 0).is_err());
        assert!(ChannelGroup::new(SoundCategory::Sfx, MAX_CHANNELS + 1).is_err());
        assert_eq!(ChannelGroup::new(SoundCategory::Music, 3).unwrap().len(), 3);
    }

    #[test]
    fn concurrent_sound_takes_first_free() {
        let mut g = ChannelGroup::new(SoundCategory::Sfx, 3).unwrap();
        let step = def("step", 100).concurrent();
        occupy(&mut g, 0, &step);
        assert_eq!(g.select(&step), Some(1));
    }

    #[test]
    fn non_concurrent_reuses_holder_even_when_stopped() {
        let mut g = ChannelGroup::new(SoundCategory::Sfx, 3).unwrap();
        let hit = def("hit", 100);
        occupy(&mut g, 2, &hit);
        g.channels[2].state = PlaybackState::Stopped;
        assert_eq!(g.select(&hit), Some(2));
    }

    #[test]
    fn paused_channel_counts_as_free() {
        let mut g = ChannelGroup::new(SoundCategory::Sfx, 2).unwrap();
        occupy(&mut g, 0, &def("a", 10));
        occupy(&mut g, 1, &def("b", 10));
        g.channels[1].state = PlaybackState::Paused;
        assert_eq!(g.select(&def("c", 200)), Some(1));
    }

    #[test]
    fn eviction_picks_least_important_and_requires_strictly_better() {
        let mut g = ChannelGroup::new(SoundCategory::Sfx, 3).unwrap();
        occupy(&mut g, 0, &def("a", 10));
        occupy(&mut g, 1, &def("b", 50));
        occupy(&mut g, 2, &def("c", 80));
        assert_eq!(g.select(&def("d", 60)), Some(2));
        assert_eq!(g.select(&def("e", 90)), None);
        assert_eq!(g.select(&def("f", 80)), None);
    }

    #[test]
    fn eviction_ties_go_to_first_channel() {
        let mut g = ChannelGroup::new(SoundCategory::Sfx, 3).unwrap();
        occupy(&mut g, 0, &def("a", 10));
        occupy(&mut g, 1, &def("b", 90));
        occupy(&mut g, 2, &def("c", 90));
        assert_eq!(g.select(&def("d", 20)), Some(1));
    }

    #[test]
    fn one_shot_clip_runs_out_while_playing() {
        let mut g = ChannelGroup::new(SoundCategory::Sfx, 1).unwrap();
        let step = def("step", 200).concurrent().with_length(0.5);
        occupy(&mut g, 0, &step);
        let c = &mut g.channels[0];
        assert!(!c.advance_clip(0.25));
        c.state = PlaybackState::Paused;
        assert!(!c.advance_clip(10.0));
        c.state = PlaybackState::Playing;
        assert!(c.advance_clip(0.25));
        assert_eq!(c.state, PlaybackState::Stopped);
        assert_eq!(g.select(&step), Some(0));
    }

    #[test]
    fn looped_clip_never_runs_out() {
        let mut g = ChannelGroup::new(SoundCategory::Music, 1).unwrap();
        occupy(&mut g, 0, &def("theme", 0).looped().with_length(1.0));
        assert!(!g.channels[0].advance_clip(60.0));
        assert!(g.channels[0].is_playing());
    }
}
