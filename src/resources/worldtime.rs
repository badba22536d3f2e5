//! Simulation clock shared by every per-frame system.
//!
//! `delta` is already scaled by `time_scale`; a `time_scale` of zero freezes
//! spawner timers and audio fades (the pause behaviour).

use bevy_ecs::prelude::Resource;

#[derive(Resource, Debug, Clone, Copy)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn is_paused(&self) -> bool {
        self.time_scale == 0.0
    }
}
