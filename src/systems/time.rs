//! Frame clock system.
//!
//! Advances the [`WorldTime`] resource once per frame. Everything downstream
//! (spawner timers, accelerators, audio fades) reads the scaled `delta`.
use bevy_ecs::prelude::*;
use log::warn;

use crate::resources::worldtime::WorldTime;

/// Advance `WorldTime` by the unscaled frame delta `dt`.
///
/// Negative deltas are treated as zero. Does nothing if the world has no
/// `WorldTime`.
pub fn update_world_time(world: &mut World, dt: f32) {
    let Some(mut wt) = world.get_resource_mut::<WorldTime>() else {
        warn!("update_world_time: no WorldTime resource");
        return;
    };
    let scaled = dt.max(0.0) * wt.time_scale;
    wt.delta = scaled;
    wt.elapsed += scaled;
    wt.frame_count += 1;
}
