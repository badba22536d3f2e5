//! Difficulty ramp.
//!
//! [`spawn_accelerator_system`] is an exclusive system: it ticks every
//! [`SpawnAccelerator`] against the [`Spawner`] on the same entity, then
//! publishes one [`Signal::acceleration`] per accelerator that asked for it.
//! [`Dormant`] spawners are skipped.
//! The `Acceleration` subscribers installed by [`crate::game::setup`] do the
//! actual speed change, so the accelerator never touches speeds itself.

use bevy_ecs::prelude::*;
use smallvec::SmallVec;

use crate::components::accelerator::SpawnAccelerator;
use crate::components::spawner::{Dormant, Spawner};
use crate::events::signal::Signal;
use crate::resources::eventbus::publish_signal;
use crate::resources::worldtime::WorldTime;

pub fn spawn_accelerator_system(world: &mut World) {
    let Some(dt) = world.get_resource::<WorldTime>().map(|t| t.delta) else {
        return;
    };
    let mut query =
        world.query_filtered::<(&mut SpawnAccelerator, &mut Spawner), Without<Dormant>>();
    let requested: SmallVec<[f32; 4]> = query
        .iter_mut(world)
        .filter_map(|(mut accelerator, mut spawner)| accelerator.tick(dt, &mut spawner))
        .collect();
    for amount in requested {
        publish_signal(world, &Signal::acceleration(amount));
    }
}
