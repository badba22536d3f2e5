//! Periodic spawning.
//!
//! [`spawner_system`] ticks every [`Spawner`] with the scaled frame delta.
//! Pool errors (an empty candidate set) are configuration faults: they are
//! logged and the remaining spawners still run.

use bevy_ecs::prelude::*;
use log::{debug, error};

use crate::components::spawner::Spawner;
use crate::resources::worldtime::WorldTime;

pub fn spawner_system(world_time: Res<WorldTime>, mut query: Query<(Entity, &mut Spawner)>) {
    let dt = world_time.delta;
    for (entity, mut spawner) in query.iter_mut() {
        match spawner.tick(dt) {
            Ok(Some(id)) => debug!("spawner {:?} activated entry {}", entity, id.0),
            Ok(None) => {}
            Err(e) => error!("spawner {:?}: {}", entity, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::pooled::SpawnTemplate;

    fn world_with_spawner(spawning: bool) -> (World, Entity) {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            delta: 0.5,
            ..Default::default()
        });
        let mut spawner =
            Spawner::with_seed(vec![SpawnTemplate::single("cactus")], 1, 1.0, 3).unwrap();
        if !spawning {
            spawner.stop();
        }
        let e = world.spawn(spawner).id();
        (world, e)
    }

    #[test]
    fn ticks_with_world_delta() {
        let (mut world, e) = world_with_spawner(true);
        let mut schedule = Schedule::default();
        schedule.add_systems(spawner_system);
        schedule.run(&mut world);
        assert_eq!(world.get::<Spawner>(e).unwrap().active_count(), 0);
        schedule.run(&mut world);
        assert_eq!(world.get::<Spawner>(e).unwrap().active_count(), 1);
    }

    #[test]
    fn stopped_spawner_is_skipped() {
        let (mut world, e) = world_with_spawner(false);
        let mut schedule = Schedule::default();
        schedule.add_systems(spawner_system);
        for _ in 0..6 {
            schedule.run(&mut world);
        }
        assert_eq!(world.get::<Spawner>(e).unwrap().active_count(), 0);
    }

    #[test]
    fn empty_candidate_set_is_logged_not_fatal() {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            delta: 1.0,
            ..Default::default()
        });
        world.spawn(Spawner::new(Vec::new(), 0, 1.0).unwrap());
        let ok = world
            .spawn(Spawner::with_seed(vec![SpawnTemplate::single("cloud")], 0, 1.0, 1).unwrap())
            .id();
        let mut schedule = Schedule::default();
        schedule.add_systems(spawner_system);
        schedule.run(&mut world);
        assert_eq!(world.get::<Spawner>(ok).unwrap().active_count(), 1);
    }
}
