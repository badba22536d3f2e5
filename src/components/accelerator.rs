//! Difficulty ramp for a [`Spawner`].
//!
//! Every `period` seconds a [`SpawnAccelerator`] shortens its spawner's
//! interval by `interval_step` (down to `min_interval`) and, while the
//! spawner's scroll speed is still below `max_speed`, asks for an
//! acceleration of `speed_step`. The acceleration itself is broadcast as a
//! [`Signal::acceleration`](crate::events::signal::Signal::acceleration) so
//! every scrolling collaborator speeds up together; see
//! [`crate::systems::accelerator::spawn_accelerator_system`].

use bevy_ecs::prelude::Component;

use crate::components::spawner::Spawner;
use crate::components::timer::Timer;

#[derive(Component, Debug, Clone)]
pub struct SpawnAccelerator {
    pub timer: Timer,
    /// Seconds removed from the spawn interval on each step.
    pub interval_step: f32,
    /// The interval is not shortened once at or below this value.
    pub min_interval: f32,
    /// Speed added by each published acceleration.
    pub speed_step: f32,
    /// No more accelerations once the spawner reaches this speed.
    pub max_speed: f32,
}

impl Default for SpawnAccelerator {
    fn default() -> Self {
        SpawnAccelerator {
            timer: Timer::new(3.0),
            interval_step: 0.2,
            min_interval: 0.5,
            speed_step: 0.2,
            max_speed: 10.0,
        }
    }
}

impl SpawnAccelerator {
    pub fn new(period: f32) -> Self {
        SpawnAccelerator {
            timer: Timer::new(period),
            ..Default::default()
        }
    }

    /// Advance by `dt`. When the period elapses, shortens the spawner's
    /// interval and returns the acceleration to publish, if any.
    pub fn tick(&mut self, dt: f32, spawner: &mut Spawner) -> Option<f32> {
        if !self.timer.tick(dt) {
            return None;
        }
        if spawner.spawn_interval() > self.min_interval {
            spawner.adjust_spawn_interval(-self.interval_step);
        }
        (spawner.speed() < self.max_speed).then_some(self.speed_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::pooled::SpawnTemplate;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn spawner(interval: f32, speed: f32) -> Spawner {
        Spawner::with_seed(vec![SpawnTemplate::single("cactus")], 1, interval, 1)
            .unwrap()
            .with_speed(speed)
    }

    #[test]
    fn nothing_before_period() {
        let mut acc = SpawnAccelerator::new(3.0);
        let mut s = spawner(1.0, 3.0);
        assert_eq!(acc.tick(2.0, &mut s), None);
        assert!(approx_eq(s.spawn_interval(), 1.0));
    }

    #[test]
    fn step_shortens_interval_and_requests_acceleration() {
        let mut acc = SpawnAccelerator::new(3.0);
        let mut s = spawner(1.0, 3.0);
        assert_eq!(acc.tick(3.0, &mut s), Some(0.2));
        assert!(approx_eq(s.spawn_interval(), 0.8));
    }

    #[test]
    fn interval_stops_at_min() {
        let mut acc = SpawnAccelerator::new(1.0);
        let mut s = spawner(0.5, 3.0);
        acc.tick(1.0, &mut s);
        assert!(approx_eq(s.spawn_interval(), 0.5));
    }

    #[test]
    fn no_acceleration_at_max_speed() {
        let mut acc = SpawnAccelerator::new(1.0);
        let mut s = spawner(1.0, 10.0);
        assert_eq!(acc.tick(1.0, &mut s), None);
        assert!(approx_eq(s.spawn_interval(), 0.8));
    }
}
