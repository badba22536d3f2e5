//! Pooled spawner component.
//!
//! A [`Spawner`] owns a growable pool of [`PoolEntry`] values drawn from a
//! fixed candidate set of [`SpawnTemplate`]s. Entries are never destroyed:
//! spawning reactivates the first inactive entry in creation order, and only
//! when every entry is active does the pool grow by one entry drawn from a
//! [`DrawBag`].
//!
//! # Periodic spawning
//!
//! While started, [`Spawner::tick`] accumulates time; once the spawn interval
//! is reached the timer resets to zero and one entry is spawned at the
//! spawner's origin. A stopped spawner's timer does not advance.
//!
//! # Speed
//!
//! Entries scroll at the spawner's current `speed`. [`Spawner::accelerate`]
//! raises it and brings every entry along; entries spawned later are lifted
//! to the current speed if they fell behind.
//!
//! # Related
//!
//! - [`crate::systems::spawner::spawner_system`] – ticks every spawner
//! - [`crate::components::accelerator::SpawnAccelerator`] – shrinks the
//!   interval and publishes accelerations over time

use bevy_ecs::prelude::Component;
use fastrand::Rng;
use glam::Vec2;
use log::{debug, warn};

use crate::components::drawbag::DrawBag;
use crate::components::pooled::{EntryId, PoolEntry, SpawnTemplate, Spawnable, TemplateId};
use crate::components::timer::Timer;
use crate::error::PoolError;

/// Smallest allowed time between two periodic spawns, in seconds.
pub const MIN_SPAWN_INTERVAL: f32 = 0.1;

/// Marker for spawners that wait for the first dialogue pass before starting.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dormant;

#[derive(Component, Debug, Clone)]
pub struct Spawner {
    candidates: Vec<SpawnTemplate>,
    bag: DrawBag,
    pool: Vec<PoolEntry>,
    timer: Timer,
    spawning: bool,
    /// Spawn one entry as soon as the session starts.
    pub spawn_on_start: bool,
    /// Where periodic spawns are placed.
    pub origin: Vec2,
    /// Rotation (degrees) given to periodic spawns.
    pub rotation: f32,
    speed: f32,
    rng: Rng,
}

fn clamp_interval(seconds: f32) -> f32 {
    if seconds.is_nan() || seconds < MIN_SPAWN_INTERVAL {
        warn!(
            "spawn interval {} below minimum, clamping to {}",
            seconds, MIN_SPAWN_INTERVAL
        );
        MIN_SPAWN_INTERVAL
    } else {
        seconds
    }
}

impl Spawner {
    /// Build a spawner and pre-create `initial_size` inactive entries.
    ///
    /// The initial entries are drawn from the bag, so with `initial_size`
    /// smaller than the candidate set the next growths draw the templates
    /// that were not seeded yet. Spawning starts enabled.
    pub fn new(
        candidates: Vec<SpawnTemplate>,
        initial_size: usize,
        interval: f32,
    ) -> Result<Self, PoolError> {
        Self::with_rng(candidates, initial_size, interval, Rng::new())
    }

    /// Same as [`Spawner::new`] with a seeded random source.
    pub fn with_seed(
        candidates: Vec<SpawnTemplate>,
        initial_size: usize,
        interval: f32,
        seed: u64,
    ) -> Result<Self, PoolError> {
        Self::with_rng(candidates, initial_size, interval, Rng::with_seed(seed))
    }

    fn with_rng(
        candidates: Vec<SpawnTemplate>,
        initial_size: usize,
        interval: f32,
        rng: Rng,
    ) -> Result<Self, PoolError> {
        if candidates.is_empty() && initial_size > 0 {
            return Err(PoolError::NoCandidates);
        }
        let mut spawner = Spawner {
            bag: DrawBag::new(candidates.len()),
            candidates,
            pool: Vec::with_capacity(initial_size),
            timer: Timer::new(clamp_interval(interval)),
            spawning: true,
            spawn_on_start: false,
            origin: Vec2::ZERO,
            rotation: 0.0,
            speed: 0.0,
            rng,
        };
        for _ in 0..initial_size {
            spawner.grow()?;
        }
        Ok(spawner)
    }

    pub fn with_origin(mut self, origin: Vec2, rotation: f32) -> Self {
        self.origin = origin;
        self.rotation = rotation;
        self
    }

    /// Set the starting scroll speed of the spawner and its existing entries.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        for e in self.pool.iter_mut() {
            e.speed = speed;
        }
        self
    }

    pub fn with_spawn_on_start(mut self, spawn_on_start: bool) -> Self {
        self.spawn_on_start = spawn_on_start;
        self
    }

    // Append one inactive entry drawn from the bag.
    fn grow(&mut self) -> Result<EntryId, PoolError> {
        let index = self.bag.draw(&mut self.rng).ok_or(PoolError::NoCandidates)?;
        let template = &self.candidates[index];
        debug!("pool grows with '{}' (size {})", template.name, self.pool.len() + 1);
        self.pool
            .push(PoolEntry::new(TemplateId(index), template, self.speed));
        Ok(EntryId(self.pool.len() - 1))
    }

    /// Activate an entry at `position`, growing the pool if all are active.
    pub fn spawn(&mut self, position: Vec2, rotation: f32) -> Result<EntryId, PoolError> {
        if self.candidates.is_empty() {
            return Err(PoolError::NoCandidates);
        }
        let id = match self.pool.iter().position(|e| !e.is_active()) {
            Some(i) => EntryId(i),
            None => self.grow()?,
        };
        let speed = self.speed;
        let entry = &mut self.pool[id.0];
        entry.spawn(position, rotation);
        if entry.speed < speed {
            entry.speed = speed;
        }
        Ok(id)
    }

    /// Deactivate one entry.
    pub fn despawn(&mut self, id: EntryId) -> Result<(), PoolError> {
        self.pool
            .get_mut(id.0)
            .ok_or(PoolError::UnknownEntry(id.0))?
            .despawn();
        Ok(())
    }

    /// Deactivate one member of a group entry; the entry despawns with its
    /// last member. Returns whether the entry itself was despawned.
    pub fn despawn_member(&mut self, id: EntryId, member: usize) -> Result<bool, PoolError> {
        self.pool
            .get_mut(id.0)
            .ok_or(PoolError::UnknownEntry(id.0))?
            .despawn_member(member)
            .ok_or(PoolError::UnknownMember {
                entry: id.0,
                member,
            })
    }

    /// Deactivate every entry. The pool keeps its size.
    pub fn despawn_all(&mut self) {
        for e in self.pool.iter_mut() {
            e.despawn();
        }
    }

    pub fn start(&mut self) {
        self.spawning = true;
    }

    pub fn stop(&mut self) {
        self.spawning = false;
    }

    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    /// Seconds between periodic spawns.
    pub fn spawn_interval(&self) -> f32 {
        self.timer.duration
    }

    pub fn set_spawn_interval(&mut self, seconds: f32) {
        self.timer.duration = clamp_interval(seconds);
    }

    /// Add `delta` (usually negative) to the interval, clamped to the minimum.
    pub fn adjust_spawn_interval(&mut self, delta: f32) {
        self.set_spawn_interval(self.timer.duration + delta);
    }

    /// Advance the periodic timer; spawns at the origin when it fires.
    pub fn tick(&mut self, dt: f32) -> Result<Option<EntryId>, PoolError> {
        if !self.spawning {
            return Ok(None);
        }
        if self.timer.tick(dt) {
            return self.spawn(self.origin, self.rotation).map(Some);
        }
        Ok(None)
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Raise the scroll speed by `amount` and apply it to every entry.
    pub fn accelerate(&mut self, amount: f32) {
        let target = self.speed + amount;
        for e in self.pool.iter_mut() {
            e.speed = target;
        }
        self.speed = target;
    }

    pub fn entry(&self, id: EntryId) -> Option<&PoolEntry> {
        self.pool.get(id.0)
    }

    /// Entries in creation order.
    pub fn entries(&self) -> &[PoolEntry] {
        &self.pool
    }

    pub fn candidates(&self) -> &[SpawnTemplate] {
        &self.candidates
    }

    pub fn template(&self, id: TemplateId) -> Option<&SpawnTemplate> {
        self.candidates.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.pool.iter().filter(|e| e.is_active()).count()
    }
}
