//! Session wiring.
//!
//! [`setup`] fills a [`World`] with everything a run needs: the clock, the
//! [`EventBus`] with its lifecycle handlers, the [`AudioRouter`] and the
//! obstacle spawner. [`build_schedule`] returns the per-frame schedule.
//!
//! Handlers react to signals as follows:
//!
//! | Signal | Effect |
//! |---|---|
//! | `GameStart` | fade the theme music in |
//! | `FirstDialoguePass` | start every [`Dormant`] spawner |
//! | `Acceleration(a)` | accelerate every spawner that has a [`SpawnAccelerator`] |
//! | `GamePause(p)` | freeze or resume time, close or open the music low-pass |
//! | `VolumeChange(v)` | set the master volume |
//! | `CactusHit` | play the hit cue |
//! | `GameOver`, `GameEnding` | stop every spawner |
//! | `GameRestart` | despawn everything and restart the active spawners |

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{debug, error, info};

use crate::components::accelerator::SpawnAccelerator;
use crate::components::spawner::{Dormant, Spawner};
use crate::components::timer::Timer;
use crate::error::SetupError;
use crate::events::signal::SignalKind;
use crate::resources::audiorouter::AudioRouter;
use crate::resources::eventbus::EventBus;
use crate::resources::gameconfig::GameConfig;
use crate::resources::soundbank::{SoundBank, SoundCategory};
use crate::resources::worldtime::WorldTime;
use crate::systems::accelerator::spawn_accelerator_system;
use crate::systems::audio::audio_router_system;
use crate::systems::spawner::spawner_system;

/// Music faded in when the game starts.
pub const THEME_MUSIC: &str = "theme";
/// Effect played when the player hits an obstacle.
pub const HIT_SFX: &str = "hit";
/// Seconds of the theme fade-in.
pub const THEME_FADE: f32 = 2.0;
/// Obstacles enter from the right edge of the play field.
pub const SPAWN_ORIGIN: Vec2 = Vec2::new(12.0, 0.0);

/// Running totals of what happened during a session.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct SessionStats {
    pub accelerations: u32,
    pub hits: u32,
    pub restarts: u32,
    pub game_over: bool,
    pub ended: bool,
}

/// Populate `world` for a new session.
///
/// The obstacle spawner starts [`Dormant`]: nothing spawns until the first
/// dialogue pass.
pub fn setup(world: &mut World, config: &GameConfig, bank: SoundBank) -> Result<Entity, SetupError> {
    world.insert_resource(WorldTime::default());
    world.insert_resource(SessionStats::default());
    world.insert_resource(config.clone());

    let mut router = AudioRouter::new(bank, config.music_channels, config.sfx_channels)?;
    if let Some(seed) = config.seed {
        router = router.with_seed(seed);
    }
    if config.mute_music {
        router.mute_group(SoundCategory::Music);
    }
    if config.mute_sfx {
        router.mute_group(SoundCategory::Sfx);
    }
    router.set_master_volume(config.master_volume);
    world.insert_resource(router);

    let templates = config.spawn_templates()?;
    let spawner = match config.seed {
        Some(seed) => Spawner::with_seed(templates, config.pool_size, config.spawn_interval, seed)?,
        None => Spawner::new(templates, config.pool_size, config.spawn_interval)?,
    };
    let mut spawner = spawner
        .with_origin(SPAWN_ORIGIN, 0.0)
        .with_speed(config.speed)
        .with_spawn_on_start(config.spawn_on_start);
    spawner.stop();
    let accelerator = SpawnAccelerator {
        timer: Timer::new(config.accel_period),
        interval_step: config.interval_step,
        min_interval: config.min_interval,
        speed_step: config.speed_step,
        max_speed: config.max_speed,
    };
    let obstacles = world.spawn((spawner, accelerator, Dormant)).id();

    let bus: EventBus = EventBus::new();
    register_handlers(&bus);
    world.insert_resource(bus);

    info!(
        "Session ready: {} templates, pool of {}, {} music / {} sfx channels",
        config.templates.len(),
        config.pool_size,
        config.music_channels,
        config.sfx_channels
    );
    Ok(obstacles)
}

/// Per-frame schedule: spawners, then accelerators, then audio tasks.
pub fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(spawner_system);
    update.add_systems(spawn_accelerator_system.after(spawner_system));
    update.add_systems(audio_router_system);
    update
}

/// Subscribe the session's lifecycle handlers on `bus`.
pub fn register_handlers(bus: &EventBus) {
    bus.subscribe(SignalKind::GameStart, |_, world, _| {
        if let Some(mut router) = world.get_resource_mut::<AudioRouter>() {
            play_cue(&mut router, THEME_MUSIC, SoundCategory::Music, Some(THEME_FADE));
        }
    });

    bus.subscribe(SignalKind::FirstDialoguePass, |_, world, _| {
        let mut query = world.query_filtered::<(Entity, &mut Spawner), With<Dormant>>();
        let mut woken = Vec::new();
        for (entity, mut spawner) in query.iter_mut(world) {
            spawner.start();
            if spawner.spawn_on_start {
                let (origin, rotation) = (spawner.origin, spawner.rotation);
                if let Err(e) = spawner.spawn(origin, rotation) {
                    error!("spawner {:?}: {}", entity, e);
                }
            }
            woken.push(entity);
        }
        for entity in woken {
            world.entity_mut(entity).remove::<Dormant>();
            info!("spawner {:?} started", entity);
        }
    });

    bus.subscribe(SignalKind::Acceleration, |_, world, signal| {
        let Some(amount) = signal.scalar() else {
            return;
        };
        let mut query = world.query_filtered::<&mut Spawner, With<SpawnAccelerator>>();
        for mut spawner in query.iter_mut(world) {
            spawner.accelerate(amount);
        }
        if let Some(mut stats) = world.get_resource_mut::<SessionStats>() {
            stats.accelerations += 1;
        }
    });

    bus.subscribe(SignalKind::GamePause, |_, world, signal| {
        let paused = signal.flag().unwrap_or(false);
        if let Some(mut time) = world.get_resource_mut::<WorldTime>() {
            time.time_scale = if paused { 0.0 } else { 1.0 };
        }
        if let Some(mut router) = world.get_resource_mut::<AudioRouter>() {
            router.set_paused_filter(paused);
        }
    });

    bus.subscribe(SignalKind::VolumeChange, |_, world, signal| {
        if let (Some(volume), Some(mut router)) =
            (signal.scalar(), world.get_resource_mut::<AudioRouter>())
        {
            router.set_master_volume(volume);
        }
    });

    bus.subscribe(SignalKind::CactusHit, |_, world, _| {
        if let Some(mut stats) = world.get_resource_mut::<SessionStats>() {
            stats.hits += 1;
        }
        if let Some(mut router) = world.get_resource_mut::<AudioRouter>() {
            play_cue(&mut router, HIT_SFX, SoundCategory::Sfx, None);
        }
    });

    bus.subscribe(SignalKind::GameOver, |_, world, _| {
        stop_spawners(world);
        if let Some(mut stats) = world.get_resource_mut::<SessionStats>() {
            stats.game_over = true;
        }
    });

    bus.subscribe(SignalKind::GameEnding, |_, world, _| {
        stop_spawners(world);
        if let Some(mut stats) = world.get_resource_mut::<SessionStats>() {
            stats.ended = true;
        }
    });

    bus.subscribe(SignalKind::GameRestart, |_, world, _| {
        let mut query = world.query::<(&mut Spawner, Has<Dormant>)>();
        for (mut spawner, dormant) in query.iter_mut(world) {
            spawner.despawn_all();
            if !dormant {
                spawner.start();
            }
        }
        if let Some(mut stats) = world.get_resource_mut::<SessionStats>() {
            stats.restarts += 1;
            stats.game_over = false;
        }
    });
}

fn stop_spawners(world: &mut World) {
    let mut query = world.query::<&mut Spawner>();
    for mut spawner in query.iter_mut(world) {
        spawner.stop();
    }
}

// Play a cue if the bank defines it; a bank without cues is valid.
fn play_cue(router: &mut AudioRouter, name: &str, category: SoundCategory, fade: Option<f32>) {
    if router.bank().get(name, category).is_none() {
        debug!("no {} cue '{}' in the sound bank", category, name);
        return;
    }
    let played = match fade {
        Some(seconds) => router.play_fade(name, category, seconds, None),
        None => router.play(name, category, None),
    };
    if let Err(e) = played {
        error!("{}", e);
    }
}
